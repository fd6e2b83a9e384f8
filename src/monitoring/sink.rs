/*!
 * Event Sink
 *
 * Fire-and-forget notification channel between strategies and whatever
 * observability layer subscribes. No backpressure: sinks must not block,
 * and their failures are swallowed by the firing site.
 */

use super::events::Event;
use std::sync::Arc;

/// Receiver of resilience events
pub trait EventSink: Send + Sync {
    /// Accept an event
    ///
    /// Errors are dropped by the caller; they never reach the guarded call.
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    #[inline]
    fn on_event(&self, _event: &Event) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Sink that forwards to a closure
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F>
where
    F: Fn(&Event) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        (self.f)(event);
        Ok(())
    }
}

/// Sink that writes every event to the `tracing` pipeline as JSON
///
/// Events land under the `resilience::events` target at debug level, so an
/// `EnvFilter` directive can switch them on independently of other logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        if tracing::enabled!(target: "resilience::events", tracing::Level::DEBUG) {
            let json = serde_json::to_string(event)?;
            tracing::debug!(target: "resilience::events", event = %json);
        }
        Ok(())
    }
}

/// Sink that forwards every event to several sinks
///
/// A failing sink does not prevent the others from receiving the event.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.on_event(event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
