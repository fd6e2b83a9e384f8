/*!
 * Timeout Strategy
 *
 * Races an asynchronous delegate against a watch armed on the shared timer.
 * Both sides resolve the same `AsyncResult`; whichever gets there first
 * wins and the other is discarded:
 *
 * - delegate first: the watch is cancelled and the outcome adopted verbatim
 * - watch first: the result fails with `Timeout`, the work's interrupt is
 *   signalled, and the late delegate outcome is dropped
 */

use super::config::TimeoutConfig;
use crate::core::{InvocationContext, ResilienceError, ResilienceResult, Strategy};
use crate::monitoring::{Category, Event};
use crate::promise::AsyncResult;
use crate::timer::TimerService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Timeout in front of an asynchronous delegate
pub struct Timeout<S> {
    duration: Duration,
    description: Arc<str>,
    timer: Arc<TimerService>,
    delegate: S,
}

impl<S> Timeout<S> {
    pub fn new(config: &TimeoutConfig, timer: Arc<TimerService>, delegate: S) -> Self {
        Self {
            duration: config.duration,
            description: config.description.clone(),
            timer,
            delegate,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn exit<V>(&self, ctx: &InvocationContext<V>) {
        ctx.fire_event(Event::finished(Category::Timeout, self.description.clone()));
        trace!(policy = %self.description, "timeout exited");
    }
}

impl<T, S> Strategy<AsyncResult<T>> for Timeout<S>
where
    T: Clone + Send + Sync + 'static,
    S: Strategy<AsyncResult<T>>,
{
    fn apply(&self, ctx: &InvocationContext<AsyncResult<T>>) -> ResilienceResult<AsyncResult<T>> {
        ctx.fire_event(Event::started(Category::Timeout, self.description.clone()));
        trace!(policy = %self.description, timeout_ms = self.duration.as_millis() as u64, "timeout entered");

        if self.duration.is_zero() {
            debug!(policy = %self.description, "zero timeout, delegate not started");
            self.exit(ctx);
            return Ok(AsyncResult::failed(ResilienceError::timeout(
                self.description.clone(),
                self.duration,
            )));
        }

        let result = AsyncResult::pending();

        let watch = {
            let result = result.clone();
            let interrupt = ctx.interrupt().clone();
            let description = self.description.clone();
            let duration = self.duration;
            self.timer.schedule(duration, move || {
                if result.fail(ResilienceError::timeout(description.clone(), duration)) {
                    interrupt.interrupt();
                    debug!(policy = %description, "timed out, work interrupted");
                }
            })
        };
        let watch = match watch {
            Ok(watch) => watch,
            Err(e) => {
                debug!(policy = %self.description, error = %e, "watch not armed, delegate not started");
                self.exit(ctx);
                return Err(e);
            }
        };

        match self.delegate.apply(ctx) {
            Ok(inner) => {
                let result = result.clone();
                let description = self.description.clone();
                inner.on_complete(move |outcome| {
                    watch.cancel();
                    if !result.resolve(outcome.clone()) {
                        trace!(policy = %description, "late completion discarded");
                    }
                });
            }
            Err(e) => {
                watch.cancel();
                self.exit(ctx);
                return Err(e);
            }
        }

        self.exit(ctx);
        Ok(result)
    }
}
