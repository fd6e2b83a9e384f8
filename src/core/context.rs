/*!
 * Invocation Context
 *
 * One context per call attempt. Carries the unit of work, the event sink
 * for fire-and-forget notifications, and the interrupt signal shared with
 * whatever thread ends up running the work.
 */

use super::errors::{ResilienceError, ResilienceResult};
use crate::monitoring::{Event, EventSink, NoopSink};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};
use std::time::{Duration, Instant};
use tracing::trace;

/// Zero-argument unit of work guarded by a strategy chain
pub type Work<V> = Arc<dyn Fn() -> anyhow::Result<V> + Send + Sync>;

/// Per-call context threaded unmodified through a strategy chain
pub struct InvocationContext<V> {
    work: Work<V>,
    sink: Arc<dyn EventSink>,
    interrupt: Interrupt,
}

impl<V> InvocationContext<V> {
    /// Create a context that discards events
    pub fn new<F>(work: F) -> Self
    where
        F: Fn() -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self {
            work: Arc::new(work),
            sink: Arc::new(NoopSink),
            interrupt: Interrupt::new(),
        }
    }

    /// Route events to the given sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share an interrupt the work itself can observe
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Run the unit of work on the calling thread
    ///
    /// Failures are wrapped as delegate failures, never reclassified.
    pub fn call(&self) -> ResilienceResult<V> {
        (self.work)().map_err(ResilienceError::delegate)
    }

    /// Shared handle to the unit of work, for offloading
    pub fn work(&self) -> Work<V> {
        Arc::clone(&self.work)
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Fire an event toward the sink
    ///
    /// Never blocks the decision and never fails: sink errors and panics
    /// are swallowed here.
    pub fn fire_event(&self, event: Event) {
        match catch_unwind(AssertUnwindSafe(|| self.sink.on_event(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => trace!(error = %e, ?event, "event sink failed, event dropped"),
            Err(_) => trace!(?event, "event sink panicked, event dropped"),
        }
    }
}

struct InterruptState {
    flag: AtomicBool,
    worker: Mutex<Option<Thread>>,
}

/// Best-effort cancellation signal toward running work
///
/// Setting the flag also unparks the bound worker thread so cooperative
/// waits such as [`Interrupt::sleep`] return early. Nothing forces the
/// work to stop.
#[derive(Clone)]
pub struct Interrupt {
    state: Arc<InterruptState>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self {
            state: Arc::new(InterruptState {
                flag: AtomicBool::new(false),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Signal the running work
    pub fn interrupt(&self) {
        self.state.flag.store(true, Ordering::Release);
        if let Some(worker) = self.state.worker.lock().as_ref() {
            worker.unpark();
        }
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.state.flag.load(Ordering::Acquire)
    }

    /// Bind the current thread as the one running the work
    ///
    /// The previous binding is restored when the returned guard drops.
    pub fn bind_current(&self) -> InterruptBinding<'_> {
        let previous = self.state.worker.lock().replace(thread::current());
        InterruptBinding {
            interrupt: self,
            previous,
        }
    }

    /// Sleep for `duration` unless interrupted first
    ///
    /// Returns `true` if the sleep was cut short by an interrupt.
    pub fn sleep(&self, duration: Duration) -> bool {
        let _binding = self.bind_current();
        let deadline = Instant::now() + duration;
        loop {
            if self.is_interrupted() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupt")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// Guard that restores the previous worker binding on drop
pub struct InterruptBinding<'a> {
    interrupt: &'a Interrupt,
    previous: Option<Thread>,
}

impl Drop for InterruptBinding<'_> {
    fn drop(&mut self) {
        *self.interrupt.state.worker.lock() = self.previous.take();
    }
}
