/*!
 * Rate Limit Strategies
 *
 * `RateLimiter` makes the admission decision; `RateLimit` and
 * `AsyncRateLimit` put it in front of a synchronous or asynchronous
 * delegate. The window lock is held only for read-clock, evict, check and
 * record; never while the delegate runs.
 */

use super::config::RateLimitConfig;
use super::window::TimeWindow;
use crate::core::{Clock, InvocationContext, ResilienceError, ResilienceResult, Strategy, SystemClock};
use crate::monitoring::{Category, Decision, Event};
use crate::promise::AsyncResult;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Admission decision shared by both strategy variants
pub struct RateLimiter {
    window: Mutex<TimeWindow>,
    clock: Arc<dyn Clock>,
    description: Arc<str>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> ResilienceResult<Self> {
        config.validate()?;
        Ok(Self {
            window: Mutex::new(TimeWindow::new(config)),
            clock,
            description: config.description.clone(),
        })
    }

    pub fn with_system_clock(config: &RateLimitConfig) -> ResilienceResult<Self> {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Admissions currently counted against capacity
    pub fn admitted(&self) -> usize {
        self.window.lock().admitted()
    }

    /// Decide one attempt and fire the decision event
    pub fn try_acquire<V>(&self, ctx: &InvocationContext<V>) -> ResilienceResult<()> {
        let admitted = {
            let mut window = self.window.lock();
            // Read under the lock so concurrent callers record in clock order
            let now = self.clock.now();
            window.try_admit(now)
        };

        if admitted {
            ctx.fire_event(Event::decision(self.description.clone(), Decision::Permitted));
            Ok(())
        } else {
            ctx.fire_event(Event::decision(self.description.clone(), Decision::Rejected));
            debug!(policy = %self.description, "admission rejected");
            Err(ResilienceError::rejected(self.description.clone()))
        }
    }

    fn enter<V>(&self, ctx: &InvocationContext<V>) {
        ctx.fire_event(Event::started(Category::RateLimit, self.description.clone()));
        trace!(policy = %self.description, "rate limit entered");
    }

    fn exit<V>(&self, ctx: &InvocationContext<V>) {
        ctx.fire_event(Event::finished(Category::RateLimit, self.description.clone()));
        trace!(policy = %self.description, "rate limit exited");
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("description", &self.description)
            .field("window", &*self.window.lock())
            .finish()
    }
}

/// Rate limit in front of a synchronous delegate
///
/// Rejection fails `apply` with `AdmissionRejected`; admitted calls return
/// the delegate's outcome unchanged.
pub struct RateLimit<S> {
    limiter: RateLimiter,
    delegate: S,
}

impl<S> RateLimit<S> {
    pub fn new(limiter: RateLimiter, delegate: S) -> Self {
        Self { limiter, delegate }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

impl<V, S> Strategy<V> for RateLimit<S>
where
    S: Strategy<V>,
{
    fn apply(&self, ctx: &InvocationContext<V>) -> ResilienceResult<V> {
        self.limiter.enter(ctx);
        let outcome = self
            .limiter
            .try_acquire(ctx)
            .and_then(|()| self.delegate.apply(ctx));
        self.limiter.exit(ctx);
        outcome
    }
}

/// Rate limit in front of an asynchronous delegate
///
/// Never fails `apply` for a rejection: the returned handle is already
/// resolved with `AdmissionRejected` instead.
pub struct AsyncRateLimit<S> {
    limiter: RateLimiter,
    delegate: S,
}

impl<S> AsyncRateLimit<S> {
    pub fn new(limiter: RateLimiter, delegate: S) -> Self {
        Self { limiter, delegate }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

impl<T, S> Strategy<AsyncResult<T>> for AsyncRateLimit<S>
where
    T: Send + 'static,
    S: Strategy<AsyncResult<T>>,
{
    fn apply(&self, ctx: &InvocationContext<AsyncResult<T>>) -> ResilienceResult<AsyncResult<T>> {
        self.limiter.enter(ctx);
        let result = match self.limiter.try_acquire(ctx) {
            Ok(()) => self
                .delegate
                .apply(ctx)
                .unwrap_or_else(AsyncResult::failed),
            Err(rejection) => AsyncResult::failed(rejection),
        };
        self.limiter.exit(ctx);
        Ok(result)
    }
}
