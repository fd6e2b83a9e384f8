/*!
 * Offloaded Execution
 *
 * Innermost strategy for asynchronous chains: hands the work to a worker
 * pool and returns immediately with a pending handle that the worker
 * resolves. The worker is bound to the context's interrupt, so a timeout
 * firing upstream can cut cooperative waits in the work short.
 */

use super::pool::WorkerPool;
use crate::core::{InvocationContext, ResilienceError, ResilienceResult, Strategy};
use crate::monitoring::{Category, Event};
use crate::promise::AsyncResult;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace};

/// Chain leaf that runs the work on a [`WorkerPool`]
pub struct OffloadedExecution<T> {
    pool: Arc<dyn WorkerPool>,
    description: Arc<str>,
    _value: PhantomData<fn() -> T>,
}

impl<T> OffloadedExecution<T> {
    pub fn new(pool: Arc<dyn WorkerPool>) -> Self {
        Self {
            pool,
            description: Arc::from("offloaded-execution"),
            _value: PhantomData,
        }
    }

    pub fn with_description(mut self, description: impl Into<Arc<str>>) -> Self {
        self.description = description.into();
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<T> Clone for OffloadedExecution<T> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            description: Arc::clone(&self.description),
            _value: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for OffloadedExecution<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffloadedExecution")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<T> Strategy<AsyncResult<T>> for OffloadedExecution<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn apply(&self, ctx: &InvocationContext<AsyncResult<T>>) -> ResilienceResult<AsyncResult<T>> {
        ctx.fire_event(Event::started(Category::Execution, self.description.clone()));
        trace!(strategy = %self.description, "offloaded execution entered");

        let result = AsyncResult::pending();
        let guard = UnrunGuard::new(result.clone());
        let work = ctx.work();
        let interrupt = ctx.interrupt().clone();

        self.pool.submit(Box::new(move || {
            let target = guard.disarm();
            if interrupt.is_interrupted() {
                target.fail(ResilienceError::delegate(anyhow::anyhow!(
                    "work interrupted before it started"
                )));
                return;
            }
            let _binding = interrupt.bind_current();
            match catch_unwind(AssertUnwindSafe(|| work())) {
                Ok(Ok(inner)) => inner.forward_to(&target),
                Ok(Err(e)) => {
                    target.fail(ResilienceError::delegate(e));
                }
                Err(_) => {
                    target.fail(ResilienceError::delegate(anyhow::anyhow!("work panicked")));
                }
            }
        }))
        .inspect_err(|e| debug!(strategy = %self.description, error = %e, "offload rejected"))?;

        ctx.fire_event(Event::finished(Category::Execution, self.description.clone()));
        trace!(strategy = %self.description, "offloaded execution exited");
        Ok(result)
    }
}

/// Fails the handle if the pool drops the job without running it
struct UnrunGuard<T> {
    target: Option<AsyncResult<T>>,
}

impl<T> UnrunGuard<T> {
    fn new(target: AsyncResult<T>) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// The job started: hand the handle over to it
    fn disarm(mut self) -> AsyncResult<T> {
        match self.target.take() {
            Some(target) => target,
            None => AsyncResult::pending(),
        }
    }
}

impl<T> Drop for UnrunGuard<T> {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            if target.fail(ResilienceError::scheduling("offloaded job dropped before it ran")) {
                debug!("Offloaded job dropped by its pool");
            }
        }
    }
}

impl<T> InvocationContext<AsyncResult<T>>
where
    T: Send + Sync + 'static,
{
    /// Context for a plain blocking computation run by an asynchronous chain
    ///
    /// The computation's value becomes the completed handle the offloaded
    /// leaf forwards.
    pub fn blocking<F>(work: F) -> Self
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::new(move || work().map(AsyncResult::completed))
    }
}
