/*!
 * Chain Builder
 *
 * Assembles policy descriptors into an immutable strategy chain once, in
 * front of an execution leaf. The resulting `Chain` is reused for every
 * invocation.
 */

use super::policy::PolicySpec;
use super::runtime::ResilienceRuntime;
use crate::core::{BoxStrategy, InvocationContext, ResilienceResult, Strategy};
use crate::execution::OffloadedExecution;
use crate::promise::AsyncResult;
use crate::rate_limit::{AsyncRateLimit, RateLimitConfig, RateLimiter};
use crate::timeout::{Timeout, TimeoutConfig};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Collects policies, outermost first
pub struct ChainBuilder<T> {
    runtime: ResilienceRuntime,
    policies: Vec<PolicySpec>,
    _value: PhantomData<fn() -> T>,
}

impl<T> ChainBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(super) fn new(runtime: ResilienceRuntime) -> Self {
        Self {
            runtime,
            policies: Vec::new(),
            _value: PhantomData,
        }
    }

    pub fn rate_limit(self, config: RateLimitConfig) -> Self {
        self.policy(PolicySpec::RateLimit(config))
    }

    pub fn timeout(self, config: TimeoutConfig) -> Self {
        self.policy(PolicySpec::Timeout(config))
    }

    pub fn policy(mut self, policy: impl Into<PolicySpec>) -> Self {
        self.policies.push(policy.into());
        self
    }

    /// Finish with offloaded execution on the runtime's pool
    pub fn build(self) -> ResilienceResult<Chain<T>> {
        let leaf = OffloadedExecution::new(Arc::clone(self.runtime.pool()));
        self.build_with(leaf)
    }

    /// Finish with a caller-supplied innermost strategy
    ///
    /// # Errors
    ///
    /// Fails if a rate limit configuration does not validate.
    pub fn build_with<S>(self, leaf: S) -> ResilienceResult<Chain<T>>
    where
        S: Strategy<AsyncResult<T>> + 'static,
    {
        let mut strategy: BoxStrategy<AsyncResult<T>> = Box::new(leaf);

        for policy in self.policies.iter().rev() {
            strategy = match policy {
                PolicySpec::RateLimit(config) => {
                    let limiter = RateLimiter::new(config, Arc::clone(self.runtime.clock()))?;
                    Box::new(AsyncRateLimit::new(limiter, strategy))
                }
                PolicySpec::Timeout(config) => Box::new(Timeout::new(
                    config,
                    Arc::clone(self.runtime.timer()),
                    strategy,
                )),
            };
        }

        debug!(
            policies = ?self.policies.iter().map(PolicySpec::kind).collect::<Vec<_>>(),
            "Chain assembled"
        );

        Ok(Chain {
            strategy,
            policies: self.policies,
            runtime: self.runtime,
        })
    }
}

/// Assembled, immutable strategy chain
pub struct Chain<T> {
    strategy: BoxStrategy<AsyncResult<T>>,
    policies: Vec<PolicySpec>,
    runtime: ResilienceRuntime,
}

impl<T> Chain<T>
where
    T: Send + Sync + 'static,
{
    /// Policies from outermost to innermost
    pub fn policies(&self) -> &[PolicySpec] {
        &self.policies
    }

    /// Run one attempt with a caller-built context
    pub fn apply(&self, ctx: &InvocationContext<AsyncResult<T>>) -> ResilienceResult<AsyncResult<T>> {
        self.strategy.apply(ctx)
    }

    /// Run one attempt of a blocking computation
    ///
    /// Events go to the runtime's default sink.
    pub fn call<F>(&self, work: F) -> ResilienceResult<AsyncResult<T>>
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let ctx = InvocationContext::blocking(work).with_sink(Arc::clone(self.runtime.sink()));
        self.apply(&ctx)
    }
}

impl<T> Strategy<AsyncResult<T>> for Chain<T>
where
    T: Send + Sync + 'static,
{
    fn apply(&self, ctx: &InvocationContext<AsyncResult<T>>) -> ResilienceResult<AsyncResult<T>> {
        self.strategy.apply(ctx)
    }
}

impl<T> std::fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}
