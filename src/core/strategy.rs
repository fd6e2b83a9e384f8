/*!
 * Strategy Contract
 *
 * The single capability every policy implements. Strategies nest by owning
 * their delegate; the chain shape is fixed when it is assembled.
 */

use super::context::InvocationContext;
use super::errors::ResilienceResult;
use std::sync::Arc;

/// A resilience policy (or the execution leaf) in a strategy chain
///
/// `V` is the value flowing through the chain. Asynchronous chains use
/// [`AsyncResult<T>`](crate::promise::AsyncResult) as `V`; for them an `Err`
/// from `apply` is reserved for fatal scheduling failures, while expected
/// outcomes travel inside the returned handle.
pub trait Strategy<V>: Send + Sync {
    fn apply(&self, ctx: &InvocationContext<V>) -> ResilienceResult<V>;
}

impl<V, S> Strategy<V> for Box<S>
where
    S: Strategy<V> + ?Sized,
{
    #[inline]
    fn apply(&self, ctx: &InvocationContext<V>) -> ResilienceResult<V> {
        (**self).apply(ctx)
    }
}

impl<V, S> Strategy<V> for Arc<S>
where
    S: Strategy<V> + ?Sized,
{
    #[inline]
    fn apply(&self, ctx: &InvocationContext<V>) -> ResilienceResult<V> {
        (**self).apply(ctx)
    }
}

/// Boxed strategy, as stored in assembled chains
pub type BoxStrategy<V> = Box<dyn Strategy<V>>;

/// Strategy built from a closure, mostly useful as a test delegate
pub struct FnStrategy<F> {
    f: F,
}

impl<F> FnStrategy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<V, F> Strategy<V> for FnStrategy<F>
where
    F: Fn(&InvocationContext<V>) -> ResilienceResult<V> + Send + Sync,
{
    fn apply(&self, ctx: &InvocationContext<V>) -> ResilienceResult<V> {
        (self.f)(ctx)
    }
}
