/*!
 * Async Result
 *
 * Single-assignment completion handle shared between whoever produces the
 * outcome and whoever observes it.
 *
 * ## State Machine
 *
 * ```text
 * PENDING --resolve--> RESOLVED(value | error)
 * ```
 *
 * The transition happens under one mutex per handle. Racing writers (a
 * worker finishing, a timer watch firing) all call `resolve`; the first
 * wins and every later call returns `false` without touching the state.
 * Callbacks and wakers run after the lock is released.
 */

mod future;

use crate::core::errors::{ResilienceError, ResilienceResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::task::Waker;
use std::time::{Duration, Instant};

type Callback<V> = Box<dyn FnOnce(&ResilienceResult<V>) + Send>;

enum State<V> {
    Pending {
        callbacks: Vec<Callback<V>>,
        wakers: Vec<Waker>,
    },
    Resolved(Arc<ResilienceResult<V>>),
}

struct Inner<V> {
    state: Mutex<State<V>>,
    resolved: Condvar,
}

/// Single-assignment asynchronous result
///
/// Cloning yields another handle to the same slot.
pub struct AsyncResult<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for AsyncResult<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> AsyncResult<V> {
    /// Create an unresolved handle
    pub fn pending() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending {
                    callbacks: Vec::new(),
                    wakers: Vec::new(),
                }),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Create a handle already resolved with `outcome`
    pub fn from_result(outcome: ResilienceResult<V>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Resolved(Arc::new(outcome))),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Create a handle already resolved with a value
    pub fn completed(value: V) -> Self {
        Self::from_result(Ok(value))
    }

    /// Create a handle already resolved with a failure
    pub fn failed(error: ResilienceError) -> Self {
        Self::from_result(Err(error))
    }

    /// Attempt the PENDING -> RESOLVED transition
    ///
    /// Returns `true` if this call resolved the handle, `false` if it was
    /// already resolved (the outcome is then dropped).
    pub fn resolve(&self, outcome: ResilienceResult<V>) -> bool {
        let outcome = Arc::new(outcome);
        let (callbacks, wakers) = {
            let mut state = self.inner.state.lock();
            let previous = match &mut *state {
                State::Resolved(_) => return false,
                State::Pending { callbacks, wakers } => {
                    (std::mem::take(callbacks), std::mem::take(wakers))
                }
            };
            *state = State::Resolved(Arc::clone(&outcome));
            previous
        };

        self.inner.resolved.notify_all();
        for waker in wakers {
            waker.wake();
        }
        for callback in callbacks {
            callback(&outcome);
        }
        true
    }

    /// Resolve with a value
    #[inline]
    pub fn complete(&self, value: V) -> bool {
        self.resolve(Ok(value))
    }

    /// Resolve with a failure
    #[inline]
    pub fn fail(&self, error: ResilienceError) -> bool {
        self.resolve(Err(error))
    }

    pub fn is_done(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Resolved(_))
    }

    /// Register a completion callback
    ///
    /// Runs on the resolving thread, or immediately on the calling thread if
    /// the handle is already resolved.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(&ResilienceResult<V>) + Send + 'static,
    {
        let resolved = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                State::Pending { callbacks, .. } => {
                    callbacks.push(Box::new(callback));
                    return;
                }
                State::Resolved(outcome) => Arc::clone(outcome),
            }
        };
        callback(&resolved);
    }

    /// Same handle identity check
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn outcome(&self) -> Option<Arc<ResilienceResult<V>>> {
        match &*self.inner.state.lock() {
            State::Resolved(outcome) => Some(Arc::clone(outcome)),
            State::Pending { .. } => None,
        }
    }
}

impl<V: Clone> AsyncResult<V> {
    /// Outcome if already resolved
    pub fn try_get(&self) -> Option<ResilienceResult<V>> {
        self.outcome().map(|outcome| (*outcome).clone())
    }

    /// Block the calling thread until resolved
    pub fn wait(&self) -> ResilienceResult<V> {
        let mut state = self.inner.state.lock();
        loop {
            if let State::Resolved(outcome) = &*state {
                return (**outcome).clone();
            }
            self.inner.resolved.wait(&mut state);
        }
    }

    /// Block until resolved or `timeout` elapses
    ///
    /// Returns `None` if still pending when the wait gives up. The handle
    /// itself is not affected.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ResilienceResult<V>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.wait());
        };
        let mut state = self.inner.state.lock();
        loop {
            if let State::Resolved(outcome) = &*state {
                return Some((**outcome).clone());
            }
            if self
                .inner
                .resolved
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return match &*state {
                    State::Resolved(outcome) => Some((**outcome).clone()),
                    State::Pending { .. } => None,
                };
            }
        }
    }
}

impl<V> AsyncResult<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Forward this handle's eventual outcome, verbatim, into `target`
    ///
    /// Returns nothing: if `target` was already resolved the forwarded
    /// outcome is silently discarded.
    pub fn forward_to(&self, target: &AsyncResult<V>) {
        let target = target.clone();
        self.on_complete(move |outcome| {
            target.resolve(outcome.clone());
        });
    }
}

impl<V> Default for AsyncResult<V> {
    fn default() -> Self {
        Self::pending()
    }
}

impl<V> std::fmt::Debug for AsyncResult<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.inner.state.lock() {
            State::Pending { .. } => "pending",
            State::Resolved(outcome) if outcome.is_ok() => "completed",
            State::Resolved(_) => "failed",
        };
        f.debug_struct("AsyncResult").field("state", &state).finish()
    }
}
