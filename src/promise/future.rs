/*!
 * Future Adapter
 * Lets async callers `.await` an AsyncResult
 */

use super::{AsyncResult, State};
use crate::core::errors::ResilienceResult;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

impl<V: Clone> Future for AsyncResult<V> {
    type Output = ResilienceResult<V>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.inner.state.lock();
        match &mut *state {
            State::Resolved(outcome) => Poll::Ready((**outcome).clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
