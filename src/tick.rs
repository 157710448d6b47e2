//! Deferred delivery onto the next scheduler iteration
//!
//! The facade never hands a result back inside the poll that produced it:
//! it awaits [`next_tick`] first, which re-queues the current task and
//! suspends once. Continuations therefore always run on a later pass of the
//! runtime's task queue, even for adapters that complete inline.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Suspend the current task until the next scheduler iteration
pub async fn next_tick() {
    NextTick { yielded: false }.await;
}

struct NextTick {
    yielded: bool,
}

impl Future for NextTick {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;
    use std::pin::pin;

    #[test]
    fn test_next_tick_is_pending_on_first_poll() {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut tick = pin!(next_tick());
        assert!(tick.as_mut().poll(&mut cx).is_pending());
        assert!(tick.as_mut().poll(&mut cx).is_ready());
    }

    #[compio::test]
    async fn test_next_tick_completes_on_runtime() {
        next_tick().await;
        next_tick().await;
    }
}
