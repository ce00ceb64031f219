use super::error::Elapsed;
use crate::time::sleep::{Sleep, sleep};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Bounds the execution time of `future`.
///
/// Resolves to `Ok(output)` if the future completes within `duration`,
/// or `Err(Elapsed)` otherwise. The future is polled first, so one that
/// is ready at the deadline still wins.
///
/// # Examples
///
/// ```rust,ignore
/// match timeout(Duration::from_millis(50), fetch()).await {
///     Ok(body) => use_it(body),
///     Err(elapsed) => log(elapsed),
/// }
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout {
        future,
        sleep: sleep(duration),
        duration,
    }
}

/// Future returned by [`timeout`].
pub struct Timeout<F> {
    future: F,
    sleep: Sleep,
    duration: Duration,
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `future` is never moved out of the pinned `Timeout`;
        // `sleep` is `Unpin`.
        let this = unsafe { self.get_unchecked_mut() };

        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        if let Poll::Ready(value) = future.poll(cx) {
            return Poll::Ready(Ok(value));
        }

        if let Poll::Ready(()) = Pin::new(&mut this.sleep).poll(cx) {
            return Poll::Ready(Err(Elapsed::new(this.duration)));
        }

        Poll::Pending
    }
}
