use std::future::poll_fn;
use std::task::Poll;

/// Yields execution back to the executor once.
///
/// The task reschedules itself and returns `Pending`, letting other
/// queued tasks run before it continues. Long CPU-bound operations call
/// this between chunks of work so that cancellation and sibling tasks
/// get a chance to make progress.
///
/// # Examples
///
/// ```rust,ignore
/// for chunk in chunks {
///     process(chunk);
///     convoy::yield_now().await;
/// }
/// ```
pub async fn yield_now() {
    let mut yielded = false;

    poll_fn(|cx| {
        if yielded {
            return Poll::Ready(());
        }

        yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    })
    .await
}
