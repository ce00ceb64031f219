use crate::task::Task;
use crate::task::state::{CANCELLED, COMPLETED};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::task::{Context, Poll};

/// A handle to a spawned task.
///
/// A `JoinHandle` is a future resolving to the task's output.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only
/// discards the ability to observe its result. Use [`abort`](Self::abort)
/// to stop it.
pub struct JoinHandle<T> {
    pub(crate) task: Arc<Task<T>>,
}

impl<T: Send + 'static> JoinHandle<T> {
    /// Stops the task if it has not completed yet.
    ///
    /// An aborted task is never polled again and its handle never
    /// resolves.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Returns `true` once the task completed, was aborted, or panicked.
    pub fn is_finished(&self) -> bool {
        matches!(self.task.state.load(Ordering::Acquire), COMPLETED | CANCELLED)
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    /// Returns the output if the task completed, otherwise registers the
    /// current waker.
    ///
    /// The waker is registered **before** re-checking the state to avoid
    /// missed wake-ups. A waker already registered is not added again.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if self.task.state.load(Ordering::Acquire) == COMPLETED {
            if let Some(value) = self.task.result.lock().take() {
                return Poll::Ready(value);
            }
        }

        {
            let mut waiters = self.task.waiters.lock();

            if !waiters.iter().any(|waker| waker.will_wake(cx.waker())) {
                waiters.push(cx.waker().clone());
            }
        }

        if self.task.state.load(Ordering::Acquire) == COMPLETED {
            if let Some(value) = self.task.result.lock().take() {
                return Poll::Ready(value);
            }
        }

        Poll::Pending
    }
}
