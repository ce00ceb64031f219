use crate::reactor::TimerShared;
use crate::reactor::command::Command;
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after `duration`.
///
/// # Panics
///
/// The returned future panics if polled outside of a running runtime.
/// If the runtime's timer reactor has stopped, it completes immediately
/// instead of waiting forever.
///
/// # Examples
///
/// ```rust,ignore
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(Instant::now() + duration)
}

/// A future that completes once its deadline is reached.
///
/// The timer is registered with the reactor on first poll. Dropping the
/// future cancels it, so an abandoned sleep never wakes its task.
pub struct Sleep {
    deadline: Instant,
    registered: bool,
    timer: Arc<TimerShared>,
}

impl Sleep {
    pub(crate) fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            registered: false,
            timer: Arc::new(TimerShared::new()),
        }
    }

    /// Instant at which this sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.is_elapsed() {
            this.timer.cancel();
            return Poll::Ready(());
        }

        // Re-registering on every poll keeps the waker current if the
        // sleep moved to another task.
        this.timer.register(cx.waker());

        if !this.registered {
            this.registered = true;

            let handle = context::current().expect("Sleep polled outside of runtime");

            let command = Command::SetTimer {
                deadline: this.deadline,
                timer: this.timer.clone(),
            };

            // Nothing would ever fire the timer.
            if handle.reactor.send(command).is_err() {
                tracing::error!(deadline = ?this.deadline, "timer reactor is gone, completing sleep early");
                this.timer.cancel();
                return Poll::Ready(());
            }
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}
