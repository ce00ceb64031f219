use super::task::{Task, TaskRef};
use crate::time::sleep;

use std::time::Duration;

/// Rejects `task` with [`Rejection::Timeout`](super::Rejection::Timeout)
/// if it has not settled `duration` after it starts.
///
/// When the deadline wins, the task's token is cancelled and the
/// operation is dropped. When the task settles first, its timer is
/// cancelled and has no further effect.
///
/// # Examples
///
/// ```rust,ignore
/// let task = with_deadline(Task::new(fetch), Duration::from_millis(50));
/// ```
pub fn with_deadline<T, E>(task: Task<T, E>, duration: Duration) -> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    task.deadline(duration)
}

/// Waits `after`, then rejects every task of a batch that has not
/// settled yet, whether it is running or still in the backlog.
pub(crate) async fn expire_batch(tasks: Vec<TaskRef>, after: Duration) {
    sleep(after).await;

    let expired = tasks.iter().filter(|task| task.expire(after)).count();

    if expired > 0 {
        tracing::warn!(expired, ?after, "batch deadline elapsed");
    }
}
