/// Task is idle and not scheduled.
///
/// The task exists but is not currently queued or running.
pub(crate) const IDLE: usize = 0;

/// Task is queued for execution.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being polled by a worker.
///
/// At most one worker may observe this state at a time; it grants
/// exclusive access to the task's future.
pub(crate) const RUNNING: usize = 2;

/// The future returned `Poll::Ready` and its output is stored.
pub(crate) const COMPLETED: usize = 3;

/// Task was woken while running and must be re-queued once the
/// current poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// Task was aborted through its `JoinHandle` or panicked while polled.
///
/// The future is never polled again.
pub(crate) const CANCELLED: usize = 5;
