//! Errors reported by the batch runner.
//!
//! These are misuse errors: they mean the caller broke the task or
//! aggregator state machine, and are always surfaced as `Err`. Failures
//! of the operations themselves are not errors at this level; they end
//! up as [`Outcome::Rejected`](crate::batch::Outcome::Rejected).

use crate::batch::{TaskId, TaskState};

/// Result alias for fallible batch operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed scheduler configuration. Nothing was scheduled.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A batch was submitted from a thread that is not running inside a
    /// runtime.
    #[error("batches must be submitted from within a convoy runtime")]
    OutsideRuntime,

    /// The task is not in a state that allows the requested transition,
    /// e.g. starting a task twice.
    #[error("{id} is {state} but must be pending")]
    InvalidState { id: TaskId, state: TaskState },

    /// The task already reached a terminal state.
    #[error("{id} already settled as {state}")]
    AlreadySettled { id: TaskId, state: TaskState },

    /// An outcome was recorded twice for the same task.
    #[error("outcome of {id} was already recorded")]
    DuplicateRecord { id: TaskId },

    /// An outcome was recorded for a task outside the batch.
    #[error("{id} is not part of this batch")]
    UnknownTask { id: TaskId },
}
