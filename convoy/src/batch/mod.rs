//! Bounded-concurrency batches.
//!
//! A batch is an ordered group of [`Task`]s submitted together through a
//! [`Scheduler`]. At most `limit` of them run at once; the rest wait in a
//! FIFO backlog. The returned [`BatchHandle`] collects their
//! [`Outcome`]s in submission order, whatever order they settle in:
//!
//! - [`BatchHandle::all_settled`] waits for every outcome.
//! - [`BatchHandle::first_fulfilled`] resolves with the first value, or
//!   with an [`AggregateFailure`] listing every reason if none fulfills.
//! - [`BatchHandle::first_settled`] resolves with the first outcome of any
//!   kind.
//!
//! One task failing never stops its siblings. Only cancellation does, and
//! it is always explicit: through [`Task::request_cancel`],
//! [`BatchHandle::cancel`], a token passed to
//! [`Scheduler::cancel_with`], or a deadline.

mod aggregator;
mod deadline;
mod handle;
mod outcome;
mod scheduler;
mod task;

pub use deadline::with_deadline;
pub use handle::{BatchHandle, Progress};
pub use outcome::{AggregateFailure, Failure, Outcome, Rejection};
pub use scheduler::{Scheduler, submit};
pub use task::{Operation, OperationFuture, Task, TaskFuture, TaskId, TaskRef, TaskState};
