//! Work-stealing queues.
//!
//! - [`injector`]: the global queue new and rescheduled tasks go to,
//!   also used to park idle workers.
//! - [`queue`]: per-worker local queues that other workers steal from.

pub(crate) mod injector;
pub(crate) mod queue;
