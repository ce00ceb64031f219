//! Runtime internals: executor, work stealing, task representation and
//! the per-thread runtime context.
//!
//! Users normally only touch [`RuntimeBuilder`](builder::RuntimeBuilder),
//! [`Runtime`] and [`task::spawn`].

mod core;
mod executor;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod work_stealing;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
