//! Task executor.
//!
//! - [`core`]: executor lifecycle (start, spawn, shutdown, join),
//! - [`worker`]: the per-thread work-stealing loop.

pub(crate) mod core;
pub(crate) mod worker;
