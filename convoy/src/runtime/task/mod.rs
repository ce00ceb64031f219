//! Spawning futures onto the runtime.
//!
//! [`spawn`] schedules a future and returns a [`JoinHandle`] that
//! resolves to its output. The remaining items are the internal task
//! representation used by the executor.

pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

pub(crate) use self::core::{Runnable, Task};

pub mod core;

pub use self::core::spawn;
pub use handle::JoinHandle;
