//! # Convoy
//!
//! **Convoy** runs batches of asynchronous tasks with a bounded number of
//! them in flight, cooperative cancellation, and outcome aggregation that
//! never lets one failure erase the others.
//!
//! It ships its own small runtime: a work-stealing multi-threaded
//! executor and a timer reactor. On top of it sit:
//!
//! - [`batch`]: tasks, the bounded scheduler and the outcome aggregator
//! - [`cancel`]: cancellation tokens shared by any number of tasks
//! - [`time`]: `sleep` and `timeout`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use convoy::batch::{Outcome, Task};
//! use convoy::time::sleep;
//! use std::time::Duration;
//!
//! #[convoy::main]
//! async fn main() {
//!     let tasks = [300, 100, 200].map(|ms| {
//!         Task::new(move |_token| async move {
//!             sleep(Duration::from_millis(ms)).await;
//!             Ok::<_, String>(ms)
//!         })
//!     });
//!
//!     let batch = convoy::submit(tasks, 2).expect("inside a runtime");
//!
//!     for outcome in batch.all_settled().await {
//!         println!("{outcome:?}");
//!     }
//! }
//! ```
//!
//! Convoy logs through [`tracing`] and installs no subscriber of its own.

mod reactor;
mod runtime;
mod utils;

pub mod batch;
pub mod cancel;
pub mod error;
pub mod time;

pub use batch::{BatchHandle, Outcome, Scheduler, Task, submit, with_deadline};
pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use convoy_macros::*;
