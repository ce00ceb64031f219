//! Time utilities driven by the runtime's timer reactor.
//!
//! - [`sleep`] completes after a duration,
//! - [`timeout`] bounds how long a future may take.

mod sleep;
mod timeout;

pub mod error;

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Timeout, timeout};
