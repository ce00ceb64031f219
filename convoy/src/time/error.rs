//! Time-related errors.

use std::time::Duration;

/// Returned by [`timeout`](super::timeout) when the deadline passes
/// before the future completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {after:?} elapsed")]
pub struct Elapsed {
    after: Duration,
}

impl Elapsed {
    pub(crate) fn new(after: Duration) -> Self {
        Self { after }
    }

    /// The duration the future was given.
    pub fn after(&self) -> Duration {
        self.after
    }
}
