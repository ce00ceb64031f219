use super::timer::TimerShared;

use std::sync::Arc;
use std::time::Instant;

/// Requests sent to the reactor thread.
pub(crate) enum Command {
    /// Wake `timer` once `deadline` is reached, unless it was cancelled.
    SetTimer {
        deadline: Instant,
        timer: Arc<TimerShared>,
    },

    /// Stop the reactor loop.
    Shutdown,
}
