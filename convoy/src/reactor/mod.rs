//! Timer reactor.
//!
//! A dedicated thread that wakes tasks when their timers expire. Time
//! primitives talk to it through [`command::Command`]s sent over a
//! channel; it never touches the executor directly.

mod core;
mod timer;

pub(crate) mod command;

pub(crate) use self::core::{Reactor, ReactorHandle};
pub(crate) use timer::TimerShared;
