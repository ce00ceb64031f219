use super::command::Command;
use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError, SendError, Sender, channel};
use std::thread;
use std::time::Instant;

/// Cloneable sender side of the reactor's command channel.
#[derive(Clone)]
pub(crate) struct ReactorHandle {
    sender: Sender<Command>,
}

impl ReactorHandle {
    pub(crate) fn send(&self, command: Command) -> Result<(), SendError<Command>> {
        self.sender.send(command)
    }
}

/// Timer reactor.
///
/// Runs on its own thread, owns a min-heap of deadlines and wakes the
/// registered task when a deadline passes. Between deadlines it blocks
/// on the command channel, so new timers are picked up immediately.
pub(crate) struct Reactor {
    receiver: Receiver<Command>,
    timers: BinaryHeap<TimerEntry>,
}

impl Reactor {
    /// Spawns the reactor thread.
    pub(crate) fn start(thread_name: &str) -> io::Result<(ReactorHandle, thread::JoinHandle<()>)> {
        let (sender, receiver) = channel();

        let mut reactor = Reactor {
            receiver,
            timers: BinaryHeap::new(),
        };

        let join = thread::Builder::new()
            .name(format!("{thread_name}-reactor"))
            .spawn(move || reactor.run())?;

        Ok((ReactorHandle { sender }, join))
    }

    fn run(&mut self) {
        tracing::trace!("reactor started");

        loop {
            self.fire_expired();

            let received = match self.timers.peek() {
                Some(next) => self
                    .receiver
                    .recv_timeout(next.deadline.saturating_duration_since(Instant::now())),
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Command::SetTimer { deadline, timer }) => {
                    self.timers.push(TimerEntry { deadline, timer });
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        tracing::trace!(pending = self.timers.len(), "reactor stopped");
    }

    /// Fires every timer whose deadline has passed.
    fn fire_expired(&mut self) {
        let now = Instant::now();

        while self.timers.peek().is_some_and(|t| t.deadline <= now) {
            if let Some(entry) = self.timers.pop() {
                entry.timer.fire();
            }
        }
    }
}
