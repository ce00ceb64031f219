use crate::runtime::task::Runnable;

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Shared handle to the global task injector.
pub(crate) type InjectorHandle = Arc<Injector>;

/// How long an idle worker sleeps before re-checking the other queues.
///
/// Tasks pushed to a worker's local queue do not signal the condvar, so
/// parked workers wake periodically to steal them.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Global FIFO queue of the executor.
///
/// Tasks spawned from outside a worker and tasks rescheduled by wakers
/// land here. Idle workers park on its condition variable.
pub(crate) struct Injector {
    queue: Mutex<VecDeque<Arc<dyn Runnable>>>,

    /// Signalled on every push and on shutdown.
    condvar: Condvar,

    shutdown: AtomicBool,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signals shutdown and wakes every parked worker.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Pushes a task and wakes one parked worker.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.lock().push_back(task);
        self.condvar.notify_one();
    }

    /// Parks the calling worker until a task is pushed, shutdown begins,
    /// or [`PARK_TIMEOUT`] elapses.
    pub(crate) fn park(&self) {
        let mut queue = self.queue.lock();

        if self.is_shutdown() || !queue.is_empty() {
            return;
        }

        self.condvar.wait_for(&mut queue, PARK_TIMEOUT);
    }

    /// Takes the oldest task, if any.
    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().pop_front()
    }
}
