use crate::runtime::task::Runnable;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A per-worker task queue.
///
/// The owning worker pushes and pops at the back (LIFO, for cache
/// locality); other workers steal from the front (FIFO).
pub(crate) struct LocalQueue {
    inner: Mutex<VecDeque<Arc<dyn Runnable>>>,
}

impl LocalQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.inner.lock().push_back(task);
    }

    /// Pops the most recently pushed task. Owner only.
    pub(crate) fn pop(&self) -> Option<Arc<dyn Runnable>> {
        self.inner.lock().pop_back()
    }

    /// Steals the oldest task. Used by other workers.
    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        self.inner.lock().pop_front()
    }
}
