use crate::runtime::task::Task;

use std::sync::Arc;
use std::task::Wake;

/// Waking a task reschedules it on the runtime.
///
/// `Waker::from(Arc<Task<T>>)` builds the waker handed to the future
/// on every poll.
impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        self.schedule();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.clone().schedule();
    }
}
