use crate::reactor::ReactorHandle;
use crate::runtime::task::Runnable;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::cell::RefCell;
use std::sync::Arc;

/// Handles a thread needs to interact with the runtime it runs in.
#[derive(Clone)]
pub(crate) struct Handle {
    /// Timer reactor of the runtime.
    pub(crate) reactor: ReactorHandle,

    /// Global injector queue of the executor.
    pub(crate) injector: InjectorHandle,
}

/// Worker-specific state, only present on executor threads.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    /// Index of the current worker in `locals`.
    pub(crate) id: usize,

    /// Local queues of every worker, indexed by worker id.
    pub(crate) locals: Arc<Vec<Arc<LocalQueue>>>,
}

thread_local! {
    /// Runtime the current thread is executing in, if any.
    static CURRENT: RefCell<Option<Handle>> = const { RefCell::new(None) };

    /// Worker state of the current thread, if it is an executor worker.
    static WORKER: RefCell<Option<WorkerContext>> = const { RefCell::new(None) };
}

/// Returns the runtime handle installed on this thread.
pub(crate) fn current() -> Option<Handle> {
    CURRENT.with(|cell| cell.borrow().clone())
}

/// Returns `true` when called from inside a runtime.
pub(crate) fn is_inside_runtime() -> bool {
    CURRENT.with(|cell| cell.borrow().is_some())
}

/// Installs `handle` for the duration of `f`, restoring the previous one
/// afterwards.
pub(crate) fn enter<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT.with(|cell| cell.replace(Some(handle)));
    let out = f();
    CURRENT.with(|cell| cell.replace(prev));
    out
}

/// Marks the current thread as worker `worker.id`.
pub(crate) fn set_worker(worker: WorkerContext) {
    WORKER.with(|cell| *cell.borrow_mut() = Some(worker));
}

/// Pushes `task` onto the current worker's local queue.
///
/// Returns `false` when the current thread is not a worker.
pub(crate) fn push_local(task: Arc<dyn Runnable>) -> bool {
    WORKER.with(|cell| match cell.borrow().as_ref() {
        Some(worker) => {
            worker.locals[worker.id].push(task);
            true
        }
        None => false,
    })
}
