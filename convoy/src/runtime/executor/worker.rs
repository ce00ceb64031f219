use crate::runtime::task::Runnable;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::sync::Arc;

/// A worker thread of the executor.
///
/// Looks for work in this order:
/// 1. its own local queue,
/// 2. the global injector,
/// 3. other workers' local queues, round-robin,
///
/// and parks on the injector when all of them are empty.
pub(crate) struct Worker {
    id: usize,

    /// Local queues of every worker, indexed by worker id.
    locals: Arc<Vec<Arc<LocalQueue>>>,

    injector: InjectorHandle,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        locals: Arc<Vec<Arc<LocalQueue>>>,
        injector: InjectorHandle,
    ) -> Self {
        Self {
            id,
            locals,
            injector,
        }
    }

    /// Runs tasks until the injector signals shutdown.
    pub(crate) fn run(&self) {
        tracing::trace!(worker = self.id, "worker started");

        while !self.injector.is_shutdown() {
            match self.next_task() {
                Some(task) => task.run(),
                None => self.injector.park(),
            }
        }

        tracing::trace!(worker = self.id, "worker stopped");
    }

    fn next_task(&self) -> Option<Arc<dyn Runnable>> {
        self.locals[self.id]
            .pop()
            .or_else(|| self.injector.steal())
            .or_else(|| self.try_steal())
    }

    /// Steals from another worker, starting with the next id so load
    /// spreads evenly.
    fn try_steal(&self) -> Option<Arc<dyn Runnable>> {
        let len = self.locals.len();

        (1..len)
            .map(|offset| (self.id + offset) % len)
            .find_map(|victim| self.locals[victim].steal())
    }
}
