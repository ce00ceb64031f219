use crate::runtime::context::{self, Handle, WorkerContext};
use crate::runtime::executor::worker::Worker;
use crate::runtime::task::{JoinHandle, Task};
use crate::runtime::work_stealing::injector::{Injector, InjectorHandle};
use crate::runtime::work_stealing::queue::LocalQueue;
use crate::reactor::ReactorHandle;

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::thread;

/// Multi-threaded work-stealing executor.
///
/// Owns the global injector and the worker threads. Each worker runs
/// with the runtime context installed so `spawn` and timers work from
/// inside tasks.
pub(crate) struct Executor {
    injector: InjectorHandle,
    handles: Vec<thread::JoinHandle<()>>,
}

impl Executor {
    /// Starts `threads` workers named `{thread_name}-{id}`.
    ///
    /// Fails if the OS refuses to spawn a thread; workers already started
    /// are shut down before returning.
    pub(crate) fn new(
        reactor: ReactorHandle,
        threads: usize,
        thread_name: &str,
    ) -> io::Result<Self> {
        let injector = Arc::new(Injector::new());

        let locals: Arc<Vec<Arc<LocalQueue>>> =
            Arc::new((0..threads).map(|_| Arc::new(LocalQueue::new())).collect());

        let mut executor = Self {
            injector: injector.clone(),
            handles: Vec::with_capacity(threads),
        };

        for id in 0..threads {
            let handle = Handle {
                reactor: reactor.clone(),
                injector: injector.clone(),
            };
            let worker = Worker::new(id, locals.clone(), injector.clone());
            let worker_context = WorkerContext {
                id,
                locals: locals.clone(),
            };

            let spawned = thread::Builder::new()
                .name(format!("{thread_name}-{id}"))
                .spawn(move || {
                    context::set_worker(worker_context);
                    context::enter(handle, || worker.run());
                });

            match spawned {
                Ok(join) => executor.handles.push(join),
                Err(err) => {
                    executor.shutdown();
                    executor.join();
                    return Err(err);
                }
            }
        }

        tracing::debug!(threads, "executor started");

        Ok(executor)
    }

    /// Signals every worker to stop after its current task.
    pub(crate) fn shutdown(&self) {
        self.injector.shutdown();
    }

    /// Pushes a new task onto the global injector.
    ///
    /// After shutdown the task is still created but never polled; its
    /// handle never resolves.
    pub(crate) fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let task = Arc::new(Task::new(future, self.injector.clone()));

        if !self.injector.is_shutdown() {
            self.injector.push(task.clone());
        }

        JoinHandle { task }
    }

    /// Waits for every worker thread to exit.
    pub(crate) fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
