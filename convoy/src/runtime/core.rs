use super::executor::core::Executor;
use super::task::JoinHandle;
use crate::reactor::command::Command;
use crate::reactor::{Reactor, ReactorHandle};

use std::future::Future;
use std::io;
use std::sync::mpsc;
use std::thread;

/// The main runtime handle.
///
/// A `Runtime` owns a work-stealing executor and a timer reactor. It is
/// the synchronous entry point into async code through
/// [`block_on`](Self::block_on).
///
/// Dropping the runtime stops the workers and the reactor and joins
/// their threads.
pub struct Runtime {
    executor: Executor,
    reactor: ReactorHandle,
    reactor_thread: Option<thread::JoinHandle<()>>,
}

impl Runtime {
    /// Starts the reactor, then `worker_threads` executor workers.
    pub(crate) fn new(worker_threads: usize, thread_name: &str) -> io::Result<Self> {
        let (reactor, reactor_thread) = Reactor::start(thread_name)?;

        let executor = match Executor::new(reactor.clone(), worker_threads, thread_name) {
            Ok(executor) => executor,
            Err(err) => {
                let _ = reactor.send(Command::Shutdown);
                let _ = reactor_thread.join();
                return Err(err);
            }
        };

        Ok(Self {
            executor,
            reactor,
            reactor_thread: Some(reactor_thread),
        })
    }

    /// Spawns a future onto the runtime.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 7 });
    /// ```
    pub fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// The future is spawned onto the executor and its output sent back
    /// through a channel.
    ///
    /// # Panics
    ///
    /// Panics if the future panics, since its output can then never be
    /// delivered.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async { 42 });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (transmitter, receiver) = mpsc::channel();

        self.executor.spawn(async move {
            let result = future.await;
            let _ = transmitter.send(result);
        });

        receiver
            .recv()
            .expect("block_on future panicked before producing a value")
    }
}

impl Drop for Runtime {
    /// Stops the executor, then the reactor, then joins all threads.
    fn drop(&mut self) {
        self.executor.shutdown();

        let _ = self.reactor.send(Command::Shutdown);

        self.executor.join();

        if let Some(reactor_thread) = self.reactor_thread.take() {
            let _ = reactor_thread.join();
        }
    }
}
