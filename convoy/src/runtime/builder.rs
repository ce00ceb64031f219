use super::Runtime;

use std::io;
use std::thread;

/// Builder for configuring and creating a runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(4)
///     .thread_name("fetcher")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    /// Number of executor worker threads.
    worker_threads: usize,

    /// Prefix of every thread the runtime spawns.
    thread_name: String,
}

impl RuntimeBuilder {
    /// Creates a builder with default configuration.
    ///
    /// Worker threads default to the number of available logical CPUs,
    /// falling back to `1`. Threads are named `convoy-worker-{id}` and
    /// `convoy-worker-reactor`.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            thread_name: "convoy-worker".to_string(),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the name prefix of the runtime's threads.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Starts the reactor and the executor.
    ///
    /// Fails only if a thread cannot be spawned.
    pub fn build(self) -> io::Result<Runtime> {
        Runtime::new(self.worker_threads, &self.thread_name)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
