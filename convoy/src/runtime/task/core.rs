use super::JoinHandle;
use super::state::{CANCELLED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::runtime::context;
use crate::runtime::work_stealing::injector::InjectorHandle;

use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A runnable unit of work that can be executed by the scheduler.
///
/// The executor stores heterogeneous tasks as `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Polls the task once. Called by a worker thread.
    fn run(self: Arc<Self>);
}

/// A spawned future together with its scheduling state and output slot.
pub(crate) struct Task<T> {
    /// The future being driven.
    ///
    /// Only touched while the task is `RUNNING`, which grants exclusive
    /// access. Set to `None` once the task completes or panics so the
    /// future's resources are released early.
    future: UnsafeCell<Option<BoxFuture<T>>>,

    /// Output of the future, taken by the `JoinHandle`.
    pub(crate) result: Mutex<Option<T>>,

    /// Scheduling state, one of the constants in [`super::state`].
    pub(crate) state: AtomicUsize,

    /// Global queue used to reschedule the task when it is woken.
    injector: InjectorHandle,

    /// Wakers of `JoinHandle`s awaiting this task.
    pub(crate) waiters: Mutex<Vec<Waker>>,
}

// Safety: the future is only accessed by the worker that moved the task
// into `RUNNING`; everything else is behind atomics or locks.
unsafe impl<T: Send> Send for Task<T> {}
unsafe impl<T: Send> Sync for Task<T> {}

impl<T: Send + 'static> Task<T> {
    pub(crate) fn new<F>(future: F, injector: InjectorHandle) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: UnsafeCell::new(Some(Box::pin(future))),
            result: Mutex::new(None),
            state: AtomicUsize::new(QUEUED),
            injector,
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// Polls the task once.
    ///
    /// - `Poll::Pending`: back to `IDLE`, or re-queued if it was notified
    ///   while running.
    /// - `Poll::Ready`: stores the output and wakes every waiter.
    ///
    /// A panicking future cancels the task instead of taking the worker
    /// thread down with it.
    fn poll_once(self: Arc<Self>) {
        let current = self.state.load(Ordering::Acquire);

        if current != QUEUED && current != NOTIFIED {
            return;
        }

        if self
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);

        // Safety: RUNNING grants exclusive access to the future.
        let slot = unsafe { &mut *self.future.get() };

        let Some(future) = slot.as_mut() else {
            return;
        };

        let poll = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));

        match poll {
            Ok(Poll::Pending) => {
                match self.state.compare_exchange(
                    RUNNING,
                    IDLE,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => {}
                    Err(NOTIFIED) => {
                        self.state.store(QUEUED, Ordering::Release);
                        self.injector.push(self.clone());
                    }
                    // Aborted while running; the future is never polled again.
                    Err(_) => *slot = None,
                }
            }
            Ok(Poll::Ready(value)) => {
                *slot = None;
                *self.result.lock() = Some(value);
                self.state.store(COMPLETED, Ordering::Release);
                self.wake_waiters();
            }
            Err(_) => {
                *slot = None;
                tracing::error!("spawned task panicked; cancelling it");
                self.state.store(CANCELLED, Ordering::Release);
                self.wake_waiters();
            }
        }
    }

    /// Signals the task to be rescheduled.
    ///
    /// An `IDLE` task is queued; a `RUNNING` one is marked `NOTIFIED` so
    /// it is polled again right after its current slice.
    pub(crate) fn schedule(self: Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.injector.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Moves the task to `CANCELLED` unless it already finished.
    ///
    /// Waiters are woken so they can observe the new state.
    pub(crate) fn abort(&self) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            if state == COMPLETED || state == CANCELLED {
                return;
            }

            if self
                .state
                .compare_exchange(state, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.wake_waiters();
                return;
            }
        }
    }

    fn wake_waiters(&self) {
        for waker in self.waiters.lock().drain(..) {
            waker.wake();
        }
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        self.poll_once()
    }
}

/// Spawns a future onto the current runtime.
///
/// When called from a worker thread the task goes to that worker's local
/// queue; otherwise it is pushed to the global injector.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = convoy::task::spawn(async { 1 + 1 });
/// assert_eq!(handle.await, 2);
/// ```
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let handle = context::current().expect("spawn must be called within the context of a runtime");

    let task = Arc::new(Task::new(future, handle.injector.clone()));

    if !context::push_local(task.clone()) {
        handle.injector.push(task.clone());
    }

    JoinHandle { task }
}
