use super::outcome::{Outcome, Rejection};
use crate::cancel::{CancellationToken, Subscription};
use crate::error::Error;
use crate::time::{Sleep, sleep};

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// Future produced by an [`Operation`].
pub type OperationFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

type Hook = Box<dyn FnOnce() + Send>;

/// Opaque, process-unique task identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task #{}", self.0)
    }
}

/// Lifecycle state of a [`Task`].
///
/// `Pending -> Running -> {Fulfilled | Rejected | Cancelled}`. A pending
/// task may also go straight to `Cancelled`, or to `Rejected` when a
/// batch deadline expires before it is admitted. Terminal states are
/// absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    Pending = 0,
    Running = 1,
    Fulfilled = 2,
    Rejected = 3,
    Cancelled = 4,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Pending,
            1 => TaskState::Running,
            2 => TaskState::Fulfilled,
            3 => TaskState::Rejected,
            _ => TaskState::Cancelled,
        }
    }

    /// Returns `true` for `Fulfilled`, `Rejected` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Fulfilled | TaskState::Rejected | TaskState::Cancelled
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Fulfilled => "fulfilled",
            TaskState::Rejected => "rejected",
            TaskState::Cancelled => "cancelled",
        };

        f.write_str(name)
    }
}

/// An asynchronous operation run by a [`Task`].
///
/// The operation receives the task's [`CancellationToken`]. Cancellation
/// is cooperative: once the task is cancelled or times out, its future
/// is dropped at the next suspension point, and anything the operation
/// spawned elsewhere has to watch the token itself. An operation that
/// blocks its thread inside `poll` cannot be interrupted.
///
/// Implemented for every `FnOnce(CancellationToken) -> impl Future`.
pub trait Operation<T, E>: Send + 'static {
    fn start(self: Box<Self>, token: CancellationToken) -> OperationFuture<T, E>;
}

impl<F, Fut, T, E> Operation<T, E> for F
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn start(self: Box<Self>, token: CancellationToken) -> OperationFuture<T, E> {
        Box::pin((*self)(token))
    }
}

/// State shared by a task, its [`TaskRef`]s and its running future.
///
/// Every transition is a compare-and-swap on `state`, so when
/// cancellation, a deadline and completion race, exactly one of them
/// lands.
pub(crate) struct TaskCell {
    id: TaskId,
    state: AtomicU8,

    /// Deadline that rejected the task, set together with the
    /// `Rejected` transition of [`expire`](Self::expire).
    timed_out: Mutex<Option<Duration>>,

    /// Waker of the running future, or of the driver while pending.
    waker: Mutex<Option<Waker>>,

    /// Runs when a running task is cancelled or expired.
    hook: Mutex<Option<Hook>>,
}

impl TaskCell {
    fn new() -> Self {
        Self {
            id: TaskId::next(),
            state: AtomicU8::new(TaskState::Pending as u8),
            timed_out: Mutex::new(None),
            waker: Mutex::new(None),
            hook: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: TaskState, to: TaskState) -> Result<(), TaskState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(TaskState::from_u8)
    }

    fn begin(&self) -> Result<(), Error> {
        self.transition(TaskState::Pending, TaskState::Running)
            .map_err(|state| {
                if state.is_terminal() {
                    Error::AlreadySettled { id: self.id, state }
                } else {
                    Error::InvalidState { id: self.id, state }
                }
            })
    }

    /// Moves a pending or running task to `Cancelled`.
    fn cancel(&self) -> bool {
        self.force(TaskState::Cancelled, None)
    }

    /// Moves a pending or running task to `Rejected` with a timeout.
    fn expire(&self, after: Duration) -> bool {
        self.force(TaskState::Rejected, Some(after))
    }

    fn force(&self, to: TaskState, after: Option<Duration>) -> bool {
        // Held across the transition so a reader seeing `Rejected` always
        // finds the deadline.
        let mut timed_out = self.timed_out.lock();

        let mut current = self.state();

        loop {
            if current.is_terminal() {
                return false;
            }

            match self.transition(current, to) {
                Ok(()) => break,
                Err(actual) => current = actual,
            }
        }

        if after.is_some() {
            *timed_out = after;
        }
        drop(timed_out);

        tracing::debug!(task_id = %self.id, from = %current, to = %to, "task settled early");

        if current == TaskState::Running {
            if let Some(hook) = self.hook.lock().take() {
                hook();
            }
        }

        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }

        true
    }

    /// Records the natural completion of a running task.
    fn complete(&self, to: TaskState) -> bool {
        self.transition(TaskState::Running, to).is_ok()
    }

    fn register(&self, waker: &Waker) {
        let mut slot = self.waker.lock();

        match slot.as_ref() {
            Some(current) if current.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    /// Outcome of a task settled by cancellation or a deadline.
    pub(crate) fn forced_outcome<T, E>(&self) -> Option<Outcome<T, E>> {
        match self.state() {
            TaskState::Cancelled => Some(Outcome::Cancelled),
            TaskState::Rejected => {
                let after = (*self.timed_out.lock())?;
                Some(Outcome::Rejected(Rejection::Timeout { after }))
            }
            _ => None,
        }
    }
}

/// A unit of asynchronous work with a one-way lifecycle.
///
/// A task owns its [`Operation`] and a [`CancellationToken`] of its own.
/// Cancelling that token, or any token it was derived from, settles the
/// task as `Cancelled` unless it already settled.
///
/// # Examples
///
/// ```rust,ignore
/// let task = Task::new(|token| async move {
///     fetch(token).await
/// })
/// .on_cancel(|| tracing::info!("fetch aborted"));
/// ```
pub struct Task<T, E> {
    cell: Arc<TaskCell>,
    operation: Option<Box<dyn Operation<T, E>>>,
    token: CancellationToken,

    /// Registrations linking `token` to the cell and to the tokens the
    /// task was registered against.
    links: Vec<Subscription>,

    deadline: Option<Duration>,
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a pending task with a fresh token.
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::from_operation(operation, CancellationToken::new())
    }

    /// Creates a pending task registered against `token`.
    ///
    /// The task gets a child of `token`: cancelling `token` cancels the
    /// task, cancelling the task leaves `token` alone.
    pub fn with_token<F, Fut>(operation: F, token: &CancellationToken) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::from_operation(operation, token.child_token())
    }

    /// Creates a pending task from a boxed [`Operation`].
    pub fn from_operation(operation: impl Operation<T, E>, token: CancellationToken) -> Self {
        let cell = Arc::new(TaskCell::new());
        let weak = Arc::downgrade(&cell);

        let link = token.subscribe(move || {
            if let Some(cell) = weak.upgrade() {
                cell.cancel();
            }
        });

        Self {
            cell,
            operation: Some(Box::new(operation)),
            token,
            links: vec![link],
            deadline: None,
        }
    }

    /// Registers `hook` to run if the task is cancelled or times out
    /// while running.
    pub fn on_cancel<F>(self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        *self.cell.hook.lock() = Some(Box::new(hook));
        self
    }

    /// Rejects the task with a timeout if it has not settled `duration`
    /// after starting. See [`with_deadline`](super::with_deadline).
    pub fn deadline(mut self, duration: Duration) -> Self {
        self.deadline = Some(duration);
        self
    }

    pub fn id(&self) -> TaskId {
        self.cell.id
    }

    pub fn state(&self) -> TaskState {
        self.cell.state()
    }

    /// Token handed to the operation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns a cloneable reference for observing and cancelling the
    /// task once it is owned elsewhere.
    pub fn handle(&self) -> TaskRef {
        TaskRef {
            cell: self.cell.clone(),
            token: self.token.clone(),
        }
    }

    /// Requests cancellation.
    ///
    /// A pending task becomes `Cancelled` without ever running. A running
    /// one becomes `Cancelled`, its hook runs and its operation is
    /// dropped at the next suspension point.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadySettled`] if the task is terminal.
    pub fn request_cancel(&self) -> Result<(), Error> {
        request_cancel(&self.cell, &self.token)
    }

    /// Starts the operation and returns a future of its [`Outcome`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if the task already started, and
    /// [`Error::AlreadySettled`] if it is terminal.
    pub fn start(&mut self) -> Result<TaskFuture<T, E>, Error> {
        self.cell.begin()?;

        let Some(operation) = self.operation.take() else {
            return Err(Error::InvalidState {
                id: self.cell.id,
                state: self.cell.state(),
            });
        };

        tracing::debug!(task_id = %self.cell.id, deadline = ?self.deadline, "task started");

        Ok(TaskFuture {
            task: self.handle(),
            future: Some(operation.start(self.token.clone())),
            deadline: self.deadline.map(|after| (sleep(after), after)),
            _links: std::mem::take(&mut self.links),
        })
    }

    /// Outcome of a task that settled without running to completion.
    pub(crate) fn settled_outcome(&self) -> Option<Outcome<T, E>> {
        self.cell.forced_outcome()
    }

    /// Wakes `waker` when the task is cancelled or expires before it starts.
    /// Replaced by the task's own waker once it runs.
    pub(crate) fn wake_on_settle(&self, waker: &Waker) {
        self.cell.register(waker);
    }

    /// Cancels the task when `token` is cancelled.
    pub(crate) fn link(&mut self, token: &CancellationToken) {
        let own = self.token.clone();
        self.links.push(token.subscribe(move || own.cancel()));
    }
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.cell.id)
            .field("state", &self.cell.state())
            .field("deadline", &self.deadline)
            .finish()
    }
}

fn request_cancel(cell: &TaskCell, token: &CancellationToken) -> Result<(), Error> {
    let state = cell.state();

    if state.is_terminal() {
        return Err(Error::AlreadySettled { id: cell.id, state });
    }

    token.cancel();
    Ok(())
}

/// Shared reference to a [`Task`].
#[derive(Clone)]
pub struct TaskRef {
    cell: Arc<TaskCell>,
    token: CancellationToken,
}

impl TaskRef {
    pub fn id(&self) -> TaskId {
        self.cell.id
    }

    pub fn state(&self) -> TaskState {
        self.cell.state()
    }

    /// See [`Task::request_cancel`].
    pub fn request_cancel(&self) -> Result<(), Error> {
        request_cancel(&self.cell, &self.token)
    }

    /// Rejects the task with a timeout and cancels its token.
    ///
    /// Returns `false` if the task had already settled.
    pub(crate) fn expire(&self, after: Duration) -> bool {
        if !self.cell.expire(after) {
            return false;
        }

        self.token.cancel();
        true
    }
}

impl fmt::Debug for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRef")
            .field("id", &self.cell.id)
            .field("state", &self.cell.state())
            .finish()
    }
}

/// Future returned by [`Task::start`].
///
/// Resolves to the task's [`Outcome`]. When the task is cancelled or its
/// deadline fires, it resolves right away and drops the operation.
pub struct TaskFuture<T, E> {
    task: TaskRef,
    future: Option<OperationFuture<T, E>>,
    deadline: Option<(Sleep, Duration)>,
    _links: Vec<Subscription>,
}

impl<T, E> TaskFuture<T, E> {
    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    /// Outcome forced on the task from outside, if any.
    fn forced(&mut self) -> Option<Outcome<T, E>> {
        let outcome = self.task.cell.forced_outcome()?;

        self.future = None;
        self.deadline = None;

        Some(outcome)
    }
}

impl<T, E> Future for TaskFuture<T, E> {
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(outcome) = this.forced() {
            return Poll::Ready(outcome);
        }

        // Registering before re-checking means a cancellation landing in
        // between still wakes us.
        this.task.cell.register(cx.waker());

        if let Some(outcome) = this.forced() {
            return Poll::Ready(outcome);
        }

        if let Some(future) = this.future.as_mut() {
            let poll = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(cx)));

            match poll {
                Ok(Poll::Ready(result)) => {
                    this.future = None;
                    this.deadline = None;

                    let outcome = Outcome::from(result);
                    let state = if outcome.is_fulfilled() {
                        TaskState::Fulfilled
                    } else {
                        TaskState::Rejected
                    };

                    if this.task.cell.complete(state) {
                        tracing::debug!(task_id = %this.task.id(), %state, "task settled");
                        return Poll::Ready(outcome);
                    }

                    // Lost the race against cancellation or a deadline.
                    return Poll::Ready(this.forced().unwrap_or(Outcome::Cancelled));
                }
                Ok(Poll::Pending) => {}
                Err(_) => {
                    tracing::error!(task_id = %this.task.id(), "task operation panicked; cancelling it");
                    this.task.cell.cancel();
                    return Poll::Ready(this.forced().unwrap_or(Outcome::Cancelled));
                }
            }
        }

        if let Some((sleep, after)) = this.deadline.as_mut() {
            if Pin::new(sleep).poll(cx).is_ready() {
                let after = *after;

                if this.task.expire(after) {
                    tracing::warn!(task_id = %this.task.id(), ?after, "task deadline elapsed");
                }

                return Poll::Ready(this.forced().unwrap_or(Outcome::Cancelled));
            }
        }

        Poll::Pending
    }
}
