use super::aggregator::Aggregator;
use super::deadline::expire_batch;
use super::handle::{Batch, BatchHandle};
use super::outcome::Outcome;
use super::task::{Task, TaskId, TaskState};
use crate::cancel::CancellationToken;
use crate::error::Error;
use crate::runtime::context;
use crate::task::{JoinHandle, spawn};

use std::collections::VecDeque;
use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Poll, Waker};
use std::time::Duration;

/// Configures and submits batches.
///
/// # Examples
///
/// ```rust,ignore
/// let shutdown = CancellationToken::new();
///
/// let batch = Scheduler::new()
///     .cancel_with(&shutdown)
///     .batch_deadline(Duration::from_secs(5))
///     .submit(tasks, 4)?;
///
/// let outcomes = batch.all_settled().await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    token: Option<CancellationToken>,
    batch_deadline: Option<Duration>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every batch against `token`: cancelling it cancels the
    /// batch. Cancelling the batch leaves `token` alone.
    pub fn cancel_with(mut self, token: &CancellationToken) -> Self {
        self.token = Some(token.clone());
        self
    }

    /// Rejects every task still unsettled `duration` after submission
    /// with a timeout, running or not.
    pub fn batch_deadline(mut self, duration: Duration) -> Self {
        self.batch_deadline = Some(duration);
        self
    }

    /// Submits `tasks` to run with at most `limit` of them in flight.
    ///
    /// Tasks are admitted in submission order. Each time a running task
    /// settles, the earliest task still in the backlog starts. Returns
    /// once every task is accepted, not when they complete.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `limit` is zero.
    /// - [`Error::OutsideRuntime`] if called outside a runtime.
    /// - [`Error::InvalidState`] if a task is running.
    /// - [`Error::AlreadySettled`] if a task already ran to completion.
    ///
    /// A task cancelled or expired before submission is accepted and
    /// reported with that outcome.
    ///
    /// Nothing is scheduled when an error is returned.
    pub fn submit<T, E, I>(&self, tasks: I, limit: usize) -> Result<BatchHandle<T, E>, Error>
    where
        T: Send + 'static,
        E: Send + 'static,
        I: IntoIterator<Item = Task<T, E>>,
    {
        if limit == 0 {
            return Err(Error::InvalidArgument("concurrency limit must be at least 1"));
        }

        if !context::is_inside_runtime() {
            return Err(Error::OutsideRuntime);
        }

        let mut tasks: VecDeque<Task<T, E>> = tasks.into_iter().collect();

        for task in tasks.iter() {
            match task.state() {
                TaskState::Pending => {}
                TaskState::Running => {
                    return Err(Error::InvalidState {
                        id: task.id(),
                        state: TaskState::Running,
                    });
                }
                // Cancelled or expired before submission keeps that outcome.
                _ if task.settled_outcome().is_some() => {}
                state => return Err(Error::AlreadySettled { id: task.id(), state }),
            }
        }

        let token = match &self.token {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        for task in tasks.iter_mut() {
            task.link(&token);
        }

        let refs: Vec<_> = tasks.iter().map(Task::handle).collect();
        let aggregator = Aggregator::new(tasks.iter().map(Task::id));
        let batch = Arc::new(Batch::new(aggregator, tasks.len()));

        tracing::debug!(tasks = tasks.len(), limit, deadline = ?self.batch_deadline, "batch submitted");

        let timer = self
            .batch_deadline
            .map(|after| spawn(expire_batch(refs.clone(), after)));

        spawn(Driver::new(batch.clone(), token.clone(), tasks, limit).run(timer));

        Ok(BatchHandle::new(batch, token, refs))
    }
}

/// Submits `tasks` with the default [`Scheduler`].
///
/// # Examples
///
/// ```rust,ignore
/// let batch = convoy::submit(tasks, 2)?;
/// let first = batch.first_fulfilled().await?;
/// ```
pub fn submit<T, E, I>(tasks: I, limit: usize) -> Result<BatchHandle<T, E>, Error>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Task<T, E>>,
{
    Scheduler::new().submit(tasks, limit)
}

type Running<T, E> = JoinHandle<(TaskId, Outcome<T, E>)>;

/// Owns a batch's running set and backlog.
///
/// All admissions and completions happen on this one future, so two
/// completions can never pop the same backlog slot.
struct Driver<T, E> {
    batch: Arc<Batch<T, E>>,
    token: CancellationToken,
    backlog: VecDeque<Task<T, E>>,
    running: Vec<Running<T, E>>,
    limit: usize,
}

impl<T, E> Driver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn new(
        batch: Arc<Batch<T, E>>,
        token: CancellationToken,
        backlog: VecDeque<Task<T, E>>,
        limit: usize,
    ) -> Self {
        Self {
            batch,
            token,
            backlog,
            running: Vec::with_capacity(limit),
            limit,
        }
    }

    async fn run(mut self, timer: Option<JoinHandle<()>>) {
        loop {
            self.admit();

            let Some((id, outcome)) = self.next_settled().await else {
                break;
            };

            self.batch.finished();
            self.record(id, outcome);
        }

        if let Some(timer) = timer {
            timer.abort();
        }

        tracing::debug!(tasks = self.batch.aggregator.settled(), "batch settled");
    }

    /// Starts backlog tasks until the running set is full or the backlog
    /// is empty.
    fn admit(&mut self) {
        while self.running.len() < self.limit {
            let Some(mut task) = self.backlog.pop_front() else {
                return;
            };

            self.batch.dequeued();

            // The batch token may still be notifying its tasks; nothing is
            // admitted once it is cancelled.
            if self.token.is_cancelled() {
                let _ = task.request_cancel();
            }

            // Cancelled or expired while waiting; it never takes a slot.
            if let Some(outcome) = task.settled_outcome() {
                tracing::trace!(task_id = %task.id(), "skipping settled backlog task");
                self.record(task.id(), outcome);
                continue;
            }

            match task.start() {
                Ok(future) => {
                    let id = task.id();

                    tracing::trace!(task_id = %id, running = self.running.len() + 1, "task admitted");

                    self.batch.started();
                    self.running.push(spawn(async move { (id, future.await) }));
                }
                // Submission only accepts pending tasks, so a failed start
                // means a cancel or deadline won the race.
                Err(err) => match task.settled_outcome() {
                    Some(outcome) => self.record(task.id(), outcome),
                    None => tracing::error!(%err, "failed to start task"),
                },
            }
        }
    }

    /// Waits for the next running task to settle, recording backlog tasks
    /// that settle in the meantime. `None` once the running set is empty.
    async fn next_settled(&mut self) -> Option<(TaskId, Outcome<T, E>)> {
        if self.running.is_empty() {
            return None;
        }

        poll_fn(|cx| {
            self.sweep_backlog(cx.waker());

            for i in 0..self.running.len() {
                if let Poll::Ready(settled) = Pin::new(&mut self.running[i]).poll(cx) {
                    self.running.swap_remove(i);
                    return Poll::Ready(Some(settled));
                }
            }

            Poll::Pending
        })
        .await
    }

    /// Records backlog tasks that were cancelled or expired while waiting
    /// and has the rest wake the driver when they are.
    fn sweep_backlog(&mut self, waker: &Waker) {
        let mut settled = Vec::new();

        self.backlog.retain(|task| {
            // Registered before the check so a concurrent cancel still wakes us.
            task.wake_on_settle(waker);

            match task.settled_outcome() {
                Some(outcome) => {
                    settled.push((task.id(), outcome));
                    false
                }
                None => true,
            }
        });

        for (id, outcome) in settled {
            tracing::trace!(task_id = %id, "backlog task settled while waiting");

            self.batch.dequeued();
            self.record(id, outcome);
        }
    }

    fn record(&self, id: TaskId, outcome: Outcome<T, E>) {
        if let Err(err) = self.batch.aggregator.record(id, outcome) {
            tracing::error!(%err, "failed to record task outcome");
        }
    }
}
