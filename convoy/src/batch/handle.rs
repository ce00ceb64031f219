use super::aggregator::Aggregator;
use super::outcome::{AggregateFailure, Outcome};
use super::task::TaskRef;
use crate::cancel::CancellationToken;

use std::future::poll_fn;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// State shared by a batch's driver and its handle.
pub(crate) struct Batch<T, E> {
    pub(crate) aggregator: Aggregator<T, E>,
    total: usize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
    backlog: AtomicUsize,
}

impl<T, E> Batch<T, E> {
    pub(crate) fn new(aggregator: Aggregator<T, E>, total: usize) -> Self {
        Self {
            aggregator,
            total,
            running: AtomicUsize::new(0),
            peak_running: AtomicUsize::new(0),
            backlog: AtomicUsize::new(total),
        }
    }

    /// A task left the backlog.
    pub(crate) fn dequeued(&self) {
        self.backlog.fetch_sub(1, Ordering::AcqRel);
    }

    /// A task entered the running set.
    pub(crate) fn started(&self) {
        let running = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_running.fetch_max(running, Ordering::AcqRel);
    }

    /// A task left the running set.
    pub(crate) fn finished(&self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Snapshot of a batch's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Number of submitted tasks.
    pub total: usize,

    /// Tasks with a recorded outcome.
    pub settled: usize,

    /// Tasks currently in the running set.
    pub running: usize,

    /// Tasks not yet admitted.
    pub backlog: usize,

    /// Largest running set observed so far. Never above the concurrency
    /// limit.
    pub peak_running: usize,
}

/// Handle to a submitted batch.
///
/// Exactly one of [`all_settled`](Self::all_settled),
/// [`first_fulfilled`](Self::first_fulfilled) or
/// [`first_settled`](Self::first_settled) consumes the handle and moves
/// the outcomes out.
///
/// Dropping the handle does **not** cancel the batch; its tasks keep
/// running to completion. Use [`cancel`](Self::cancel) to stop them.
pub struct BatchHandle<T, E> {
    batch: Arc<Batch<T, E>>,
    token: CancellationToken,
    tasks: Vec<TaskRef>,
}

impl<T, E> BatchHandle<T, E> {
    pub(crate) fn new(batch: Arc<Batch<T, E>>, token: CancellationToken, tasks: Vec<TaskRef>) -> Self {
        Self {
            batch,
            token,
            tasks,
        }
    }

    /// Waits for every task to settle and returns their outcomes in
    /// submission order, regardless of completion order.
    pub async fn all_settled(self) -> Vec<Outcome<T, E>> {
        poll_fn(|cx| self.batch.aggregator.poll_all_settled(cx)).await
    }

    /// Resolves with the first fulfilled value. Outcomes recorded after
    /// it are ignored.
    ///
    /// # Errors
    ///
    /// If no task fulfills, returns an [`AggregateFailure`] carrying every
    /// failure reason in submission order. An empty batch fails at once.
    pub async fn first_fulfilled(self) -> Result<T, AggregateFailure<E>> {
        poll_fn(|cx| self.batch.aggregator.poll_first_fulfilled(cx)).await
    }

    /// Resolves with the first outcome of any kind.
    ///
    /// An empty batch **never** resolves; pair this with
    /// [`time::timeout`](crate::time::timeout) when the batch may be
    /// empty.
    pub async fn first_settled(self) -> Outcome<T, E> {
        poll_fn(|cx| self.batch.aggregator.poll_first_settled(cx)).await
    }

    /// Cancels every task of the batch that has not settled yet.
    ///
    /// Settled tasks keep their outcome. Calling it again does nothing.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token every task of the batch is registered against.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Tasks of the batch, in submission order.
    pub fn tasks(&self) -> &[TaskRef] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.batch.total
    }

    pub fn is_empty(&self) -> bool {
        self.batch.total == 0
    }

    pub fn progress(&self) -> Progress {
        Progress {
            total: self.batch.total,
            settled: self.batch.aggregator.settled(),
            running: self.batch.running.load(Ordering::Acquire),
            backlog: self.batch.backlog.load(Ordering::Acquire),
            peak_running: self.batch.peak_running.load(Ordering::Acquire),
        }
    }
}
