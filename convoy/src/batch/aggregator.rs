use super::outcome::{AggregateFailure, Outcome};
use super::task::TaskId;
use crate::error::Error;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::task::{Context, Poll, Waker};

/// Outcomes of a batch, index-aligned with submission order.
///
/// Outcomes are recorded by the scheduler driver and moved out by the
/// single consumer of the [`BatchHandle`](super::BatchHandle).
pub(crate) struct Aggregator<T, E> {
    ledger: Mutex<Ledger<T, E>>,
}

struct Ledger<T, E> {
    /// Submission index of every task in the batch.
    index: HashMap<TaskId, usize>,

    /// Slot per task; emptied when the consumer takes the outcome.
    outcomes: Vec<Option<Outcome<T, E>>>,

    recorded: Vec<bool>,

    /// Submission indices in the order outcomes were recorded.
    completion: Vec<usize>,

    /// Consumers waiting for the next record.
    waiters: Vec<Waker>,
}

impl<T, E> Ledger<T, E> {
    fn is_complete(&self) -> bool {
        self.completion.len() == self.outcomes.len()
    }

    fn park(&mut self, waker: &Waker) {
        if !self.waiters.iter().any(|w| w.will_wake(waker)) {
            self.waiters.push(waker.clone());
        }
    }
}

impl<T, E> Aggregator<T, E> {
    pub(crate) fn new(ids: impl IntoIterator<Item = TaskId>) -> Self {
        let index: HashMap<TaskId, usize> = ids
            .into_iter()
            .enumerate()
            .map(|(position, id)| (id, position))
            .collect();

        let len = index.len();

        Self {
            ledger: Mutex::new(Ledger {
                index,
                outcomes: (0..len).map(|_| None).collect(),
                recorded: vec![false; len],
                completion: Vec::with_capacity(len),
                waiters: Vec::new(),
            }),
        }
    }

    /// Stores the outcome of `id` and wakes the consumer.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownTask`] if `id` is not in the batch and
    /// [`Error::DuplicateRecord`] if it was already recorded.
    pub(crate) fn record(&self, id: TaskId, outcome: Outcome<T, E>) -> Result<(), Error> {
        let waiters = {
            let mut ledger = self.ledger.lock();

            let position = *ledger.index.get(&id).ok_or(Error::UnknownTask { id })?;

            if ledger.recorded[position] {
                return Err(Error::DuplicateRecord { id });
            }

            ledger.recorded[position] = true;
            ledger.outcomes[position] = Some(outcome);
            ledger.completion.push(position);

            std::mem::take(&mut ledger.waiters)
        };

        for waker in waiters {
            waker.wake();
        }

        Ok(())
    }

    /// Number of recorded outcomes.
    pub(crate) fn settled(&self) -> usize {
        self.ledger.lock().completion.len()
    }

    /// Ready with every outcome, in submission order, once all are
    /// recorded.
    pub(crate) fn poll_all_settled(&self, cx: &mut Context<'_>) -> Poll<Vec<Outcome<T, E>>> {
        let mut ledger = self.ledger.lock();

        if !ledger.is_complete() {
            ledger.park(cx.waker());
            return Poll::Pending;
        }

        Poll::Ready(ledger.outcomes.iter_mut().filter_map(Option::take).collect())
    }

    /// Ready with the first fulfilled value in completion order, or with
    /// every failure once all tasks settled without one.
    pub(crate) fn poll_first_fulfilled(
        &self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<T, AggregateFailure<E>>> {
        let mut ledger = self.ledger.lock();
        let ledger = &mut *ledger;

        let fulfilled = ledger
            .completion
            .iter()
            .copied()
            .find(|&position| matches!(ledger.outcomes[position], Some(Outcome::Fulfilled(_))));

        if let Some(position) = fulfilled {
            if let Some(Outcome::Fulfilled(value)) = ledger.outcomes[position].take() {
                return Poll::Ready(Ok(value));
            }
        }

        if !ledger.is_complete() {
            ledger.park(cx.waker());
            return Poll::Pending;
        }

        let reasons = ledger
            .outcomes
            .iter_mut()
            .filter_map(Option::take)
            .filter_map(|outcome| outcome.into_result().err())
            .collect();

        Poll::Ready(Err(AggregateFailure::new(reasons)))
    }

    /// Ready with the first recorded outcome. Never ready for an empty
    /// batch.
    pub(crate) fn poll_first_settled(&self, cx: &mut Context<'_>) -> Poll<Outcome<T, E>> {
        let mut ledger = self.ledger.lock();

        if let Some(&position) = ledger.completion.first() {
            if let Some(outcome) = ledger.outcomes[position].take() {
                return Poll::Ready(outcome);
            }
        }

        ledger.park(cx.waker());
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::outcome::Rejection;
    use crate::batch::task::Task;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ids(n: usize) -> Vec<TaskId> {
        (0..n)
            .map(|_| Task::<(), ()>::new(|_| async { Ok(()) }).id())
            .collect()
    }

    fn rejected(reason: &'static str) -> Outcome<&'static str, &'static str> {
        Outcome::Rejected(Rejection::Error(reason))
    }

    #[test]
    fn all_settled_keeps_submission_order() {
        let ids = ids(3);
        let aggregator = Aggregator::new(ids.clone());

        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);

        aggregator.record(ids[1], Outcome::Fulfilled("b")).unwrap();
        aggregator.record(ids[2], rejected("c")).unwrap();
        assert!(aggregator.poll_all_settled(&mut cx).is_pending());

        aggregator.record(ids[0], Outcome::Cancelled).unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        match aggregator.poll_all_settled(&mut cx) {
            Poll::Ready(outcomes) => assert_eq!(
                outcomes,
                vec![Outcome::Cancelled, Outcome::Fulfilled("b"), rejected("c")]
            ),
            Poll::Pending => panic!("batch should be settled"),
        }
    }

    #[test]
    fn records_are_checked() {
        let ids = ids(2);
        let aggregator: Aggregator<u8, u8> = Aggregator::new(ids[..1].to_vec());

        aggregator.record(ids[0], Outcome::Cancelled).unwrap();

        assert_eq!(
            aggregator.record(ids[0], Outcome::Fulfilled(1)),
            Err(Error::DuplicateRecord { id: ids[0] })
        );
        assert_eq!(
            aggregator.record(ids[1], Outcome::Fulfilled(1)),
            Err(Error::UnknownTask { id: ids[1] })
        );
        assert_eq!(aggregator.settled(), 1);
    }

    #[test]
    fn first_fulfilled_skips_failures() {
        let ids = ids(3);
        let aggregator = Aggregator::new(ids.clone());
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);

        aggregator.record(ids[0], rejected("a")).unwrap();
        assert!(aggregator.poll_first_fulfilled(&mut cx).is_pending());

        aggregator.record(ids[2], Outcome::Fulfilled("c")).unwrap();
        assert_eq!(aggregator.poll_first_fulfilled(&mut cx), Poll::Ready(Ok("c")));
    }

    #[test]
    fn first_fulfilled_aggregates_every_failure_in_order() {
        let ids = ids(2);
        let aggregator = Aggregator::new(ids.clone());
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);

        aggregator.record(ids[1], rejected("b")).unwrap();
        aggregator.record(ids[0], rejected("a")).unwrap();

        let Poll::Ready(Err(failure)) = aggregator.poll_first_fulfilled(&mut cx) else {
            panic!("expected an aggregate failure");
        };

        assert_eq!(failure.errors().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn empty_batch() {
        let aggregator: Aggregator<u8, u8> = Aggregator::new(Vec::new());
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);

        assert_eq!(aggregator.poll_all_settled(&mut cx), Poll::Ready(Vec::new()));
        assert!(matches!(
            aggregator.poll_first_fulfilled(&mut cx),
            Poll::Ready(Err(failure)) if failure.is_empty()
        ));
        assert!(aggregator.poll_first_settled(&mut cx).is_pending());
    }

    #[test]
    fn first_settled_follows_completion_order() {
        let ids = ids(2);
        let aggregator = Aggregator::new(ids.clone());
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);

        aggregator.record(ids[1], rejected("late")).unwrap();
        aggregator.record(ids[0], Outcome::Fulfilled("early")).unwrap();

        assert_eq!(aggregator.poll_first_settled(&mut cx), Poll::Ready(rejected("late")));
    }
}
