use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::task::Waker;
use std::time::Instant;

/// State shared between a `Sleep` future and its reactor entry.
pub(crate) struct TimerShared {
    /// Set when the sleep completes or is dropped; the reactor then
    /// discards the entry without waking.
    cancelled: AtomicBool,

    /// Waker of the task that last polled the sleep.
    waker: Mutex<Option<Waker>>,
}

impl TimerShared {
    pub(crate) fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            waker: Mutex::new(None),
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Release);
        self.waker.lock().take();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Acquire)
    }

    /// Stores the waker to notify, replacing a stale one.
    pub(crate) fn register(&self, waker: &Waker) {
        let mut slot = self.waker.lock();

        match slot.as_ref() {
            Some(current) if current.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    /// Fires the timer.
    pub(crate) fn fire(&self) {
        if self.is_cancelled() {
            return;
        }

        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }
    }
}

/// An entry in the reactor's timer heap.
pub(crate) struct TimerEntry {
    pub(crate) deadline: Instant,
    pub(crate) timer: Arc<TimerShared>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so a `BinaryHeap<TimerEntry>` pops the earliest deadline
    /// first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;
    use std::time::Duration;

    #[test]
    fn heap_pops_earliest_deadline_first() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();

        for ms in [30, 10, 20] {
            heap.push(TimerEntry {
                deadline: now + Duration::from_millis(ms),
                timer: Arc::new(TimerShared::new()),
            });
        }

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|entry| entry.deadline - now)
            .collect();

        assert_eq!(
            order,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30)
            ]
        );
    }

    #[test]
    fn cancelled_timer_does_not_fire() {
        use std::sync::atomic::AtomicUsize;
        use std::task::Wake;

        struct Counter(AtomicUsize);

        impl Wake for Counter {
            fn wake(self: Arc<Self>) {
                self.0.fetch_add(1, AtomicOrdering::SeqCst);
            }
        }

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());

        let timer = TimerShared::new();
        timer.register(&waker);
        timer.cancel();
        timer.fire();

        assert_eq!(counter.0.load(AtomicOrdering::SeqCst), 0);

        let timer = TimerShared::new();
        timer.register(&waker);
        timer.fire();

        assert_eq!(counter.0.load(AtomicOrdering::SeqCst), 1);
    }
}
