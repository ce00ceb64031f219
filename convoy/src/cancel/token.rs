use super::subscription::{Callback, Subscription};
use crate::utils::Slab;

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

/// A shared, one-shot cancellation signal.
///
/// Every clone observes the same flag. [`cancel`](Self::cancel) flips it
/// once and runs every subscribed callback exactly once; later calls are
/// no-ops. A single token fans out to any number of tasks.
///
/// Cancellation is cooperative: a token only *requests* termination.
/// Work stops when it observes the token, either by polling
/// [`is_cancelled`](Self::is_cancelled), awaiting
/// [`cancelled`](Self::cancelled) or through a subscribed callback.
///
/// # Examples
///
/// ```rust,ignore
/// let token = CancellationToken::new();
/// let child = token.child_token();
///
/// token.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    pub(super) inner: Arc<Inner>,
}

pub(super) struct Inner {
    cancelled: AtomicBool,

    /// Callbacks run on cancellation.
    pub(super) subscribers: Mutex<Slab<Callback>>,

    /// Tasks awaiting [`CancellationToken::cancelled`].
    waiters: Mutex<Slab<Waker>>,

    /// Link to the parent token, for child tokens. Dropping it detaches
    /// the child.
    parent: Mutex<Option<Subscription>>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                subscribers: Mutex::new(Slab::new()),
                waiters: Mutex::new(Slab::new()),
                parent: Mutex::new(None),
            }),
        }
    }

    /// Creates a token cancelled together with `self`.
    ///
    /// Cancelling the child leaves the parent and its other children
    /// untouched.
    pub fn child_token(&self) -> CancellationToken {
        let child = CancellationToken::new();
        let weak = Arc::downgrade(&child.inner);

        let link = self.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                CancellationToken { inner }.cancel();
            }
        });

        *child.inner.parent.lock() = Some(link);
        child
    }

    /// Requests cancellation.
    ///
    /// The first call runs every subscriber and wakes every task awaiting
    /// [`cancelled`](Self::cancelled). Subsequent calls do nothing.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        // Run callbacks outside the lock: they may subscribe, unsubscribe
        // or cancel other tokens.
        let callbacks: Vec<Callback> = self.inner.subscribers.lock().drain().collect();

        tracing::trace!(subscribers = callbacks.len(), "cancellation token cancelled");

        for callback in callbacks {
            callback();
        }

        let waiters: Vec<Waker> = self.inner.waiters.lock().drain().collect();

        for waker in waiters {
            waker.wake();
        }

        // The parent can no longer affect this token.
        self.inner.parent.lock().take();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on
    /// this token or one of its ancestors.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Registers `callback` to run when the token is cancelled.
    ///
    /// The callback runs at most once. If the token is already cancelled
    /// it runs immediately, on the calling thread. Dropping the returned
    /// [`Subscription`] unregisters it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnOnce() + Send + 'static,
    {
        let mut subscribers = self.inner.subscribers.lock();

        if self.is_cancelled() {
            drop(subscribers);
            callback();

            return Subscription::detached();
        }

        let key = subscribers.insert(Box::new(callback));
        Subscription::new(Arc::downgrade(&self.inner), key)
    }

    /// Returns a future that resolves once the token is cancelled.
    ///
    /// Operations race this against their own work to stop early.
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            token: self.clone(),
            key: None,
        }
    }

    /// Returns `true` if both handles refer to the same token.
    pub fn same_token(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}

/// Future returned by [`CancellationToken::cancelled`].
pub struct Cancelled {
    token: CancellationToken,

    /// Key of our waker in the token's waiter slab.
    key: Option<usize>,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.token.is_cancelled() {
            return Poll::Ready(());
        }

        {
            let mut waiters = this.token.inner.waiters.lock();

            match this.key.and_then(|key| waiters.get_mut(key)) {
                Some(waker) if waker.will_wake(cx.waker()) => {}
                Some(waker) => *waker = cx.waker().clone(),
                None => this.key = Some(waiters.insert(cx.waker().clone())),
            }
        }

        // `cancel` sets the flag before draining waiters, so re-checking
        // after registration cannot miss it.
        if this.token.is_cancelled() {
            return Poll::Ready(());
        }

        Poll::Pending
    }
}

impl Drop for Cancelled {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            if !self.token.is_cancelled() {
                self.token.inner.waiters.lock().try_remove(key);
            }
        }
    }
}
