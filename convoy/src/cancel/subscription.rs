use super::token::Inner;

use std::sync::Weak;

/// A callback registered on a [`CancellationToken`](super::CancellationToken).
pub(super) type Callback = Box<dyn FnOnce() + Send>;

/// Registration of a cancellation callback.
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) removes
/// the callback if it has not run yet.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    /// Token the callback lives on; `None` when the callback already ran
    /// at subscription time.
    token: Option<Weak<Inner>>,
    key: usize,
}

impl Subscription {
    pub(super) fn new(token: Weak<Inner>, key: usize) -> Self {
        Self {
            token: Some(token),
            key,
        }
    }

    pub(super) fn detached() -> Self {
        Self { token: None, key: 0 }
    }

    /// Removes the callback without running it.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.token.take().and_then(|weak| weak.upgrade()) else {
            return;
        };

        // A cancelled token already drained its subscribers and never
        // hands out keys again, so a stale key cannot hit a new callback.
        inner.subscribers.lock().try_remove(self.key);
    }
}
