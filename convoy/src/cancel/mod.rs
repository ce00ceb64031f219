//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is a shared one-shot flag with a set of
//! subscribed callbacks. One token can stop any number of tasks; child
//! tokens narrow cancellation to a subtree.

mod subscription;
mod token;

pub use subscription::Subscription;
pub use token::{CancellationToken, Cancelled};
