//! Internal data structures.
//!
//! [`Slab`] stores cancellation subscribers under small reusable keys.

mod slab;

pub(crate) use slab::Slab;
