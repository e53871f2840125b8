//! Structural reconciliation of immutable snapshots
//!
//! When a fresh snapshot is parsed from the CRDT, every subtree equal to the
//! previous snapshot's keeps the previous shared allocation. Observers that
//! compare `Arc`s with [`Arc::ptr_eq`] then skip work for unrelated edits.

use serde_json::Value;
use std::sync::Arc;

/// Merge a freshly parsed value into the previous snapshot
pub trait Reconcile: Sized {
    /// Return `next`, reusing the allocations of `prev` for equal subtrees
    fn reconcile(prev: &Self, next: Self) -> Self;
}

/// Keep `prev` when equal to `next`, else take `next` as is
#[must_use]
pub fn reuse_arc<T: PartialEq>(prev: &Arc<T>, next: Arc<T>) -> Arc<T> {
    if Arc::ptr_eq(prev, &next) || **prev == *next {
        Arc::clone(prev)
    } else {
        next
    }
}

/// Keep `prev` when equal to `next`, else reconcile the contents
#[must_use]
pub fn reconcile_arc<T>(prev: &Arc<T>, next: Arc<T>) -> Arc<T>
where
    T: Reconcile + PartialEq + Clone,
{
    if Arc::ptr_eq(prev, &next) || **prev == *next {
        return Arc::clone(prev);
    }
    let next = Arc::try_unwrap(next).unwrap_or_else(|shared| (*shared).clone());
    Arc::new(T::reconcile(prev, next))
}

impl Reconcile for Value {
    fn reconcile(_prev: &Self, next: Self) -> Self {
        next
    }
}
