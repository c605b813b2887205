use std::hash::Hash;

/// Anything that can sit in a [`Queue`](crate::Queue).
///
/// An item supplies a strict priority predicate and a stable identity. The identity is the
/// deduplication key kept in the queue history, so it must not change while the item is
/// queued.
pub trait QueueItem {
    type Id: Eq + Hash + Clone;

    /// True when `self` must leave the queue strictly before `other`.
    fn is_higher_priority(&self, other: &Self) -> bool;

    fn identity(&self) -> Self::Id;
}
