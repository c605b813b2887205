use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::QueueItem;

/// Heap slot ordering items by [`QueueItem::is_higher_priority`].
///
/// `BinaryHeap` is a max-heap, so a higher-priority item compares `Greater`. Items that are
/// neither higher nor lower than each other compare `Equal`; their relative pop order is
/// unspecified.
struct Ranked<T>(T);

impl<T: QueueItem> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: QueueItem> Eq for Ranked<T> {}

impl<T: QueueItem> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: QueueItem> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0.is_higher_priority(&other.0) {
            Ordering::Greater
        } else if other.0.is_higher_priority(&self.0) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

/// Binary-heap backed store. Push and pop are O(log n); peek and len are O(1).
///
/// Not synchronized; [`Queue`](crate::Queue) keeps it behind its gate.
pub struct OrderingStore<T> {
    heap: BinaryHeap<Ranked<T>>,
}

impl<T: QueueItem> OrderingStore<T> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }

    pub fn push(&mut self, item: T) {
        self.heap.push(Ranked(item));
    }

    /// Removes the highest-priority item. `None` means the store is empty.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|r| r.0)
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|r| &r.0)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T: QueueItem> Default for OrderingStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
