use std::collections::HashSet;
use std::hash::Hash;

/// Identities accepted by the queue so far.
///
/// Membership is independent of what is currently queued: an identity stays here after its
/// item is dequeued, until it is removed or the whole history is cleared.
#[derive(Debug)]
pub struct History<K> {
    seen: HashSet<K>,
}

impl<K: Eq + Hash> History<K> {
    pub fn new() -> Self {
        Self { seen: HashSet::new() }
    }

    pub fn record(&mut self, id: K) {
        self.seen.insert(id);
    }

    pub fn contains(&self, id: &K) -> bool {
        self.seen.contains(id)
    }

    /// No-op when `id` is absent.
    pub fn remove(&mut self, id: &K) -> bool {
        self.seen.remove(id)
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<K: Eq + Hash> Default for History<K> {
    fn default() -> Self {
        Self::new()
    }
}
