use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::{DequeueError, History, OrderingStore, QueueConfig, QueueError, QueueItem, QueueStats, Rejected};

/// Thread-safe priority queue with an optional capacity limit and an identity history.
///
/// Share it between threads through an `Arc`:
///
/// ```
/// use std::sync::Arc;
/// use pqueue::{Queue, QueueItem};
///
/// struct Job { id: u32, priority: u8 }
///
/// impl QueueItem for Job {
///     type Id = u32;
///     fn is_higher_priority(&self, other: &Self) -> bool { self.priority < other.priority }
///     fn identity(&self) -> u32 { self.id }
/// }
///
/// let q: Arc<Queue<Job>> = Arc::new(Queue::unbounded());
/// let consumer = {
///     let q = Arc::clone(&q);
///     std::thread::spawn(move || q.dequeue().id)
/// };
/// q.enqueue(Job { id: 1, priority: 3 }).unwrap();
/// assert_eq!(consumer.join().unwrap(), 1);
/// ```
///
/// Every operation runs under one lock, so heap, history and limit changes are never observed
/// half-done. Each accepted insert wakes exactly one waiting consumer; which one is
/// unspecified. Items with equal priority leave in unspecified order.
pub struct Queue<T: QueueItem> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

struct Inner<T: QueueItem> {
    limit: usize,
    items: OrderingStore<T>,
    history: History<T::Id>,
    closed: bool,
}

impl<T: QueueItem> Inner<T> {
    fn at_capacity(&self) -> bool {
        self.limit > 0 && self.items.len() >= self.limit
    }
}

impl<T: QueueItem> Queue<T> {
    /// `limit` of 0 means unbounded.
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                limit,
                items: OrderingStore::new(),
                history: History::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub fn from_config(cfg: &QueueConfig) -> Self {
        Self::new(cfg.limit)
    }

    // Poisoning is ignored: a panicking comparator can only leave the heap order unspecified.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Inner<T>>) -> MutexGuard<'a, Inner<T>> {
        self.available.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `item`, recording its identity in the history.
    ///
    /// Fails with [`QueueError::CapacityExceeded`] when the queue is bounded and full, and
    /// with [`QueueError::Closed`] after [`close`](Self::close). A rejected item is handed back
    /// and nothing is mutated.
    pub fn enqueue(&self, item: T) -> Result<(), Rejected<T>> {
        let mut inner = self.lock();
        self.push_locked(&mut inner, item)
    }

    /// Adds `item` only if its identity has never been recorded.
    ///
    /// Returns `Ok(false)` and drops `item` when the identity is already in the history, even
    /// if that item has since been dequeued. Identities recorded by plain
    /// [`enqueue`](Self::enqueue) count too.
    pub fn enqueue_unique(&self, item: T) -> Result<bool, Rejected<T>> {
        let mut inner = self.lock();
        if inner.history.contains(&item.identity()) {
            trace!("duplicate identity; not enqueued");
            return Ok(false);
        }
        self.push_locked(&mut inner, item)?;
        Ok(true)
    }

    fn push_locked(&self, inner: &mut Inner<T>, item: T) -> Result<(), Rejected<T>> {
        if inner.closed {
            debug!("enqueue on closed queue rejected");
            return Err(Rejected { item, reason: QueueError::Closed });
        }
        if inner.at_capacity() {
            debug!(limit = inner.limit, len = inner.items.len(), "queue limit reached");
            return Err(Rejected {
                item,
                reason: QueueError::CapacityExceeded { limit: inner.limit },
            });
        }
        inner.history.record(item.identity());
        inner.items.push(item);
        trace!(len = inner.items.len(), "enqueued");
        self.available.notify_one();
        Ok(())
    }

    /// Removes the highest-priority item, blocking until one is available.
    ///
    /// Never gives up: it keeps waiting even after [`close`](Self::close). Consumers that need
    /// to stop should use [`dequeue_until_closed`](Self::dequeue_until_closed) or
    /// [`dequeue_timeout`](Self::dequeue_timeout).
    pub fn dequeue(&self) -> T {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop() {
                return item;
            }
            inner = self.wait(inner);
        }
    }

    /// Like [`dequeue`](Self::dequeue), but returns `None` once the queue is closed and drained.
    pub fn dequeue_until_closed(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop() {
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            inner = self.wait(inner);
        }
    }

    /// Waits at most `timeout` for an item.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Result<T, DequeueError> {
        // A timeout too large to represent as an Instant is an unbounded wait.
        let deadline = Instant::now().checked_add(timeout);
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop() {
                return Ok(item);
            }
            if inner.closed {
                return Err(DequeueError::Closed);
            }
            inner = match deadline {
                None => self.wait(inner),
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        trace!(?timeout, "dequeue timed out");
                        return Err(DequeueError::Timeout);
                    }
                    let (guard, _) = self
                        .available
                        .wait_timeout(inner, left)
                        .unwrap_or_else(PoisonError::into_inner);
                    guard
                }
            };
        }
    }

    /// Non-blocking pop.
    pub fn try_dequeue(&self) -> Option<T> {
        self.lock().items.pop()
    }

    pub fn identity_exists(&self, id: &T::Id) -> bool {
        self.lock().history.contains(id)
    }

    pub fn item_exists(&self, item: &T) -> bool {
        self.identity_exists(&item.identity())
    }

    /// Forgets every recorded identity. Queued items stay queued.
    pub fn clear_history(&self) {
        let mut inner = self.lock();
        debug!(cleared = inner.history.len(), "history cleared");
        inner.history.clear();
    }

    /// Forgets one identity so [`enqueue_unique`](Self::enqueue_unique) accepts it again.
    pub fn remove_from_history(&self, id: &T::Id) {
        self.lock().history.remove(id);
    }

    /// Replaces the limit; 0 means unbounded. Items already queued are never evicted, so a
    /// lower limit only takes effect once the queue drains below it.
    pub fn change_limit(&self, new_limit: usize) {
        let mut inner = self.lock();
        debug!(old = inner.limit, new = new_limit, len = inner.items.len(), "queue limit changed");
        inner.limit = new_limit;
    }

    /// Rejects further inserts and wakes every waiting consumer.
    ///
    /// Only [`dequeue_until_closed`](Self::dequeue_until_closed) and
    /// [`dequeue_timeout`](Self::dequeue_timeout) callers return on close; threads parked in
    /// [`dequeue`](Self::dequeue) stay parked, since that call never returns without an item.
    /// Queued items can still be dequeued. Calling it again has no effect.
    pub fn close(&self) {
        let mut inner = self.lock();
        if !inner.closed {
            inner.closed = true;
            debug!(len = inner.items.len(), "queue closed");
        }
        drop(inner);
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn limit(&self) -> usize {
        self.lock().limit
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.lock();
        QueueStats {
            len: inner.items.len(),
            limit: inner.limit,
            history_len: inner.history.len(),
            closed: inner.closed,
        }
    }
}

impl<T: QueueItem + Clone> Queue<T> {
    /// Copy of the item the next dequeue would return.
    pub fn peek_cloned(&self) -> Option<T> {
        self.lock().items.peek().cloned()
    }
}

impl<T: QueueItem> Default for Queue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}
