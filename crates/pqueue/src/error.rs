use std::fmt;

use thiserror::Error;

/// Rejection of an insert. The queue is left untouched when one of these is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue limit reached ({limit} items)")]
    CapacityExceeded { limit: usize },
    #[error("queue is closed")]
    Closed,
}

/// Why a bounded or close-aware dequeue returned without an item.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DequeueError {
    #[error("timed out waiting for an item")]
    Timeout,
    #[error("queue is closed and empty")]
    Closed,
}

/// A rejected insert. Hands the item back so the caller can retry or drop it.
#[derive(Error)]
#[error("{reason}")]
pub struct Rejected<T> {
    pub item: T,
    pub reason: QueueError,
}

impl<T> Rejected<T> {
    pub fn into_item(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected").field("reason", &self.reason).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_limit() {
        let e = QueueError::CapacityExceeded { limit: 3 };
        assert_eq!(e.to_string(), "queue limit reached (3 items)");
        assert_eq!(DequeueError::Timeout.to_string(), "timed out waiting for an item");
    }

    #[test]
    fn rejected_displays_reason_and_returns_item() {
        let r = Rejected { item: 42u32, reason: QueueError::Closed };
        assert_eq!(r.to_string(), "queue is closed");
        assert_eq!(format!("{r:?}"), "Rejected { reason: Closed, .. }");
        assert_eq!(r.into_item(), 42);
    }
}
