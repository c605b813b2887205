use serde::Serialize;

/// Point-in-time view of a queue, taken under one lock acquisition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub len: usize,
    pub limit: usize,
    pub history_len: usize,
    pub closed: bool,
}

impl QueueStats {
    /// Free slots left, or `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        if self.limit == 0 {
            None
        } else {
            Some(self.limit.saturating_sub(self.len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_respects_unbounded() {
        let s = QueueStats { len: 4, limit: 0, history_len: 4, closed: false };
        assert_eq!(s.remaining(), None);

        let s = QueueStats { len: 4, limit: 3, history_len: 4, closed: false };
        assert_eq!(s.remaining(), Some(0));
    }
}
