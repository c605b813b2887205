use serde::{Deserialize, Serialize};

/// Construction settings for a [`Queue`](crate::Queue).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of queued items; 0 means unbounded.
    pub limit: usize,
}

impl QueueConfig {
    pub fn bounded(limit: usize) -> Self {
        Self { limit }
    }
}
