use pqueue::QueueItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn from_str(s: impl Into<String>) -> Self {
        Self(s.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit of work pushed through the queue by the `pq` workloads.
/// Lower `priority` is served first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub priority: u32,
    pub producer: usize,
}

impl QueueItem for Job {
    type Id = JobId;

    fn is_higher_priority(&self, other: &Self) -> bool {
        self.priority < other.priority
    }

    fn identity(&self) -> JobId {
        self.id.clone()
    }
}

/// Deterministic priority spread so runs are reproducible without an RNG.
pub fn spread_priority(producer: usize, seq: usize, range: u32) -> u32 {
    if range == 0 {
        return 0;
    }
    let mixed = (seq as u64).wrapping_mul(7919).wrapping_add((producer as u64).wrapping_mul(104_729));
    (mixed % range as u64) as u32
}
