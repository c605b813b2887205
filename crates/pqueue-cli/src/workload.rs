use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use pqueue::{DequeueError, Queue, QueueError, QueueStats};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{spread_priority, Job, JobId, WorkloadConfig};

#[derive(Debug, Default)]
struct Counters {
    produced: AtomicU64,
    rejected_capacity: AtomicU64,
    rejected_duplicate: AtomicU64,
    consumed: AtomicU64,
    idle_polls: AtomicU64,
}

/// Outcome of one `pq run`, printed as JSON.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub produced: u64,
    pub rejected_capacity: u64,
    pub rejected_duplicate: u64,
    pub consumed: u64,
    pub idle_polls: u64,
    pub elapsed_ms: u64,
    /// Free slots when the run ended; `None` for an unbounded queue.
    pub remaining_capacity: Option<usize>,
    pub stats: QueueStats,
}

/// Sleep before retrying an insert rejected for capacity.
///
/// Attempt 1: 50us, doubling each attempt, capped at 5ms.
pub fn backoff_for(attempt: u32) -> Duration {
    const BASE_MICROS: u64 = 50;
    const CAP_MICROS: u64 = 5_000;
    let shift = attempt.saturating_sub(1).min(16);
    Duration::from_micros((BASE_MICROS << shift).min(CAP_MICROS))
}

/// Drives `cfg.producers` producer threads and `cfg.consumers` consumer threads over one
/// shared queue, closing it once every producer is done.
pub fn run_workload(cfg: &WorkloadConfig) -> Result<RunSummary> {
    cfg.validate()?;
    let queue: Arc<Queue<Job>> = Arc::new(Queue::from_config(&cfg.queue));
    let counters = Arc::new(Counters::default());
    let started = Instant::now();

    info!(
        producers = cfg.producers,
        consumers = cfg.consumers,
        limit = cfg.queue.limit,
        unique = cfg.unique,
        "workload starting"
    );

    let consumers: Vec<_> = (0..cfg.consumers)
        .map(|n| {
            let queue = Arc::clone(&queue);
            let counters = Arc::clone(&counters);
            let timeout = cfg.dequeue_timeout_ms.map(Duration::from_millis);
            thread::spawn(move || consume(n, &queue, &counters, timeout))
        })
        .collect();

    let producers: Vec<_> = (0..cfg.producers)
        .map(|n| {
            let queue = Arc::clone(&queue);
            let counters = Arc::clone(&counters);
            let cfg = cfg.clone();
            thread::spawn(move || produce(n, &queue, &counters, &cfg))
        })
        .collect();

    let mut first_err = None;
    for p in producers {
        let res = p.join().map_err(|_| anyhow!("producer thread panicked")).and_then(|r| r);
        if let Err(e) = res {
            warn!(error = %e, "producer failed");
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    queue.close();
    for c in consumers {
        c.join().map_err(|_| anyhow!("consumer thread panicked"))?;
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    let stats = queue.stats();
    let summary = RunSummary {
        produced: counters.produced.load(Ordering::Relaxed),
        rejected_capacity: counters.rejected_capacity.load(Ordering::Relaxed),
        rejected_duplicate: counters.rejected_duplicate.load(Ordering::Relaxed),
        consumed: counters.consumed.load(Ordering::Relaxed),
        idle_polls: counters.idle_polls.load(Ordering::Relaxed),
        elapsed_ms: started.elapsed().as_millis() as u64,
        remaining_capacity: stats.remaining(),
        stats,
    };
    info!(produced = summary.produced, consumed = summary.consumed, elapsed_ms = summary.elapsed_ms, "workload finished");
    Ok(summary)
}

fn produce(n: usize, queue: &Queue<Job>, counters: &Counters, cfg: &WorkloadConfig) -> Result<()> {
    for seq in 0..cfg.jobs_per_producer {
        let job = Job {
            id: JobId::new(),
            priority: spread_priority(n, seq, cfg.priority_range),
            producer: n,
        };
        if cfg.unique {
            submit(queue, counters, job.clone(), true)?;
            submit(queue, counters, job, true)?;
        } else {
            submit(queue, counters, job, false)?;
        }
    }
    debug!(producer = n, jobs = cfg.jobs_per_producer, "producer done");
    Ok(())
}

/// Offers `job` until the queue has room. Capacity rejections back off and retry; a closed
/// queue is an error.
fn submit(queue: &Queue<Job>, counters: &Counters, mut job: Job, unique: bool) -> Result<()> {
    let mut attempt = 0u32;
    loop {
        let res = if unique { queue.enqueue_unique(job) } else { queue.enqueue(job).map(|()| true) };
        match res {
            Ok(true) => {
                counters.produced.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Ok(false) => {
                counters.rejected_duplicate.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(rejected) => match rejected.reason {
                QueueError::CapacityExceeded { .. } => {
                    counters.rejected_capacity.fetch_add(1, Ordering::Relaxed);
                    job = rejected.into_item();
                    attempt += 1;
                    thread::sleep(backoff_for(attempt));
                }
                QueueError::Closed => bail!("queue closed while producing {}", rejected.item.id.as_str()),
            },
        }
    }
}

fn consume(n: usize, queue: &Queue<Job>, counters: &Counters, timeout: Option<Duration>) {
    let mut taken = 0u64;
    loop {
        let next = match timeout {
            None => queue.dequeue_until_closed(),
            Some(t) => match queue.dequeue_timeout(t) {
                Ok(job) => Some(job),
                Err(DequeueError::Timeout) => {
                    counters.idle_polls.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Err(DequeueError::Closed) => None,
            },
        };
        let Some(_job) = next else { break };
        taken += 1;
        counters.consumed.fetch_add(1, Ordering::Relaxed);
    }
    debug!(consumer = n, taken, "consumer done");
}

/// The reference ordering scenario: four jobs, one rejected duplicate, drained in priority
/// order. Returns `(id, priority)` pairs in dequeue order.
pub fn run_demo() -> Result<Vec<(String, u32)>> {
    let queue = Queue::unbounded();
    let job = |id: &str, priority: u32| Job { id: JobId::from_str(id), priority, producer: 0 };

    for (id, priority) in [("A", 10), ("B", 2), ("C", 5), ("D", 7)] {
        queue.enqueue(job(id, priority))?;
    }
    let added = queue.enqueue_unique(job("B", 3))?;
    info!(added, len = queue.len(), "re-offered B");

    let mut order = Vec::with_capacity(queue.len());
    while let Some(j) = queue.try_dequeue() {
        order.push((j.id.0, j.priority));
    }
    Ok(order)
}
