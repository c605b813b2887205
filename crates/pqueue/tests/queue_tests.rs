use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use pqueue::{DequeueError, Queue, QueueError, QueueItem, QueueStats};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Work {
    id: String,
    priority: i64,
}

fn work(id: impl Into<String>, priority: i64) -> Work {
    Work { id: id.into(), priority }
}

impl QueueItem for Work {
    type Id = String;

    fn is_higher_priority(&self, other: &Self) -> bool {
        self.priority < other.priority
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

#[test]
fn test_documented_scenario() {
    let q = Queue::new(0);
    q.enqueue(work("A", 10)).unwrap();
    q.enqueue(work("B", 2)).unwrap();
    q.enqueue(work("C", 5)).unwrap();
    q.enqueue(work("D", 7)).unwrap();

    assert!(!q.enqueue_unique(work("B", 3)).unwrap());
    assert_eq!(q.len(), 4);

    let order: Vec<(String, i64)> = (0..4).map(|_| q.dequeue()).map(|w| (w.id, w.priority)).collect();
    assert_eq!(
        order,
        vec![
            ("B".to_string(), 2),
            ("C".to_string(), 5),
            ("D".to_string(), 7),
            ("A".to_string(), 10),
        ]
    );
}

#[test]
fn test_limit_change_scenario() {
    let q = Queue::new(2);
    q.enqueue(work("a", 1)).unwrap();
    q.enqueue(work("b", 1)).unwrap();
    assert_eq!(q.len(), 2);

    q.change_limit(0);
    q.enqueue(work("c", 1)).unwrap();
    assert_eq!(q.len(), 3);
}

#[test]
fn test_capacity_enforcement() {
    let limit = 5;
    let q = Queue::new(limit);
    for i in 0..limit {
        q.enqueue(work(format!("w{i}"), i as i64)).unwrap();
    }
    let rejected = q.enqueue(work("extra", -1)).unwrap_err();
    assert_eq!(rejected.reason, QueueError::CapacityExceeded { limit });
    assert_eq!(rejected.into_item().id, "extra");
    assert_eq!(q.len(), limit);
    assert!(!q.identity_exists(&"extra".to_string()));
}

#[test]
fn test_unbounded_accepts_many() {
    let q = Queue::unbounded();
    for i in 0..10_000 {
        q.enqueue(work(format!("w{i}"), (i * 7919 % 1000) as i64)).unwrap();
    }
    assert_eq!(q.len(), 10_000);
}

#[test]
fn test_heap_order_is_non_decreasing() {
    let q = Queue::unbounded();
    for i in 0..500i64 {
        q.enqueue(work(format!("w{i}"), (i * 37) % 101)).unwrap();
    }
    let mut last = i64::MIN;
    while let Some(w) = q.try_dequeue() {
        assert!(w.priority >= last, "{} came after {}", w.priority, last);
        last = w.priority;
    }
}

#[test]
fn test_dedup_idempotence() {
    let q = Queue::unbounded();
    assert!(q.enqueue_unique(work("x", 1)).unwrap());
    let before = q.len();
    assert!(!q.enqueue_unique(work("x", 0)).unwrap());
    assert_eq!(q.len(), before);
    assert_eq!(q.len(), 1);
}

#[test]
fn test_history_outlives_membership() {
    let q = Queue::unbounded();
    q.enqueue(work("X", 1)).unwrap();
    assert_eq!(q.dequeue().id, "X");
    assert!(q.is_empty());

    let x = "X".to_string();
    assert!(q.identity_exists(&x));
    assert!(!q.enqueue_unique(work("X", 1)).unwrap());

    q.remove_from_history(&x);
    assert!(q.enqueue_unique(work("X", 1)).unwrap());
    q.dequeue();

    assert!(!q.enqueue_unique(work("X", 1)).unwrap());
    q.clear_history();
    assert!(q.enqueue_unique(work("X", 1)).unwrap());
}

#[test]
fn test_dequeue_blocks_until_enqueue() {
    let q: Arc<Queue<Work>> = Arc::new(Queue::unbounded());
    let returned = Arc::new(AtomicBool::new(false));

    let consumer = {
        let q = Arc::clone(&q);
        let returned = Arc::clone(&returned);
        thread::spawn(move || {
            let w = q.dequeue();
            returned.store(true, Ordering::SeqCst);
            w
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!returned.load(Ordering::SeqCst));

    q.enqueue(work("late", 3)).unwrap();
    let got = consumer.join().unwrap();
    assert_eq!(got.id, "late");
    assert!(q.is_empty());
}

#[test]
fn test_one_enqueue_releases_exactly_one_consumer() {
    let q: Arc<Queue<Work>> = Arc::new(Queue::unbounded());
    let (tx, rx) = mpsc::channel();

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let q = Arc::clone(&q);
            let tx = tx.clone();
            thread::spawn(move || {
                if let Some(w) = q.dequeue_until_closed() {
                    tx.send(w.id).unwrap();
                }
            })
        })
        .collect();
    drop(tx);

    thread::sleep(Duration::from_millis(50));
    q.enqueue(work("only", 1)).unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "only");
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    q.close();
    for c in consumers {
        c.join().unwrap();
    }
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_close_releases_blocked_consumers() {
    let q: Arc<Queue<Work>> = Arc::new(Queue::unbounded());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let q = Arc::clone(&q);
            thread::spawn(move || q.dequeue_timeout(Duration::from_secs(30)))
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    q.close();
    for h in handles {
        assert_eq!(h.join().unwrap().unwrap_err(), DequeueError::Closed);
    }
}

#[test]
fn test_many_producers_many_consumers() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let q: Arc<Queue<Work>> = Arc::new(Queue::new(64));
    let start = Arc::new(Barrier::new(PRODUCERS + CONSUMERS));
    let consumed = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let q = Arc::clone(&q);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for i in 0..PER_PRODUCER {
                    let mut item = work(format!("p{p}-{i}"), (i % 17) as i64);
                    loop {
                        match q.enqueue_unique(item) {
                            Ok(added) => {
                                assert!(added);
                                break;
                            }
                            Err(rejected) => {
                                assert!(matches!(rejected.reason, QueueError::CapacityExceeded { limit: 64 }));
                                item = rejected.into_item();
                                thread::yield_now();
                            }
                        }
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let q = Arc::clone(&q);
            let start = Arc::clone(&start);
            let consumed = Arc::clone(&consumed);
            thread::spawn(move || {
                start.wait();
                let mut seen = Vec::new();
                while let Some(w) = q.dequeue_until_closed() {
                    consumed.fetch_add(1, Ordering::SeqCst);
                    seen.push(w.id);
                }
                seen
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    q.close();

    let mut all = HashSet::new();
    for c in consumers {
        for id in c.join().unwrap() {
            assert!(all.insert(id), "item delivered twice");
        }
    }

    assert_eq!(all.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(consumed.load(Ordering::SeqCst), PRODUCERS * PER_PRODUCER);
    assert_eq!(
        q.stats(),
        QueueStats { len: 0, limit: 64, history_len: PRODUCERS * PER_PRODUCER, closed: true }
    );
}

#[test]
fn test_concurrent_unique_inserts_accept_one() {
    let q: Arc<Queue<Work>> = Arc::new(Queue::unbounded());
    let start = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let q = Arc::clone(&q);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                q.enqueue_unique(work("same", i)).unwrap()
            })
        })
        .collect();

    let added = handles.into_iter().map(|h| h.join().unwrap()).filter(|a| *a).count();
    assert_eq!(added, 1);
    assert_eq!(q.len(), 1);
}

#[test]
fn test_stats_serialize() {
    let q = Queue::new(3);
    q.enqueue(work("a", 1)).unwrap();
    let json = serde_json::to_value(q.stats()).unwrap();
    assert_eq!(json["len"], 1);
    assert_eq!(json["limit"], 3);
    assert_eq!(json["history_len"], 1);
    assert_eq!(json["closed"], false);
}

#[test]
fn test_close_leaves_baseline_dequeue_parked() {
    let q: Arc<Queue<Work>> = Arc::new(Queue::unbounded());
    let (tx, rx) = mpsc::channel();
    let consumer = {
        let q = Arc::clone(&q);
        thread::spawn(move || {
            let w = q.dequeue();
            tx.send(w.id).unwrap();
        })
    };

    thread::sleep(Duration::from_millis(50));
    q.close();
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    // closed queues reject inserts, so nothing can reach the parked consumer; detach it
    drop(consumer);
    assert!(q.enqueue(work("after", 1)).is_err());
}
