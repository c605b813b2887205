//! Blocking, bounded, deduplicating priority queue for multi-threaded producers and consumers.

pub mod config;
pub mod error;
pub mod history;
pub mod item;
pub mod queue;
pub mod stats;
pub mod store;

pub use config::*;
pub use error::*;
pub use history::*;
pub use item::*;
pub use queue::*;
pub use stats::*;
pub use store::*;
