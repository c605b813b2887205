pub mod config;
pub mod job;
pub mod workload;

pub use config::*;
pub use job::*;
pub use workload::*;
