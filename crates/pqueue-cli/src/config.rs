use anyhow::{bail, Context, Result};
use pqueue::QueueConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for a `pq run` load run, stored as TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub producers: usize,
    pub consumers: usize,
    pub jobs_per_producer: usize,
    /// Submit through `enqueue_unique`, offering every job twice.
    #[serde(default)]
    pub unique: bool,
    #[serde(default = "default_priority_range")]
    pub priority_range: u32,
    /// Consumer poll timeout; absent means consumers block until the queue closes.
    #[serde(default)]
    pub dequeue_timeout_ms: Option<u64>,
    #[serde(default)]
    pub queue: QueueConfig,
}

fn default_priority_range() -> u32 {
    100
}

impl WorkloadConfig {
    pub fn default_config() -> Self {
        Self {
            producers: 4,
            consumers: 4,
            jobs_per_producer: 1000,
            unique: false,
            priority_range: default_priority_range(),
            dequeue_timeout_ms: None,
            queue: QueueConfig::bounded(128),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: WorkloadConfig = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.producers == 0 {
            bail!("producers must be at least 1");
        }
        if self.consumers == 0 {
            bail!("consumers must be at least 1");
        }
        Ok(())
    }
}
