//! Queue configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::RetryPolicy;

/// Runtime configuration. Immutable once the queue is built.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// max_concurrent = 8
/// retry_delays_ms = [500, 2000]
/// max_queue_size = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum items processing at once.
    pub max_concurrent: usize,

    /// Admissions per rolling second.
    pub rate_limit: u32,

    /// Backoff table; lookups past the end reuse the last entry.
    pub retry_delays_ms: Vec<u64>,

    /// Attempts allowed before an item is dead-lettered.
    pub dlq_threshold: u32,

    /// Time an item may stay in flight before it is failed.
    pub processing_timeout_ms: u64,

    /// Cap on queued items; `None` means unbounded.
    pub max_queue_size: Option<usize>,

    /// Period of the timeout sweep.
    pub sweep_interval_ms: u64,

    /// Completions averaged for the processing-duration metric.
    pub duration_window: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            rate_limit: 10,
            retry_delays_ms: vec![1000, 5000, 15000],
            dlq_threshold: 3,
            processing_timeout_ms: 30_000,
            max_queue_size: None,
            sweep_interval_ms: 1000,
            duration_window: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl QueueConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reject settings the queue cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        if self.max_concurrent == 0 {
            return invalid("max_concurrent", "must be at least 1");
        }
        if self.rate_limit == 0 {
            return invalid("rate_limit", "must be at least 1");
        }
        if self.retry_delays_ms.is_empty() {
            return invalid("retry_delays_ms", "must not be empty");
        }
        if self.dlq_threshold == 0 {
            return invalid("dlq_threshold", "must be at least 1");
        }
        if self.processing_timeout_ms == 0 {
            return invalid("processing_timeout_ms", "must be greater than 0");
        }
        if self.max_queue_size == Some(0) {
            return invalid("max_queue_size", "must be at least 1 when set");
        }
        if self.sweep_interval_ms == 0 {
            return invalid("sweep_interval_ms", "must be greater than 0");
        }
        if self.sweep_interval_ms > self.processing_timeout_ms {
            return invalid("sweep_interval_ms", "must not exceed processing_timeout_ms");
        }
        if self.duration_window == 0 {
            return invalid("duration_window", "must be at least 1");
        }
        Ok(())
    }

    pub fn processing_timeout(&self) -> Duration {
        Duration::from_millis(self.processing_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(&self.retry_delays_ms)
    }
}
