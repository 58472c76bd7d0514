//! Runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::Jitter;
use crate::domain::Keyspace;
use crate::error::ConfigError;
use crate::queue::RetryPolicy;

/// Pool configuration. Keys are camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    /// Queue category; every key the pool touches is scoped by it.
    #[serde(default)]
    pub task_type: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_store_address")]
    pub store_address: String,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_failure_max_attempts")]
    pub failure_max_attempts: u32,

    #[serde(default = "default_failure_cooldown_millis")]
    pub failure_cooldown_millis: u64,

    /// `[min, max)` seconds between dial attempts.
    #[serde(default = "default_backoff_secs")]
    pub dial_backoff_secs: [u64; 2],

    /// `[min, max)` seconds before a failed unit is restarted.
    #[serde(default = "default_backoff_secs")]
    pub restart_backoff_secs: [u64; 2],
}

const fn default_worker_count() -> usize {
    1
}

fn default_store_address() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "steadyq".to_string()
}

const fn default_failure_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

const fn default_failure_cooldown_millis() -> u64 {
    10_000
}

const fn default_backoff_secs() -> [u64; 2] {
    [5, 15]
}

impl QueueConfig {
    /// Defaults for everything except the task type.
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            worker_count: default_worker_count(),
            store_address: default_store_address(),
            key_prefix: default_key_prefix(),
            failure_max_attempts: default_failure_max_attempts(),
            failure_cooldown_millis: default_failure_cooldown_millis(),
            dial_backoff_secs: default_backoff_secs(),
            restart_backoff_secs: default_backoff_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.task_type.is_empty() {
            return Err(ConfigError::EmptyTaskType);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        for (name, [min, max]) in [
            ("dial", self.dial_backoff_secs),
            ("restart", self.restart_backoff_secs),
        ] {
            if min > max {
                return Err(ConfigError::InvalidBackoff {
                    name,
                    min_ms: min * 1000,
                    max_ms: max * 1000,
                });
            }
        }
        Ok(())
    }

    pub fn keyspace(&self) -> Keyspace {
        Keyspace::new(self.key_prefix.as_str(), self.task_type.as_str())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.failure_max_attempts,
            Duration::from_millis(self.failure_cooldown_millis),
        )
    }

    pub fn dial_backoff(&self) -> Jitter {
        let [min, max] = self.dial_backoff_secs;
        Jitter::from_secs(min, max)
    }

    pub fn restart_backoff(&self) -> Jitter {
        let [min, max] = self.restart_backoff_secs;
        Jitter::from_secs(min, max)
    }
}
