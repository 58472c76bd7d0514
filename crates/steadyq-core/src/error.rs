use thiserror::Error;

use crate::domain::{TaskId, UnitId};

/// Failures reported by a `QueueStore` or a `Connector`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("payload not found for task_id={0}")]
    PayloadNotFound(TaskId),

    #[error("payload codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl StoreError {
    /// Transport-level failure (as opposed to a problem with one task's data).
    pub fn is_connection(&self) -> bool {
        match self {
            StoreError::Connection(_) => true,
            StoreError::Redis(e) => {
                e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
            }
            _ => false,
        }
    }
}

/// A handler's descriptive failure. The text ends up in the payload's `lastError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Why a unit's run loop ended. Carried to the supervisor in a fatal signal.
#[derive(Debug, Error)]
#[error("unit {unit} (task_type={task_type}) failed: {source}")]
pub struct FatalError {
    pub unit: UnitId,
    pub task_type: String,
    #[source]
    pub source: StoreError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("taskType must not be empty")]
    EmptyTaskType,

    #[error("workerCount must be at least 1")]
    NoWorkers,

    #[error("invalid backoff range for {name}: min={min_ms}ms must not exceed max={max_ms}ms")]
    InvalidBackoff {
        name: &'static str,
        min_ms: u64,
        max_ms: u64,
    },
}
