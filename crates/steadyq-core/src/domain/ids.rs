//! Identifiers: task ids (opaque tokens chosen by producers) and unit identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque, producer-chosen task token.
///
/// Any string is accepted because ids are written to the store by external
/// producers. `TaskId::generate` mints a ULID for producers that have no id
/// scheme of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Time-sortable id for newly produced tasks.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which loop a unit runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Worker,
    FailureWorker,
}

impl UnitKind {
    fn prefix(self) -> &'static str {
        match self {
            UnitKind::Worker => "w",
            UnitKind::FailureWorker => "fw",
        }
    }
}

/// Stable identity of an execution unit. A restarted unit keeps the identity
/// of the one it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    kind: UnitKind,
    index: usize,
}

impl UnitId {
    pub fn worker(index: usize) -> Self {
        Self {
            kind: UnitKind::Worker,
            index,
        }
    }

    pub fn failure_worker(index: usize) -> Self {
        Self {
            kind: UnitKind::FailureWorker,
            index,
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.index)
    }
}
