//! Task lifecycle as list membership.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five lists a task id moves through.
///
/// Transitions:
/// - Queue -> Processing -> (payload deleted)
/// - Queue -> Processing -> Failure -> FailureProcessing -> Queue (retry)
/// - Failure -> FailureProcessing -> (payload deleted) | FailureFinal (escalation)
/// - Processing | FailureProcessing -> FailureFinal (missing or unwritable payload)
///
/// An id is a member of at most one list at a time, except for the window in
/// which a claim list still holds it while its next placement is pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListName {
    /// Ready to run.
    Queue,

    /// Claimed by a worker.
    Processing,

    /// Failed once; waiting for the failure worker.
    Failure,

    /// Claimed by the failure worker.
    FailureProcessing,

    /// Dead-letter. Needs manual intervention.
    FailureFinal,
}

impl ListName {
    pub const ALL: [ListName; 5] = [
        ListName::Queue,
        ListName::Processing,
        ListName::Failure,
        ListName::FailureProcessing,
        ListName::FailureFinal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ListName::Queue => "queue",
            ListName::Processing => "processing",
            ListName::Failure => "failure",
            ListName::FailureProcessing => "failure_processing",
            ListName::FailureFinal => "failure_final",
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_names_match_store_layout() {
        let names: Vec<&str> = ListName::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            names,
            ["queue", "processing", "failure", "failure_processing", "failure_final"]
        );
    }
}
