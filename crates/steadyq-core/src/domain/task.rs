use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Task payload as stored under `{prefix}:task:{taskType}:{id}`.
///
/// The payload is a cache of task metadata addressed by id; list membership
/// decides what happens to the task next. Timestamps are kept as the strings
/// producers wrote, so foreign date formats survive a read/write cycle.
/// Missing fields decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub arguments: Vec<String>,
    pub created_at: String,
    pub attempts: u32,
    #[serde(rename = "type")]
    pub task_type: String,
    pub last_attempt: String,
    pub last_error: String,
}

impl Task {
    pub fn new(task_type: impl Into<String>, arguments: Vec<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            arguments,
            created_at: format_timestamp(created_at),
            attempts: 0,
            task_type: task_type.into(),
            last_attempt: String::new(),
            last_error: String::new(),
        }
    }

    /// Mark the start of a worker attempt and return the new count.
    ///
    /// `None` when the counter is already at `u32::MAX`; the task is left
    /// unchanged, since `attempts` never goes down.
    #[must_use]
    pub fn new_attempt(&mut self, now: DateTime<Utc>) -> Option<u32> {
        self.attempts = self.attempts.checked_add(1)?;
        self.last_attempt = format_timestamp(now);
        Some(self.attempts)
    }

    pub fn record_error(&mut self, error: impl ToString) {
        self.last_error = error.to_string();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Task {
        Task {
            arguments: vec!["foo".into(), "bar".into(), "next".into()],
            created_at: "Friday, 22-Nov-63 12:30:00 CST".into(),
            attempts: 0,
            task_type: "dummy".into(),
            last_attempt: String::new(),
            last_error: String::new(),
        }
    }

    #[test]
    fn new_attempt_increments_and_stamps() {
        let mut task = sample();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(task.new_attempt(now), Some(1));

        assert_eq!(task.attempts, 1);
        assert_eq!(task.last_attempt, "2024-01-01T12:00:00Z");
    }

    #[test]
    fn new_attempt_refuses_to_wrap() {
        let mut task = Task::from_json(r#"{"arguments":["a"],"attempts":4294967295}"#).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(task.new_attempt(now), None);
        assert_eq!(task.attempts, u32::MAX);
        assert!(task.last_attempt.is_empty());
    }

    #[test]
    fn json_uses_wire_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["arguments", "createdAt", "attempts", "type", "lastAttempt", "lastError"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 6);
    }

    #[test]
    fn json_round_trip_keeps_empty_fields() {
        let task = sample();
        let decoded = Task::from_json(&task.to_json().unwrap()).unwrap();
        assert_eq!(decoded, task);
        assert!(decoded.last_error.is_empty());
        assert!(decoded.last_attempt.is_empty());
    }

    #[test]
    fn unknown_and_missing_fields_are_tolerated() {
        let decoded = Task::from_json(r#"{"arguments":["a"],"attempts":3,"priority":9}"#).unwrap();
        assert_eq!(decoded.arguments, vec!["a".to_string()]);
        assert_eq!(decoded.attempts, 3);
        assert!(decoded.task_type.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Task::from_json("not json").is_err());
        assert!(Task::from_json(r#"{"attempts":"many"}"#).is_err());
    }
}
