use super::{ListName, TaskId};

const TASK_KEY_KIND: &str = "task";

/// Key naming for one (prefix, task type) pair.
///
/// - lists: `{prefix}:{list}:{taskType}`
/// - payloads: `{prefix}:task:{taskType}:{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
    task_type: String,
}

impl Keyspace {
    pub fn new(prefix: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            task_type: task_type.into(),
        }
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn list_key(&self, list: ListName) -> String {
        format!("{}:{}:{}", self.prefix, list, self.task_type)
    }

    pub fn payload_key(&self, id: &TaskId) -> String {
        format!("{}:{}:{}:{}", self.prefix, TASK_KEY_KIND, self.task_type, id)
    }
}
