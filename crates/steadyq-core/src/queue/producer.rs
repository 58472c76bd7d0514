use std::sync::Arc;

use tracing::debug;

use crate::domain::{ListName, Task, TaskId};
use crate::error::StoreError;
use crate::ports::{Clock, QueueStore, SystemClock};

/// Producer side of the queue: writes a payload, then makes the id claimable.
pub struct Producer {
    store: Box<dyn QueueStore>,
    clock: Arc<dyn Clock>,
}

impl Producer {
    pub fn new(store: Box<dyn QueueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enqueue a task under a freshly generated id.
    pub async fn enqueue(&mut self, arguments: Vec<String>) -> Result<TaskId, StoreError> {
        let id = TaskId::generate();
        self.enqueue_with_id(id.clone(), arguments).await?;
        Ok(id)
    }

    /// The payload is written before the id is pushed, so a worker never
    /// claims an id whose payload is still missing.
    pub async fn enqueue_with_id(
        &mut self,
        id: TaskId,
        arguments: Vec<String>,
    ) -> Result<(), StoreError> {
        let task_type = self.store.keyspace().task_type().to_string();
        let task = Task::new(task_type, arguments, self.clock.now());
        self.store.set_payload(&id, &task).await?;
        self.store.push(ListName::Queue, &id).await?;
        debug!(task_id = %id, "enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Keyspace;
    use crate::impls::InMemoryBackend;
    use crate::ports::{Connector, FixedClock};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn enqueue_writes_payload_and_pushes_id() {
        let backend = InMemoryBackend::new(Keyspace::new("foo", "dummy"));
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut producer =
            Producer::new(backend.connect().await.unwrap()).with_clock(Arc::new(FixedClock::new(at)));

        let id = producer
            .enqueue(vec!["foo".into(), "bar".into()])
            .await
            .unwrap();

        assert_eq!(backend.list(ListName::Queue).await, vec![id.clone()]);
        let task = backend.payload(&id).await.unwrap();
        assert_eq!(task.arguments, vec!["foo".to_string(), "bar".to_string()]);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.task_type, "dummy");
        assert_eq!(task.created_at, "2024-01-01T12:00:00Z");
    }

    #[tokio::test]
    async fn failed_payload_write_does_not_push() {
        let backend = InMemoryBackend::new(Keyspace::new("foo", "dummy"));
        backend.reject_payload_writes(true).await;
        let mut producer = Producer::new(backend.connect().await.unwrap());

        assert!(producer.enqueue(vec![]).await.is_err());
        assert!(backend.list(ListName::Queue).await.is_empty());
    }
}
