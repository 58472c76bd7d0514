use serde::{Deserialize, Serialize};

use crate::domain::ListName;
use crate::error::StoreError;
use crate::ports::QueueStore;

/// Length of each list for one task type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub queued: usize,
    pub processing: usize,
    pub failed: usize,
    pub failure_processing: usize,
    pub dead: usize,
}

impl QueueCounts {
    pub async fn collect(store: &mut dyn QueueStore) -> Result<Self, StoreError> {
        let mut counts = QueueCounts::default();
        for list in ListName::ALL {
            let len = store.list_len(list).await?;
            match list {
                ListName::Queue => counts.queued = len,
                ListName::Processing => counts.processing = len,
                ListName::Failure => counts.failed = len,
                ListName::FailureProcessing => counts.failure_processing = len,
                ListName::FailureFinal => counts.dead = len,
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Keyspace, TaskId};
    use crate::impls::InMemoryBackend;
    use crate::ports::Connector;

    #[tokio::test]
    async fn counts_every_list() {
        let backend = InMemoryBackend::new(Keyspace::new("foo", "dummy"));
        backend.push_raw(ListName::Queue, &TaskId::new("a")).await;
        backend.push_raw(ListName::Queue, &TaskId::new("b")).await;
        backend.push_raw(ListName::FailureFinal, &TaskId::new("c")).await;

        let mut conn = backend.connect().await.unwrap();
        let counts = QueueCounts::collect(conn.as_mut()).await.unwrap();

        assert_eq!(
            counts,
            QueueCounts {
                queued: 2,
                dead: 1,
                ..QueueCounts::default()
            }
        );
    }
}
