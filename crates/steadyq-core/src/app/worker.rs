//! Worker - `queue` をタスクハンドラで処理するループ
//!
//! # 学習ポイント
//! - claim (`queue` → `processing`) と release を必ず対にする
//! - ペイロードを読めない・書けないタスクはハンドラを呼ばずに `failure_final` へ
//! - claim 自体の失敗だけが fatal signal になる

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::app::unit::{Disposition, FatalSender, Unit, invoke, push_logged, release};
use crate::domain::{ListName, TaskId, UnitId};
use crate::error::{FatalError, StoreError};
use crate::ports::{Clock, QueueStore, SystemClock};
use crate::runtime::TaskHandler;

/// Claims from `queue` into `processing` and runs one task at a time.
///
/// # フロー
/// 1. `move_task(queue, processing)` で task_id を取得
/// 2. ペイロードを読み、`attempts` と `lastAttempt` を更新して書き戻す
/// 3. ハンドラ実行 → 成功ならペイロード削除、失敗なら `lastError` を記録して `failure` へ
/// 4. `processing` から id を外す
pub struct Worker {
    id: UnitId,
    store: Box<dyn QueueStore>,
    handler: Arc<dyn TaskHandler>,
    clock: Arc<dyn Clock>,
    fatal: FatalSender,
}

impl Worker {
    pub fn new(
        index: usize,
        store: Box<dyn QueueStore>,
        handler: Arc<dyn TaskHandler>,
        fatal: FatalSender,
    ) -> Self {
        Self {
            id: UnitId::worker(index),
            store,
            handler,
            clock: Arc::new(SystemClock),
            fatal,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Claim one task and dispose of it.
    ///
    /// Blocks until a task is available. An `Err` means the claim itself
    /// failed; nothing was taken off `queue`.
    pub async fn run_once(&mut self) -> Result<Disposition, StoreError> {
        let id = self
            .store
            .move_task(ListName::Queue, ListName::Processing)
            .await?;
        debug!(task_id = %id, "claimed");
        Ok(self.process_task(&id).await)
    }

    /// Run a task already sitting in `processing`, then release the claim.
    pub async fn process_task(&mut self, id: &TaskId) -> Disposition {
        let disposition = self.dispose(id).await;
        release(self.store.as_mut(), ListName::Processing, id).await;
        disposition
    }

    async fn dispose(&mut self, id: &TaskId) -> Disposition {
        let mut task = match self.store.get_payload(id).await {
            Ok(task) => task,
            Err(e) => {
                error!(task_id = %id, error = %e, "cannot load payload, dead-lettering");
                push_logged(self.store.as_mut(), ListName::FailureFinal, id).await;
                return Disposition::DeadLettered;
            }
        };

        if task.new_attempt(self.clock.now()).is_none() {
            error!(task_id = %id, attempts = task.attempts, "attempt counter exhausted, dead-lettering");
            push_logged(self.store.as_mut(), ListName::FailureFinal, id).await;
            return Disposition::DeadLettered;
        }
        if let Err(e) = self.store.set_payload(id, &task).await {
            error!(task_id = %id, error = %e, "cannot persist attempt, dead-lettering");
            push_logged(self.store.as_mut(), ListName::FailureFinal, id).await;
            return Disposition::DeadLettered;
        }

        match invoke(&self.handler, &task.arguments).await {
            Ok(()) => {
                if let Err(e) = self.store.delete_payload(id).await {
                    error!(task_id = %id, error = %e, "deleting payload failed");
                }
                info!(task_id = %id, attempts = task.attempts, "task completed");
                Disposition::Completed
            }
            Err(e) => {
                warn!(task_id = %id, attempts = task.attempts, error = %e, "task failed");
                task.record_error(&e);
                if let Err(e) = self.store.set_payload(id, &task).await {
                    warn!(task_id = %id, error = %e, "recording lastError failed");
                }
                push_logged(self.store.as_mut(), ListName::Failure, id).await;
                Disposition::Failed
            }
        }
    }
}

#[async_trait]
impl Unit for Worker {
    fn identity(&self) -> UnitId {
        self.id
    }

    fn task_type(&self) -> &str {
        self.store.keyspace().task_type()
    }

    async fn run(&mut self) {
        info!("worker started");
        loop {
            if let Err(source) = self.run_once().await {
                error!(
                    error = %source,
                    connection = source.is_connection(),
                    "claim failed, worker stopping"
                );
                let error = FatalError {
                    unit: self.id,
                    task_type: self.task_type().to_string(),
                    source,
                };
                self.fatal.emit(error).await;
                return;
            }
        }
    }
}
