//! Failure worker: cooldown, retry gate and escalation for failed tasks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::app::unit::{Disposition, FatalSender, Unit, invoke, push_logged, release};
use crate::domain::{ListName, TaskId, UnitId};
use crate::error::{FatalError, StoreError};
use crate::ports::QueueStore;
use crate::queue::{Decision, RetryPolicy};
use crate::runtime::TaskHandler;

/// Claims from `failure` into `failure_processing`.
///
/// Never touches `attempts`; the count it gates on is written by workers.
pub struct FailureWorker {
    id: UnitId,
    store: Box<dyn QueueStore>,
    escalation: Arc<dyn TaskHandler>,
    policy: RetryPolicy,
    fatal: FatalSender,
}

impl FailureWorker {
    pub fn new(
        index: usize,
        store: Box<dyn QueueStore>,
        escalation: Arc<dyn TaskHandler>,
        policy: RetryPolicy,
        fatal: FatalSender,
    ) -> Self {
        Self {
            id: UnitId::failure_worker(index),
            store,
            escalation,
            policy,
            fatal,
        }
    }

    pub async fn run_once(&mut self) -> Result<Disposition, StoreError> {
        let id = self
            .store
            .move_task(ListName::Failure, ListName::FailureProcessing)
            .await?;
        debug!(task_id = %id, "claimed failed task");
        Ok(self.process_task(&id).await)
    }

    /// Evaluate a task already sitting in `failure_processing`, then release the claim.
    pub async fn process_task(&mut self, id: &TaskId) -> Disposition {
        tokio::time::sleep(self.policy.cooldown).await;
        let disposition = self.dispose(id).await;
        release(self.store.as_mut(), ListName::FailureProcessing, id).await;
        disposition
    }

    async fn dispose(&mut self, id: &TaskId) -> Disposition {
        let task = match self.store.get_payload(id).await {
            Ok(task) => task,
            Err(e) => {
                error!(task_id = %id, error = %e, "cannot load payload, dead-lettering");
                // single push; older deployments pushed this id to failure_final twice
                push_logged(self.store.as_mut(), ListName::FailureFinal, id).await;
                return Disposition::DeadLettered;
            }
        };

        match self.policy.decide(&task) {
            Decision::Requeue => {
                info!(
                    task_id = %id,
                    attempts = task.attempts,
                    max_attempts = self.policy.max_attempts,
                    "requeueing"
                );
                push_logged(self.store.as_mut(), ListName::Queue, id).await;
                Disposition::Requeued
            }
            Decision::Escalate => {
                warn!(task_id = %id, attempts = task.attempts, "attempts exhausted, escalating");
                match invoke(&self.escalation, &task.arguments).await {
                    Ok(()) => {
                        if let Err(e) = self.store.delete_payload(id).await {
                            error!(task_id = %id, error = %e, "deleting payload failed");
                        }
                        info!(task_id = %id, "escalation succeeded");
                        Disposition::Completed
                    }
                    Err(e) => {
                        error!(task_id = %id, error = %e, "escalation failed, dead-lettering");
                        push_logged(self.store.as_mut(), ListName::FailureFinal, id).await;
                        Disposition::DeadLettered
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Unit for FailureWorker {
    fn identity(&self) -> UnitId {
        self.id
    }

    fn task_type(&self) -> &str {
        self.store.keyspace().task_type()
    }

    async fn run(&mut self) {
        info!(
            max_attempts = self.policy.max_attempts,
            cooldown_ms = self.policy.cooldown.as_millis() as u64,
            "failure worker started"
        );
        loop {
            if let Err(source) = self.run_once().await {
                error!(
                    error = %source,
                    connection = source.is_connection(),
                    "claim failed, failure worker stopping"
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
