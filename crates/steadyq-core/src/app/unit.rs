//! Execution units and the fatal-signal bus.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, error, warn};
use tracing::instrument::WithSubscriber;

use crate::domain::{ListName, TaskId, UnitId};
use crate::error::{FatalError, HandlerError};
use crate::ports::QueueStore;
use crate::runtime::TaskHandler;

/// A long-running loop owned by the supervisor.
///
/// `run` returns only after the unit has delivered a fatal signal; the
/// supervisor then starts a replacement under the same identity.
#[async_trait]
pub trait Unit: Send {
    fn identity(&self) -> UnitId;

    fn task_type(&self) -> &str;

    async fn run(&mut self);
}

/// Where a claimed task ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handler succeeded; payload deleted.
    Completed,

    /// Handler failed; id pushed to `failure`.
    Failed,

    /// Pushed back to `queue` for another worker attempt.
    Requeued,

    /// Pushed to `failure_final`.
    DeadLettered,
}

/// A unit's last message before its run loop exits.
#[derive(Debug)]
pub struct FatalSignal {
    error: FatalError,
    received: oneshot::Sender<()>,
}

impl FatalSignal {
    pub fn error(&self) -> &FatalError {
        &self.error
    }

    /// Confirm receipt, releasing the emitting unit.
    pub fn acknowledge(self) -> FatalError {
        // the emitter may already be gone (aborted)
        let _ = self.received.send(());
        self.error
    }
}

/// Sending half of a fatal-signal channel; one channel per failure domain.
#[derive(Debug, Clone)]
pub struct FatalSender {
    tx: mpsc::Sender<FatalSignal>,
}

impl FatalSender {
    /// Deliver `error` and wait until the receiver has acknowledged it.
    pub async fn emit(&self, error: FatalError) {
        let (received, ack) = oneshot::channel();
        let unit = error.unit;
        if self.tx.send(FatalSignal { error, received }).await.is_err() {
            error!(%unit, "fatal signal dropped: supervisor is gone");
            return;
        }
        if ack.await.is_err() {
            warn!(%unit, "fatal signal was not acknowledged");
        }
    }
}

pub fn fatal_channel() -> (FatalSender, mpsc::Receiver<FatalSignal>) {
    let (tx, rx) = mpsc::channel(1);
    (FatalSender { tx }, rx)
}

/// Run a handler on its own task so a panic becomes a handler failure
/// instead of killing the unit without a fatal signal.
pub(crate) async fn invoke(
    handler: &Arc<dyn TaskHandler>,
    args: &[String],
) -> Result<(), HandlerError> {
    let handler = Arc::clone(handler);
    let args = args.to_vec();
    let call = async move { handler.handle(&args).await }
        .in_current_span()
        .with_current_subscriber();
    match tokio::spawn(call).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(HandlerError::new("handler panicked")),
        Err(_) => Err(HandlerError::new("handler was cancelled")),
    }
}

/// Push `id` to `list`, logging failures. Returns whether the push landed.
pub(crate) async fn push_logged(store: &mut dyn QueueStore, list: ListName, id: &TaskId) -> bool {
    tracing::debug!(task_id = %id, %list, "pushing");
    match store.push(list, id).await {
        Ok(()) => true,
        Err(e) => {
            error!(task_id = %id, %list, error = %e, "push failed");
            false
        }
    }
}

/// Drop the claim on `id`. Failures are logged and otherwise ignored.
pub(crate) async fn release(store: &mut dyn QueueStore, list: ListName, id: &TaskId) {
    tracing::debug!(task_id = %id, %list, "releasing claim");
    if let Err(e) = store.remove_one(list, id).await {
        error!(task_id = %id, %list, error = %e, "releasing claim failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    struct PanickingHandler;

    #[async_trait]
    impl TaskHandler for PanickingHandler {
        async fn handle(&self, _args: &[String]) -> Result<(), HandlerError> {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn emit_waits_for_acknowledgement() {
        let (tx, mut rx) = fatal_channel();
        let emitter = tokio::spawn(async move {
            tx.emit(FatalError {
                unit: UnitId::worker(4),
                task_type: "dummy".into(),
                source: StoreError::Connection("reset".into()),
            })
            .await;
        });

        let signal = rx.recv().await.unwrap();
        tokio::task::yield_now().await;
        assert!(!emitter.is_finished());

        let error = signal.acknowledge();
        assert_eq!(error.unit, UnitId::worker(4));
        emitter.await.unwrap();
    }

    #[tokio::test]
    async fn emit_returns_when_supervisor_is_gone() {
        let (tx, rx) = fatal_channel();
        drop(rx);
        tx.emit(FatalError {
            unit: UnitId::failure_worker(0),
            task_type: "dummy".into(),
            source: StoreError::Connection("reset".into()),
        })
        .await;
    }

    #[tokio::test]
    async fn panicking_handler_is_a_failure() {
        let handler: Arc<dyn TaskHandler> = Arc::new(PanickingHandler);
        let err = invoke(&handler, &[]).await.unwrap_err();
        assert_eq!(err.message(), "handler panicked");
    }
}
