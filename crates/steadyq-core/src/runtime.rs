use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::info;

use crate::error::HandlerError;

/// Integrator code run against a task's arguments.
///
/// One handler instance is shared by every worker of a pool and may be called
/// concurrently; the runtime adds no locking around it. Calls are not
/// time-bounded.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, args: &[String]) -> Result<(), HandlerError>;
}

/// Adapter for closures; see `handler_fn`.
pub struct FnHandler<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a `TaskHandler`.
///
/// ```ignore
/// let handler = handler_fn(|args: Vec<String>| async move {
///     send_email(&args[0]).await.map_err(|e| HandlerError::new(e.to_string()))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F, Fut>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F, Fut>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, args: &[String]) -> Result<(), HandlerError> {
        (self.f)(args.to_vec()).await
    }
}

/// Default task handler: logs the arguments and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogArgsHandler;

#[async_trait]
impl TaskHandler for LogArgsHandler {
    async fn handle(&self, args: &[String]) -> Result<(), HandlerError> {
        info!("task args: {}", args.join(" "));
        Ok(())
    }
}

/// Default escalation handler: always fails, so exhausted tasks are dead-lettered.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedEscalation;

#[async_trait]
impl TaskHandler for UnsupportedEscalation {
    async fn handle(&self, args: &[String]) -> Result<(), HandlerError> {
        info!("failure task args: {}", args.join(" "));
        Err(HandlerError::new("failure escalation unsupported"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn closure_handler_receives_arguments() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let handler = handler_fn(move |args: Vec<String>| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(args.len(), Ordering::SeqCst);
                Ok::<(), HandlerError>(())
            }
        });

        handler
            .handle(&["foo".to_string(), "bar".to_string()])
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn closure_handler_propagates_failure() {
        let handler = handler_fn(|_args: Vec<String>| async { Err::<(), _>(HandlerError::from("nope")) });
        let err = handler.handle(&[]).await.unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[tokio::test]
    async fn default_handlers() {
        assert!(LogArgsHandler.handle(&["x".to_string()]).await.is_ok());
        let err = UnsupportedEscalation.handle(&[]).await.unwrap_err();
        assert!(err.message().contains("unsupported"));
    }
}
