//! SupervisorBuilder - プールの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターン（未設定の項目はデフォルトにフォールバック）
//! - 起動時検証（Fail-fast: worker 数 0 や不正な backoff 範囲は build() で弾く）
//! - tracing の Dispatch をユニットごとに引き回す

use std::sync::Arc;

use tracing::Dispatch;

use crate::app::backoff::Jitter;
use crate::app::supervisor::{Supervisor, Wiring};
use crate::config::QueueConfig;
use crate::error::ConfigError;
use crate::ports::{Clock, Connector, SystemClock};
use crate::queue::RetryPolicy;
use crate::runtime::{LogArgsHandler, TaskHandler, UnsupportedEscalation};

/// Assembles a `Supervisor`.
///
/// ```ignore
/// let supervisor = SupervisorBuilder::new(Arc::new(connector))
///     .worker_count(4)
///     .handler(Arc::new(SendEmail))
///     .build()?;
/// let pool = supervisor.start().await;
/// ```
///
/// Unset parts fall back to defaults: one worker, `LogArgsHandler`,
/// `UnsupportedEscalation`, the default retry policy, 5-15s jitter for both
/// redial and restart, and no logging.
pub struct SupervisorBuilder {
    connector: Arc<dyn Connector>,
    worker_count: usize,
    handler: Arc<dyn TaskHandler>,
    escalation: Arc<dyn TaskHandler>,
    policy: RetryPolicy,
    dial_backoff: Jitter,
    restart_backoff: Jitter,
    clock: Arc<dyn Clock>,
    dispatch: Dispatch,
}

impl SupervisorBuilder {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            worker_count: 1,
            handler: Arc::new(LogArgsHandler),
            escalation: Arc::new(UnsupportedEscalation),
            policy: RetryPolicy::default(),
            dial_backoff: Jitter::default(),
            restart_backoff: Jitter::default(),
            clock: Arc::new(SystemClock),
            dispatch: Dispatch::none(),
        }
    }

    /// Take worker count, retry policy and backoff ranges from `config`.
    pub fn from_config(config: &QueueConfig, connector: Arc<dyn Connector>) -> Self {
        Self::new(connector)
            .worker_count(config.worker_count)
            .retry_policy(config.retry_policy())
            .dial_backoff(config.dial_backoff())
            .restart_backoff(config.restart_backoff())
    }

    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = n;
        self
    }

    pub fn handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn escalation_handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.escalation = handler;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dial_backoff(mut self, jitter: Jitter) -> Self {
        self.dial_backoff = jitter;
        self
    }

    pub fn restart_backoff(mut self, jitter: Jitter) -> Self {
        self.restart_backoff = jitter;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Route every unit's logs to `dispatch` instead of discarding them.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn build(self) -> Result<Supervisor, ConfigError> {
        if self.connector.keyspace().task_type().is_empty() {
            return Err(ConfigError::EmptyTaskType);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        check_backoff("dial", self.dial_backoff)?;
        check_backoff("restart", self.restart_backoff)?;

        Ok(Supervisor::new(Wiring {
            connector: self.connector,
            worker_count: self.worker_count,
            handler: self.handler,
            escalation: self.escalation,
            policy: self.policy,
            dial_backoff: self.dial_backoff,
            restart_backoff: self.restart_backoff,
            clock: self.clock,
            dispatch: self.dispatch,
        }))
    }
}

fn check_backoff(name: &'static str, jitter: Jitter) -> Result<(), ConfigError> {
    if jitter.min() > jitter.max() {
        return Err(ConfigError::InvalidBackoff {
            name,
            min_ms: jitter.min().as_millis() as u64,
            max_ms: jitter.max().as_millis() as u64,
        });
    }
    Ok(())
}
