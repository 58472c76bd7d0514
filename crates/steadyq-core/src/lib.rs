//! steadyq-core
//!
//! Reliable task queue on a Redis-style list store.
//!
//! # Modules
//! - **domain**: task payload, ids, list names, key naming
//! - **ports**: `QueueStore`, `Connector`, `Clock`
//! - **impls**: Redis adapter and an in-memory backend
//! - **queue**: retry policy and the producer helper
//! - **runtime**: the `TaskHandler` trait and default handlers
//! - **app**: workers, failure worker, supervisor
//! - **config**: `QueueConfig`
//! - **observability**: per-list counts

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod runtime;

pub use app::{RunningPool, Supervisor, SupervisorBuilder};
pub use config::QueueConfig;
pub use error::{ConfigError, FatalError, HandlerError, StoreError};
pub use runtime::{TaskHandler, handler_fn};
