//! App - the runtime layer.
//!
//! Composes ports into the running pool.
//!
//! # Components
//! - **Worker**: claim from `queue`, run the handler, dispose
//! - **FailureWorker**: cooldown, retry gate, escalation
//! - **Supervisor**: dial, launch, and restart units on fatal signals
//! - **SupervisorBuilder**: wiring and fail-fast validation

pub mod backoff;
pub mod builder;
pub mod failure_worker;
pub mod supervisor;
pub mod unit;
pub mod worker;

pub use self::backoff::Jitter;
pub use self::builder::SupervisorBuilder;
pub use self::failure_worker::FailureWorker;
pub use self::supervisor::{RunningPool, Supervisor};
pub use self::unit::{Disposition, FatalSender, FatalSignal, Unit, fatal_channel};
pub use self::worker::Worker;
