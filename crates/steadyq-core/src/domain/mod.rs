//! Domain model: task payloads, ids, list names and key naming.

pub mod ids;
pub mod keyspace;
pub mod state;
pub mod task;

pub use ids::{TaskId, UnitId, UnitKind};
pub use keyspace::Keyspace;
pub use state::ListName;
pub use task::Task;
