//! QueueStore port - the backing list/key-value store.
//!
//! A `QueueStore` is one exclusively owned connection. Every call is a single
//! round trip; nothing is batched and nothing is retried here. Retry and
//! placement policy belong to the caller.

use async_trait::async_trait;

use crate::domain::{Keyspace, ListName, Task, TaskId};
use crate::error::StoreError;

#[async_trait]
pub trait QueueStore: Send {
    /// Key naming this connection operates under.
    fn keyspace(&self) -> &Keyspace;

    /// Block until an id is available in `from`, then atomically move it to
    /// the head of `to`. Claims take from the tail, so a list is FIFO.
    ///
    /// Fails only on connection-level errors.
    async fn move_task(&mut self, from: ListName, to: ListName) -> Result<TaskId, StoreError>;

    /// `PayloadNotFound` when no payload exists, `Codec` when it does not decode.
    async fn get_payload(&mut self, id: &TaskId) -> Result<Task, StoreError>;

    async fn set_payload(&mut self, id: &TaskId, task: &Task) -> Result<(), StoreError>;

    async fn delete_payload(&mut self, id: &TaskId) -> Result<(), StoreError>;

    /// Prepend `id` to `list`.
    async fn push(&mut self, list: ListName, id: &TaskId) -> Result<(), StoreError>;

    /// Remove one occurrence of `id` from `list`. Removing an absent id is not an error.
    async fn remove_one(&mut self, list: ListName, id: &TaskId) -> Result<(), StoreError>;

    async fn list_len(&mut self, list: ListName) -> Result<usize, StoreError>;
}

/// Dials new store connections.
///
/// Each call returns a fresh connection that the caller owns exclusively.
/// Connections are never shared between units.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn QueueStore>, StoreError>;

    fn keyspace(&self) -> &Keyspace;
}
