//! Redis adapter.
//!
//! | operation      | command                          |
//! |----------------|----------------------------------|
//! | move_task      | `BRPOPLPUSH from to 0`           |
//! | get_payload    | `GET {prefix}:task:{type}:{id}`  |
//! | set_payload    | `SET ...`                        |
//! | delete_payload | `DEL ...`                        |
//! | push           | `LPUSH list id`                  |
//! | remove_one     | `LREM list 1 id`                 |
//! | list_len       | `LLEN list`                      |

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::debug;

use crate::domain::{Keyspace, ListName, Task, TaskId};
use crate::error::StoreError;
use crate::ports::{Connector, QueueStore};

/// Dials one dedicated Redis connection per `connect()` call.
pub struct RedisConnector {
    client: redis::Client,
    keyspace: Keyspace,
}

impl RedisConnector {
    /// `address` is a redis URL (`redis://host:port/db`) or a bare `host:port`.
    pub fn new(address: &str, keyspace: Keyspace) -> Result<Self, StoreError> {
        let url = if address.contains("://") {
            address.to_string()
        } else {
            format!("redis://{address}")
        };
        let client = redis::Client::open(url.as_str())?;
        Ok(Self { client, keyspace })
    }
}

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(&self) -> Result<Box<dyn QueueStore>, StoreError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        debug!("dialed redis");
        Ok(Box::new(RedisStore::new(conn, self.keyspace.clone())))
    }

    fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }
}

pub struct RedisStore {
    conn: MultiplexedConnection,
    keyspace: Keyspace,
}

impl RedisStore {
    pub fn new(conn: MultiplexedConnection, keyspace: Keyspace) -> Self {
        Self { conn, keyspace }
    }
}

#[async_trait]
impl QueueStore for RedisStore {
    fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    async fn move_task(&mut self, from: ListName, to: ListName) -> Result<TaskId, StoreError> {
        // timeout 0 blocks until an element arrives
        let id: Option<String> = redis::cmd("BRPOPLPUSH")
            .arg(self.keyspace.list_key(from))
            .arg(self.keyspace.list_key(to))
            .arg(0)
            .query_async(&mut self.conn)
            .await?;
        id.map(TaskId::from)
            .ok_or_else(|| StoreError::UnexpectedReply(format!("nil reply from BRPOPLPUSH {from}")))
    }

    async fn get_payload(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let raw: Option<String> = self.conn.get(self.keyspace.payload_key(id)).await?;
        let raw = raw.ok_or_else(|| StoreError::PayloadNotFound(id.clone()))?;
        Ok(Task::from_json(&raw)?)
    }

    async fn set_payload(&mut self, id: &TaskId, task: &Task) -> Result<(), StoreError> {
        let raw = task.to_json()?;
        self.conn
            .set::<_, _, ()>(self.keyspace.payload_key(id), raw)
            .await?;
        Ok(())
    }

    async fn delete_payload(&mut self, id: &TaskId) -> Result<(), StoreError> {
        self.conn
            .del::<_, ()>(self.keyspace.payload_key(id))
            .await?;
        Ok(())
    }

    async fn push(&mut self, list: ListName, id: &TaskId) -> Result<(), StoreError> {
        self.conn
            .lpush::<_, _, ()>(self.keyspace.list_key(list), id.as_str())
            .await?;
        Ok(())
    }

    async fn remove_one(&mut self, list: ListName, id: &TaskId) -> Result<(), StoreError> {
        self.conn
            .lrem::<_, _, ()>(self.keyspace.list_key(list), 1, id.as_str())
            .await?;
        Ok(())
    }

    async fn list_len(&mut self, list: ListName) -> Result<usize, StoreError> {
        let len: usize = self.conn.llen(self.keyspace.list_key(list)).await?;
        Ok(len)
    }
}
