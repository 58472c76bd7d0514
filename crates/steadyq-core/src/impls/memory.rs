//! In-memory store for tests and local development.
//!
//! Lists and payloads live behind one shared `Mutex`, keyed by the same key
//! strings the Redis adapter uses. Every `connect()` hands out a separate
//! connection handle. `sever()` breaks all handles dialed so far, which is how
//! tests simulate a dropped store connection.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::domain::{Keyspace, ListName, Task, TaskId};
use crate::error::StoreError;
use crate::ports::{Connector, QueueStore};

#[derive(Default)]
struct Shared {
    lists: HashMap<String, VecDeque<String>>,
    payloads: HashMap<String, String>,
    /// Bumped by `sever()`; handles from an older generation are dead.
    generation: u64,
    refused_dials: u32,
    dials: u64,
    reject_payload_writes: bool,
}

/// Shared in-memory backend. Cloning yields another handle to the same data.
#[derive(Clone)]
pub struct InMemoryBackend {
    keyspace: Keyspace,
    state: Arc<Mutex<Shared>>,
    notify: Arc<Notify>,
}

impl InMemoryBackend {
    pub fn new(keyspace: Keyspace) -> Self {
        Self {
            keyspace,
            state: Arc::new(Mutex::new(Shared::default())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Break every connection handed out so far. Blocked claims wake up and fail.
    pub async fn sever(&self) {
        self.state.lock().await.generation += 1;
        self.notify.notify_waiters();
    }

    /// Make the next `n` dials fail.
    pub async fn refuse_dials(&self, n: u32) {
        self.state.lock().await.refused_dials = n;
    }

    pub async fn dial_count(&self) -> u64 {
        self.state.lock().await.dials
    }

    /// While set, `set_payload` fails on every connection.
    pub async fn reject_payload_writes(&self, reject: bool) {
        self.state.lock().await.reject_payload_writes = reject;
    }

    /// Store a payload directly, bypassing any connection.
    pub async fn put_payload(&self, id: &TaskId, task: &Task) -> Result<(), StoreError> {
        let raw = task.to_json()?;
        self.put_raw_payload(id, raw).await;
        Ok(())
    }

    pub async fn put_raw_payload(&self, id: &TaskId, raw: impl Into<String>) {
        let key = self.keyspace.payload_key(id);
        self.state.lock().await.payloads.insert(key, raw.into());
    }

    /// Decoded payload, if present and well-formed.
    pub async fn payload(&self, id: &TaskId) -> Option<Task> {
        let key = self.keyspace.payload_key(id);
        let state = self.state.lock().await;
        state.payloads.get(&key).and_then(|raw| Task::from_json(raw).ok())
    }

    pub async fn has_payload(&self, id: &TaskId) -> bool {
        let key = self.keyspace.payload_key(id);
        self.state.lock().await.payloads.contains_key(&key)
    }

    /// Prepend an id to a list, bypassing any connection.
    pub async fn push_raw(&self, list: ListName, id: &TaskId) {
        let key = self.keyspace.list_key(list);
        self.state
            .lock()
            .await
            .lists
            .entry(key)
            .or_default()
            .push_front(id.as_str().to_string());
        self.notify.notify_waiters();
    }

    /// List contents, head first.
    pub async fn list(&self, list: ListName) -> Vec<TaskId> {
        let key = self.keyspace.list_key(list);
        let state = self.state.lock().await;
        state
            .lists
            .get(&key)
            .map(|l| l.iter().map(|raw| TaskId::new(raw.as_str())).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Connector for InMemoryBackend {
    async fn connect(&self) -> Result<Box<dyn QueueStore>, StoreError> {
        let mut state = self.state.lock().await;
        state.dials += 1;
        if state.refused_dials > 0 {
            state.refused_dials -= 1;
            return Err(StoreError::Connection("dial refused".to_string()));
        }
        Ok(Box::new(InMemoryConnection {
            keyspace: self.keyspace.clone(),
            state: Arc::clone(&self.state),
            notify: Arc::clone(&self.notify),
            generation: state.generation,
        }))
    }

    fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }
}

/// One connection to an `InMemoryBackend`.
pub struct InMemoryConnection {
    keyspace: Keyspace,
    state: Arc<Mutex<Shared>>,
    notify: Arc<Notify>,
    generation: u64,
}

impl InMemoryConnection {
    fn check(&self, state: &Shared) -> Result<(), StoreError> {
        if state.generation != self.generation {
            return Err(StoreError::Connection("connection severed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueStore for InMemoryConnection {
    fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    async fn move_task(&mut self, from: ListName, to: ListName) -> Result<TaskId, StoreError> {
        let from_key = self.keyspace.list_key(from);
        let to_key = self.keyspace.list_key(to);
        loop {
            // Register for wakeups before looking, so a push between the
            // check and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                self.check(&state)?;
                if let Some(raw) = state.lists.get_mut(&from_key).and_then(|l| l.pop_back()) {
                    state
                        .lists
                        .entry(to_key)
                        .or_default()
                        .push_front(raw.clone());
                    return Ok(TaskId::new(raw));
                }
            }

            notified.await;
        }
    }

    async fn get_payload(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let key = self.keyspace.payload_key(id);
        let state = self.state.lock().await;
        self.check(&state)?;
        let raw = state
            .payloads
            .get(&key)
            .ok_or_else(|| StoreError::PayloadNotFound(id.clone()))?;
        Ok(Task::from_json(raw)?)
    }

    async fn set_payload(&mut self, id: &TaskId, task: &Task) -> Result<(), StoreError> {
        let key = self.keyspace.payload_key(id);
        let raw = task.to_json()?;
        let mut state = self.state.lock().await;
        self.check(&state)?;
        if state.reject_payload_writes {
            return Err(StoreError::Connection("payload write rejected".to_string()));
        }
        state.payloads.insert(key, raw);
        Ok(())
    }

    async fn delete_payload(&mut self, id: &TaskId) -> Result<(), StoreError> {
        let key = self.keyspace.payload_key(id);
        let mut state = self.state.lock().await;
        self.check(&state)?;
        state.payloads.remove(&key);
        Ok(())
    }

    async fn push(&mut self, list: ListName, id: &TaskId) -> Result<(), StoreError> {
        let key = self.keyspace.list_key(list);
        {
            let mut state = self.state.lock().await;
            self.check(&state)?;
            state
                .lists
                .entry(key)
                .or_default()
                .push_front(id.as_str().to_string());
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn remove_one(&mut self, list: ListName, id: &TaskId) -> Result<(), StoreError> {
        let key = self.keyspace.list_key(list);
        let mut state = self.state.lock().await;
        self.check(&state)?;
        if let Some(l) = state.lists.get_mut(&key)
            && let Some(pos) = l.iter().position(|raw| raw == id.as_str())
        {
            l.remove(pos);
        }
        Ok(())
    }

    async fn list_len(&mut self, list: ListName) -> Result<usize, StoreError> {
        let key = self.keyspace.list_key(list);
        let state = self.state.lock().await;
        self.check(&state)?;
        Ok(state.lists.get(&key).map_or(0, VecDeque::len))
    }
}
