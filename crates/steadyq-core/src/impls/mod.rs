//! Impls - store adapters.
//!
//! - **RedisConnector / RedisStore**: production adapter
//! - **InMemoryBackend**: tests and local development

pub mod memory;
pub mod redis_store;

pub use self::memory::{InMemoryBackend, InMemoryConnection};
pub use self::redis_store::{RedisConnector, RedisStore};
