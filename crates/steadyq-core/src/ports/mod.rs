//! Ports: the seams between the runtime and the outside world.
//!
//! The runtime only talks to the backing store through `QueueStore` and only
//! obtains connections through a `Connector`, so the Redis adapter and the
//! in-memory adapter are interchangeable.

pub mod clock;
pub mod store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::store::{Connector, QueueStore};
