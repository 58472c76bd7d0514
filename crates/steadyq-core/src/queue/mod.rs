//! Queue policy and producer helpers.

mod producer;
mod retry;

pub use producer::Producer;
pub use retry::{Decision, RetryPolicy};
