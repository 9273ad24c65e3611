//! Ticker sink module
//!
//! Key/value destinations for serialized ticker snapshots.

mod memory;
mod redis;

pub use memory::MemorySink;
pub use self::redis::RedisSink;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Destination for ticker snapshots
///
/// `set` overwrites the value stored under `key`; no expiry is applied.
#[async_trait]
pub trait TickerSink: Send + Sync {
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: TickerSink + ?Sized> TickerSink for Arc<T> {
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), SinkError> {
        (**self).set(key, value).await
    }
}
