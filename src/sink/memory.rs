//! In-process sink

use super::{SinkError, TickerSink};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared in-memory key/value store
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    values: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    writes: Arc<AtomicU64>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under `key`
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.read().await.get(key).cloned()
    }

    /// Value under `key` decoded as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key).await?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Stored keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.values.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    /// Total successful `set` calls
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TickerSink for MemorySink {
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), SinkError> {
        self.values.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
