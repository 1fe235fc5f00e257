//! Cache store trait and wrapper
//!
//! `CacheStore` is the seam a deployment can replace with its own backing;
//! `Cache` adds the compute-on-miss convenience on top of any store.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Backing store for one cache namespace
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value by key
    async fn get(&self, key: &str) -> Option<Value>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: Value);

    /// Remove a value; returns whether it was present
    async fn delete(&self, key: &str) -> bool;
}

/// A handle to one named cache
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    /// Wrap a backing store
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Fetch a value by key
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key).await
    }

    /// Insert or replace a value
    pub async fn set(&self, key: impl AsRef<str>, value: Value) {
        self.store.set(key.as_ref(), value).await;
    }

    /// Remove a value; returns whether it was present
    pub async fn delete(&self, key: &str) -> bool {
        self.store.delete(key).await
    }

    /// Fetch a value, computing and storing it on a miss
    pub async fn get_or_compute<F, Fut>(&self, key: &str, producer: F) -> Value
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Value> + Send,
    {
        if let Some(hit) = self.store.get(key).await {
            return hit;
        }

        let value = producer().await;
        self.store.set(key, value.clone()).await;
        value
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}
