//! In-memory cache backing
//!
//! Uses `DashMap` for thread-safe access without a global lock.

use super::CacheStore;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// Concurrent in-memory backing store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of cached entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    async fn set(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }
}
