//! Cache manager
//!
//! Composes named sub-caches and lazily materializes each one with a
//! configurable default backing.

use crate::store::{Cache, CacheStore, MemoryStore};
use dashmap::DashMap;
use std::sync::Arc;

type StoreFactory = dyn Fn() -> Arc<dyn CacheStore> + Send + Sync;

/// Manages named sub-caches (`user`, `guild`, `channel`, ...)
pub struct CacheManager {
    caches: DashMap<String, Cache>,
    backing: Box<StoreFactory>,
}

impl CacheManager {
    /// Create a manager whose sub-caches are backed by `MemoryStore`
    #[must_use]
    pub fn new() -> Self {
        Self::with_backing(|| Arc::new(MemoryStore::new()))
    }

    /// Create a manager with a custom default backing factory
    pub fn with_backing<F>(backing: F) -> Self
    where
        F: Fn() -> Arc<dyn CacheStore> + Send + Sync + 'static,
    {
        Self {
            caches: DashMap::new(),
            backing: Box::new(backing),
        }
    }

    /// Get (materializing on first use) the sub-cache with the given name
    pub fn cache(&self, name: &str) -> Cache {
        if let Some(existing) = self.caches.get(name) {
            return existing.clone();
        }

        let created = self
            .caches
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(cache = %name, "materializing sub-cache");
                Cache::new((self.backing)())
            })
            .clone();
        created
    }

    /// Sub-cache for users
    pub fn users(&self) -> Cache {
        self.cache("user")
    }

    /// Sub-cache for guilds
    pub fn guilds(&self) -> Cache {
        self.cache("guild")
    }

    /// Sub-cache for channels
    pub fn channels(&self) -> Cache {
        self.cache("channel")
    }

    /// Sub-cache for messages
    pub fn messages(&self) -> Cache {
        self.cache("message")
    }

    /// Names of the sub-caches materialized so far
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.caches.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("caches", &self.names())
            .finish_non_exhaustive()
    }
}
