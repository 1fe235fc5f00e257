//! # cord-cache
//!
//! Pluggable key/value caching used to memoize domain objects fetched over
//! REST or received from the gateway.
//!
//! ## Features
//!
//! - **`CacheStore`**: the backing-store trait (get/set/delete)
//! - **`MemoryStore`**: the bundled concurrent in-memory backing
//! - **`CacheManager`**: named sub-caches (`user`, `guild`, `channel`, ...)
//!   lazily materialized with a configurable default backing
//!
//! ## Example
//!
//! ```ignore
//! use cord_cache::CacheManager;
//!
//! let manager = CacheManager::new();
//! let users = manager.cache("user");
//!
//! users.set("123", serde_json::json!({"username": "quill"})).await;
//! let hit = users.get("123").await;
//! ```

pub mod manager;
pub mod store;

pub use manager::CacheManager;
pub use store::{Cache, CacheStore, MemoryStore};
