//! Rate-limit middleware
//!
//! Wraps an HTTP transport. Requests sharing a rate-limit key serialize
//! behind a per-key mutex held for the whole request/response cycle;
//! every request additionally passes the global bucket's barrier. Known
//! exhausted buckets trigger a pre-emptive sleep before the transport is
//! touched, and response headers always feed the bucket table afterwards.

use crate::bucket::{is_global, BucketTable};
use crate::error::RestError;
use crate::request::{RestRequest, RestResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// The HTTP transport seam the middleware wraps
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange
    async fn perform(&self, request: RestRequest) -> Result<RestResponse, RestError>;
}

/// Serializing, header-driven rate-limit middleware
pub struct RateLimiter {
    inner: Arc<dyn Transport>,
    table: Arc<BucketTable>,
    // grows with the set of exercised endpoint templates x major ids
    keys: DashMap<String, Arc<Mutex<()>>>,
}

impl RateLimiter {
    /// Wrap a transport with a fresh bucket table
    #[must_use]
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self {
            inner,
            table: Arc::new(BucketTable::new()),
            keys: DashMap::new(),
        }
    }

    /// The shared bucket table
    #[must_use]
    pub fn table(&self) -> &Arc<BucketTable> {
        &self.table
    }

    fn key_mutex(&self, key: &str) -> Arc<Mutex<()>> {
        self.keys
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run one request through the key mutex, the global barrier, the
    /// pre-emptive sleep, the transport, and the post-response update
    pub async fn perform(&self, request: RestRequest) -> Result<RestResponse, RestError> {
        let ctx = request.ctx.clone();

        let serial = self.key_mutex(&ctx.rl_key);
        let _serial = serial.lock().await;

        if let Some(global) = self.table.global() {
            global.wait_until_available().await;
        }

        if let Some(bucket) = self.table.lookup(&ctx.rl_key) {
            if bucket.will_limit(Instant::now()) {
                tracing::debug!(
                    trace = %ctx.trace,
                    key = %ctx.rl_key,
                    "bucket exhausted, sleeping until reset"
                );
                bucket.lock_until_reset().await;
            }
        }

        let result = self.inner.perform(request).await;

        if let Ok(response) = &result {
            self.table.observe(&ctx.rl_key, &response.headers, &ctx.trace);

            if response.status.as_u16() == 429 && is_global(&response.headers) {
                if let Some(global) = self.table.global_lock(&response.headers, &ctx.trace) {
                    // background holder so every key blocks at the barrier
                    tokio::spawn(async move { global.lock_until_reset().await });
                }
            }
        }

        result
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("tracked_keys", &self.keys.len())
            .finish_non_exhaustive()
    }
}
