//! Rate-limit buckets and the bucket table
//!
//! Buckets mirror the server's quota windows. The table learns bucket ids
//! from response headers and keeps three mappings: route key to bucket id,
//! bucket id to bucket, and a route-key fallback used before the id is
//! known. Once an id is learned both resolution paths land on the same
//! bucket.

use dashmap::DashMap;
use reqwest::header::HeaderMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Reserved bucket id applied across all keys when the server signals a
/// global lockout
pub const GLOBAL_BUCKET_ID: &str = "global";

pub(crate) const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub(crate) const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub(crate) const HEADER_RESET_AFTER: &str = "x-ratelimit-reset-after";
pub(crate) const HEADER_BUCKET: &str = "x-ratelimit-bucket";
pub(crate) const HEADER_GLOBAL: &str = "x-ratelimit-global";
pub(crate) const HEADER_RETRY_AFTER: &str = "retry-after";

#[derive(Debug, Clone, Copy)]
struct BucketState {
    limit: u32,
    remaining: u32,
    reset_at: Instant,
}

/// One server-side quota window
///
/// The gate mutex is the coordination point: `wait_until_available` is a
/// barrier (acquire and release), `lock_until_reset` holds the gate for
/// the remaining window so same-bucket work queues behind it.
#[derive(Debug)]
pub struct Bucket {
    state: Mutex<BucketState>,
    gate: tokio::sync::Mutex<()>,
}

impl Bucket {
    /// Create an unconstrained bucket (one unknown slot, already reset)
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BucketState {
                limit: 1,
                remaining: 1,
                reset_at: Instant::now(),
            }),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    fn state(&self) -> BucketState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the window state from observed headers
    pub fn update(&self, limit: u32, remaining: u32, reset_at: Instant) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.limit = limit;
        state.remaining = remaining.min(limit);
        state.reset_at = reset_at;
    }

    /// Configured window size
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.state().limit
    }

    /// Requests left in the current window
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.state().remaining
    }

    /// Absolute instant the window resets
    #[must_use]
    pub fn reset_at(&self) -> Instant {
        self.state().reset_at
    }

    /// Whether the next request would be rejected by the server
    #[must_use]
    pub fn will_limit(&self, now: Instant) -> bool {
        let state = self.state();
        state.remaining == 0 && now <= state.reset_at
    }

    /// Barrier: block until the gate is free, then release immediately
    pub async fn wait_until_available(&self) {
        drop(self.gate.lock().await);
    }

    /// Hold the gate until the window resets
    ///
    /// A reset instant already in the past yields a zero wait.
    pub async fn lock_until_reset(&self) {
        let _held = self.gate.lock().await;
        let reset_at = self.state().reset_at;
        let wait = reset_at.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for Bucket {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-driven bucket registry
#[derive(Debug, Default)]
pub struct BucketTable {
    key_to_id: DashMap<String, String>,
    by_id: DashMap<String, Arc<Bucket>>,
    fallback: DashMap<String, Arc<Bucket>>,
}

impl BucketTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the bucket for a route key, preferring the id mapping
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Arc<Bucket>> {
        if let Some(id) = self.key_to_id.get(key) {
            if let Some(bucket) = self.by_id.get(id.value()) {
                return Some(bucket.clone());
            }
        }
        self.fallback.get(key).map(|bucket| bucket.clone())
    }

    /// The global bucket, once a global lockout has been observed
    #[must_use]
    pub fn global(&self) -> Option<Arc<Bucket>> {
        self.by_id.get(GLOBAL_BUCKET_ID).map(|bucket| bucket.clone())
    }

    /// Idempotently fold response headers into bucket state
    ///
    /// With a full header set the bucket is (re)bound under its server id;
    /// with only `retry-after` an exhausted bucket is installed for the
    /// key; with neither, state is untouched.
    pub fn observe(&self, key: &str, headers: &HeaderMap, trace: &str) {
        let limit = header_f64(headers, HEADER_LIMIT);
        let remaining = header_f64(headers, HEADER_REMAINING);
        let reset_after = header_f64(headers, HEADER_RESET_AFTER);
        let bucket_id = header_str(headers, HEADER_BUCKET);
        let retry_after_ms = header_f64(headers, HEADER_RETRY_AFTER);

        match (limit, remaining, reset_after, bucket_id) {
            (Some(limit), Some(remaining), Some(reset_after), Some(id)) => {
                let bucket = self
                    .by_id
                    .entry(id.clone())
                    .or_insert_with(|| Arc::new(Bucket::new()))
                    .clone();
                bucket.update(
                    limit as u32,
                    remaining as u32,
                    Instant::now() + Duration::from_secs_f64(reset_after.max(0.0)),
                );
                self.key_to_id.insert(key.to_string(), id.clone());
                self.fallback.insert(key.to_string(), bucket);

                tracing::debug!(
                    trace = %trace,
                    key = %key,
                    bucket = %id,
                    limit,
                    remaining,
                    reset_after,
                    "bucket state updated"
                );
            }
            _ => {
                if let Some(retry_after_ms) = retry_after_ms {
                    let bucket = self.lookup(key).unwrap_or_else(|| {
                        let bucket = Arc::new(Bucket::new());
                        self.fallback.insert(key.to_string(), bucket.clone());
                        bucket
                    });
                    // retry-after is milliseconds on the wire
                    let reset_in = Duration::from_secs_f64((retry_after_ms / 1000.0).max(0.0));
                    bucket.update(0, 0, Instant::now() + reset_in);

                    tracing::debug!(
                        trace = %trace,
                        key = %key,
                        retry_after_ms,
                        "exhausted bucket installed from retry-after"
                    );
                } else {
                    tracing::debug!(
                        trace = %trace,
                        key = %key,
                        "response carried no rate limit headers"
                    );
                }
            }
        }
    }

    /// Install or refresh the global bucket from a 429 carrying
    /// `x-ratelimit-global: true`; returns it so the caller can hold its
    /// gate until the reset elapses
    pub fn global_lock(&self, headers: &HeaderMap, trace: &str) -> Option<Arc<Bucket>> {
        if !is_global(headers) {
            return None;
        }
        let retry_after_ms = header_f64(headers, HEADER_RETRY_AFTER)?;

        let bucket = self
            .by_id
            .entry(GLOBAL_BUCKET_ID.to_string())
            .or_insert_with(|| Arc::new(Bucket::new()))
            .clone();
        let reset_in = Duration::from_secs_f64((retry_after_ms / 1000.0).max(0.0));
        bucket.update(0, 0, Instant::now() + reset_in);

        tracing::warn!(
            trace = %trace,
            retry_after_ms,
            "global rate limit hit, all requests will queue"
        );

        Some(bucket)
    }
}

/// Whether the response flags a global lockout
#[must_use]
pub(crate) fn is_global(headers: &HeaderMap) -> bool {
    header_str(headers, HEADER_GLOBAL)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    header_str(headers, name)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_will_limit_requires_exhaustion_within_window() {
        let bucket = Bucket::new();
        let now = Instant::now();

        bucket.update(5, 3, now + Duration::from_secs(10));
        assert!(!bucket.will_limit(now));

        bucket.update(5, 0, now + Duration::from_secs(10));
        assert!(bucket.will_limit(now));

        // window already elapsed
        bucket.update(5, 0, now - Duration::from_secs(1));
        assert!(!bucket.will_limit(now));
    }

    #[test]
    fn test_observe_binds_key_to_server_bucket() {
        let table = BucketTable::new();
        table.observe(
            "get:/channels/%{channel_id}:42",
            &headers(&[
                ("x-ratelimit-limit", "5"),
                ("x-ratelimit-remaining", "2"),
                ("x-ratelimit-reset-after", "3.5"),
                ("x-ratelimit-bucket", "abc123"),
            ]),
            "trace1",
        );

        let bucket = table.lookup("get:/channels/%{channel_id}:42").unwrap();
        assert_eq!(bucket.limit(), 5);
        assert_eq!(bucket.remaining(), 2);

        // id-keyed and fallback resolution reach the same bucket
        let by_id = table.by_id.get("abc123").unwrap().clone();
        assert!(Arc::ptr_eq(&bucket, &by_id));
    }

    #[test]
    fn test_observe_retry_after_installs_exhausted_bucket() {
        let table = BucketTable::new();
        let before = Instant::now();
        table.observe(
            "post:/x:",
            &headers(&[("retry-after", "2500.0")]),
            "trace2",
        );

        let bucket = table.lookup("post:/x:").unwrap();
        assert_eq!(bucket.limit(), 0);
        assert_eq!(bucket.remaining(), 0);
        // milliseconds on the wire: 2500 ms => ~2.5 s
        let wait = bucket.reset_at().saturating_duration_since(before);
        assert!(wait >= Duration::from_millis(2300) && wait <= Duration::from_millis(2700));
    }

    #[test]
    fn test_observe_without_headers_is_noop() {
        let table = BucketTable::new();
        table.observe("get:/y:", &HeaderMap::new(), "trace3");
        assert!(table.lookup("get:/y:").is_none());
    }

    #[test]
    fn test_global_lock_requires_flag() {
        let table = BucketTable::new();
        assert!(table
            .global_lock(&headers(&[("retry-after", "1000.0")]), "t")
            .is_none());

        let bucket = table
            .global_lock(
                &headers(&[("retry-after", "1000.0"), ("x-ratelimit-global", "true")]),
                "t",
            )
            .unwrap();
        assert_eq!(bucket.remaining(), 0);
        assert!(table.global().is_some());
    }

    #[tokio::test]
    async fn test_lock_until_reset_does_not_underflow() {
        let bucket = Bucket::new();
        bucket.update(1, 0, Instant::now() - Duration::from_secs(5));

        let started = Instant::now();
        bucket.lock_until_reset().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_barrier_waits_for_holder() {
        let bucket = Arc::new(Bucket::new());
        bucket.update(1, 0, Instant::now() + Duration::from_millis(100));

        let holder = bucket.clone();
        let handle = tokio::spawn(async move { holder.lock_until_reset().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let started = Instant::now();
        bucket.wait_until_available().await;
        assert!(started.elapsed() >= Duration::from_millis(50));
        handle.await.unwrap();
    }
}
