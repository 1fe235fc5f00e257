//! Gateway info endpoints
//!
//! `GET /gateway` and `GET /gateway/bot` are how a client learns where the
//! WebSocket lives and how many shards to run.

use cord_rest::{RequestOptions, Rest, RestError, Route};
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;

/// Response of `GET /gateway`
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayInfo {
    pub url: String,
}

/// Response of `GET /gateway/bot`
#[derive(Debug, Clone, Deserialize)]
pub struct BotGatewayInfo {
    pub url: String,
    pub shards: u64,
    pub session_start_limit: SessionStartLimit,
}

/// Identify budget attached to `GET /gateway/bot`
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStartLimit {
    pub total: u64,
    pub remaining: u64,
    /// Milliseconds until the budget refills
    pub reset_after: u64,
    #[serde(default = "default_concurrency")]
    pub max_concurrency: u64,
}

fn default_concurrency() -> u64 {
    1
}

/// Gateway info endpoint group
pub struct GatewayApi<'a> {
    rest: &'a Arc<Rest>,
}

impl<'a> GatewayApi<'a> {
    #[must_use]
    pub fn new(rest: &'a Arc<Rest>) -> Self {
        Self { rest }
    }

    /// `GET /gateway`
    pub async fn get(&self) -> Result<GatewayInfo, RestError> {
        self.rest
            .fire(Route::new(Method::GET, "/gateway"), RequestOptions::new())
            .await
    }

    /// `GET /gateway/bot`
    pub async fn get_bot(&self) -> Result<BotGatewayInfo, RestError> {
        self.rest
            .fire(Route::new(Method::GET, "/gateway/bot"), RequestOptions::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_gateway_info_decodes() {
        let info: BotGatewayInfo = serde_json::from_str(
            r#"{
                "url": "wss://gateway.example",
                "shards": 2,
                "session_start_limit": {"total": 1000, "remaining": 999, "reset_after": 14400000}
            }"#,
        )
        .unwrap();

        assert_eq!(info.url, "wss://gateway.example");
        assert_eq!(info.shards, 2);
        assert_eq!(info.session_start_limit.max_concurrency, 1);
    }
}
