//! Client configuration
//!
//! Loads configuration from structured sources (environment, config files)
//! via serde; every field beyond the token has a sensible default.

use serde::Deserialize;

/// REST and gateway API version this library speaks
pub const API_VERSION: u8 = 10;

/// Default REST base URL (`/v{API_VERSION}/...` is appended per request)
pub const DEFAULT_API_BASE: &str = "https://cord.chat/api";

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Bot token; the `Bot ` authorization prefix is added when missing
    pub token: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "crate::default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub gateway: GatewayOptions,
}

/// Gateway connection options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayOptions {
    /// Enable zlib-stream transport compression
    #[serde(default)]
    pub compress: bool,

    /// Gateway intents bitfield
    #[serde(default)]
    pub intents: Option<u64>,

    /// Shard index (defaults to the only shard)
    #[serde(default)]
    pub shard_index: u64,

    /// Total shard count
    #[serde(default = "default_shard_total")]
    pub shard_total: u64,

    /// Guild member threshold above which offline members are not sent
    #[serde(default)]
    pub large_threshold: Option<u32>,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: default_api_base(),
            user_agent: crate::default_user_agent(),
            gateway: GatewayOptions::default(),
        }
    }

    /// Override the REST base URL (primarily for tests and proxies)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Enable zlib-stream compression on the gateway
    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.gateway.compress = compress;
        self
    }

    /// Set the gateway intents bitfield
    #[must_use]
    pub fn with_intents(mut self, intents: u64) -> Self {
        self.gateway.intents = Some(intents);
        self
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_shard_total() -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("token123");
        assert_eq!(config.token, "token123");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(!config.gateway.compress);
        assert_eq!(config.gateway.shard_total, 1);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"token": "t", "gateway": {"compress": true, "intents": 513}}"#,
        )
        .unwrap();
        assert!(config.gateway.compress);
        assert_eq!(config.gateway.intents, Some(513));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::new("t")
            .with_api_base("http://127.0.0.1:9999/api")
            .with_intents(7);
        assert_eq!(config.api_base, "http://127.0.0.1:9999/api");
        assert_eq!(config.gateway.intents, Some(7));
    }
}
