//! The client facade
//!
//! Domain objects are plain data; anything that needs a "parent" looks it
//! up by id through the cache manager rather than holding back-pointers.

use crate::api::{ChannelsApi, GatewayApi, GuildsApi, UsersApi, WebhooksApi};
use crate::error::ClientError;
use cord_cache::CacheManager;
use cord_common::ClientConfig;
use cord_gateway::{Shard, ShardConfig};
use cord_rest::Rest;
use std::sync::Arc;

/// One bot's view of the platform
pub struct Client {
    config: ClientConfig,
    rest: Arc<Rest>,
    cache: Arc<CacheManager>,
}

impl Client {
    /// Client with default configuration
    pub fn new(token: impl Into<String>) -> Result<Self, ClientError> {
        Self::from_config(ClientConfig::new(token))
    }

    /// Client from a full configuration
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let rest = Rest::with_base(&config.token, &config.api_base)?;
        Ok(Self {
            config,
            rest: Arc::new(rest),
            cache: Arc::new(CacheManager::new()),
        })
    }

    /// The REST dispatcher
    #[must_use]
    pub fn rest(&self) -> &Arc<Rest> {
        &self.rest
    }

    /// The cache manager
    #[must_use]
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Gateway info endpoints
    #[must_use]
    pub fn gateway(&self) -> GatewayApi<'_> {
        GatewayApi::new(&self.rest)
    }

    /// Channel and message endpoints
    #[must_use]
    pub fn channels(&self) -> ChannelsApi<'_> {
        ChannelsApi::new(&self.rest)
    }

    /// Guild endpoints
    #[must_use]
    pub fn guilds(&self) -> GuildsApi<'_> {
        GuildsApi::new(&self.rest)
    }

    /// User endpoints
    #[must_use]
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(&self.rest)
    }

    /// Webhook endpoints
    #[must_use]
    pub fn webhooks(&self) -> WebhooksApi<'_> {
        WebhooksApi::new(&self.rest)
    }

    /// Build a shard for this bot, resolving the gateway URL over REST
    pub async fn shard(&self) -> Result<Arc<Shard>, ClientError> {
        let info = self.gateway().get_bot().await?;
        tracing::debug!(
            url = %info.url,
            shards = info.shards,
            remaining_starts = info.session_start_limit.remaining,
            "gateway info resolved"
        );
        self.shard_at(&info.url, self.config.gateway.shard_index, info.shards)
    }

    /// Build one shard of a known total against a known gateway URL
    pub fn shard_at(
        &self,
        gateway_url: &str,
        index: u64,
        total: u64,
    ) -> Result<Arc<Shard>, ClientError> {
        let gateway = &self.config.gateway;
        let mut shard_config = ShardConfig::new(&self.config.token)
            .shard(index, total.max(1))
            .compress(gateway.compress);

        if let Some(intents) = gateway.intents {
            shard_config = shard_config.intents(intents);
        }
        if let Some(threshold) = gateway.large_threshold {
            shard_config = shard_config.large_threshold(threshold);
        }

        Ok(Shard::new(gateway_url, shard_config)?)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_base", &self.config.api_base)
            .finish_non_exhaustive()
    }
}
