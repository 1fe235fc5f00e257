//! Guild endpoints

use cord_common::{Maybe, Snowflake};
use cord_rest::{RequestOptions, Rest, RestError, Route};
use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Body of `PATCH /guilds/{id}`
///
/// `icon: Null` clears the icon; `Absent` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModifyGuild {
    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub name: Maybe<String>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub icon: Maybe<String>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub afk_channel_id: Maybe<Snowflake>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub afk_timeout: Maybe<u32>,
}

impl ModifyGuild {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Maybe::Present(name.into());
        self
    }

    #[must_use]
    pub fn clear_icon(mut self) -> Self {
        self.icon = Maybe::Null;
        self
    }
}

/// Guild endpoint group
pub struct GuildsApi<'a> {
    rest: &'a Arc<Rest>,
}

impl<'a> GuildsApi<'a> {
    #[must_use]
    pub fn new(rest: &'a Arc<Rest>) -> Self {
        Self { rest }
    }

    /// `GET /guilds/{guild_id}`
    pub async fn get(&self, guild_id: Snowflake) -> Result<Value, RestError> {
        self.rest
            .fire(
                Route::new(Method::GET, "/guilds/%{guild_id}").param("guild_id", guild_id),
                RequestOptions::new(),
            )
            .await
    }

    /// `PATCH /guilds/{guild_id}`
    pub async fn modify(
        &self,
        guild_id: Snowflake,
        changes: ModifyGuild,
        reason: Option<&str>,
    ) -> Result<Value, RestError> {
        let mut options = RequestOptions::new().json(serde_json::to_value(&changes)?);
        if let Some(reason) = reason {
            options = options.reason(reason);
        }
        self.rest
            .fire(
                Route::new(Method::PATCH, "/guilds/%{guild_id}").param("guild_id", guild_id),
                options,
            )
            .await
    }

    /// `GET /guilds/{guild_id}/channels`
    pub async fn channels(&self, guild_id: Snowflake) -> Result<Vec<Value>, RestError> {
        self.rest
            .fire(
                Route::new(Method::GET, "/guilds/%{guild_id}/channels")
                    .param("guild_id", guild_id),
                RequestOptions::new(),
            )
            .await
    }

    /// `GET /guilds/{guild_id}/widget.png`, returned as raw image bytes
    pub async fn widget_image(&self, guild_id: Snowflake) -> Result<Bytes, RestError> {
        self.rest
            .request_bytes(
                Route::new(Method::GET, "/guilds/%{guild_id}/widget.png")
                    .param("guild_id", guild_id),
                RequestOptions::new(),
            )
            .await
    }

    /// `DELETE /users/@me/guilds/{guild_id}` (leave the guild)
    pub async fn leave(&self, guild_id: Snowflake) -> Result<(), RestError> {
        self.rest
            .fire(
                Route::new(Method::DELETE, "/users/@me/guilds/%{guild_id}")
                    .param("guild_id", guild_id),
                RequestOptions::new(),
            )
            .await
    }
}
