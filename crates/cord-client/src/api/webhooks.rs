//! Webhook endpoints
//!
//! `webhook_id` is a major parameter, so webhook routes bucket separately
//! from anything channel- or guild-scoped.

use cord_common::{Maybe, Snowflake};
use cord_rest::{RequestOptions, Rest, RestError, Route};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Body of `POST /webhooks/{id}/{token}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecuteWebhook {
    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub content: Maybe<String>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub username: Maybe<String>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub avatar_url: Maybe<String>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub embeds: Maybe<Vec<Value>>,
}

impl ExecuteWebhook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Maybe::Present(content.into());
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Maybe::Present(username.into());
        self
    }
}

/// Webhook endpoint group
pub struct WebhooksApi<'a> {
    rest: &'a Arc<Rest>,
}

impl<'a> WebhooksApi<'a> {
    #[must_use]
    pub fn new(rest: &'a Arc<Rest>) -> Self {
        Self { rest }
    }

    /// `GET /webhooks/{webhook_id}`
    pub async fn get(&self, webhook_id: Snowflake) -> Result<Value, RestError> {
        self.rest
            .fire(
                Route::new(Method::GET, "/webhooks/%{webhook_id}").param("webhook_id", webhook_id),
                RequestOptions::new(),
            )
            .await
    }

    /// `POST /webhooks/{webhook_id}/{webhook_token}`
    pub async fn execute(
        &self,
        webhook_id: Snowflake,
        token: &str,
        body: ExecuteWebhook,
    ) -> Result<Option<Value>, RestError> {
        self.rest
            .request(
                Route::new(Method::POST, "/webhooks/%{webhook_id}/%{webhook_token}")
                    .param("webhook_id", webhook_id)
                    .param("webhook_token", token),
                RequestOptions::new().json(serde_json::to_value(&body)?),
            )
            .await
    }

    /// `DELETE /webhooks/{webhook_id}`
    pub async fn delete(
        &self,
        webhook_id: Snowflake,
        reason: Option<&str>,
    ) -> Result<(), RestError> {
        let mut options = RequestOptions::new();
        if let Some(reason) = reason {
            options = options.reason(reason);
        }
        self.rest
            .fire(
                Route::new(Method::DELETE, "/webhooks/%{webhook_id}")
                    .param("webhook_id", webhook_id),
                options,
            )
            .await
    }
}
