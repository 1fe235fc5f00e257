//! Channel and message endpoints

use cord_common::{Maybe, Snowflake};
use cord_rest::{FileUpload, Multipart, RequestOptions, Rest, RestError, Route};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Body of `POST /channels/{id}/messages`
///
/// Files ride alongside as multipart parts; everything else is the JSON
/// side-payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub content: Maybe<String>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub tts: Maybe<bool>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub embeds: Maybe<Vec<Value>>,

    #[serde(skip_serializing_if = "Maybe::is_absent")]
    pub nonce: Maybe<Value>,

    #[serde(skip)]
    pub files: Vec<FileUpload>,
}

impl CreateMessage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message text
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Maybe::Present(content.into());
        self
    }

    /// Mark as text-to-speech
    #[must_use]
    pub fn tts(mut self, tts: bool) -> Self {
        self.tts = Maybe::Present(tts);
        self
    }

    /// Attach embeds
    #[must_use]
    pub fn embeds(mut self, embeds: Vec<Value>) -> Self {
        self.embeds = Maybe::Present(embeds);
        self
    }

    /// Attach one file; switches the request to multipart
    #[must_use]
    pub fn file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    fn into_options(self) -> Result<RequestOptions, RestError> {
        let files = self.files.clone();
        let payload = serde_json::to_value(&self)?;

        if files.is_empty() {
            Ok(RequestOptions::new().json(payload))
        } else {
            let mut form = Multipart::new().payload(payload);
            for file in files {
                form = form.file(file);
            }
            Ok(RequestOptions::new().multipart(form))
        }
    }
}

/// Query of `GET /channels/{id}/messages`
#[derive(Debug, Clone, Default)]
pub struct GetMessages {
    pub limit: Option<u8>,
    pub before: Option<Snowflake>,
    pub after: Option<Snowflake>,
    pub around: Option<Snowflake>,
}

impl GetMessages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limit(mut self, limit: u8) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn before(mut self, id: Snowflake) -> Self {
        self.before = Some(id);
        self
    }

    #[must_use]
    pub fn after(mut self, id: Snowflake) -> Self {
        self.after = Some(id);
        self
    }

    fn into_query(self, options: RequestOptions) -> RequestOptions {
        let mut options = options;
        if let Some(limit) = self.limit {
            options = options.query("limit", limit);
        }
        if let Some(before) = self.before {
            options = options.query("before", before);
        }
        if let Some(after) = self.after {
            options = options.query("after", after);
        }
        if let Some(around) = self.around {
            options = options.query("around", around);
        }
        options
    }
}

/// Channel endpoint group
pub struct ChannelsApi<'a> {
    rest: &'a Arc<Rest>,
}

impl<'a> ChannelsApi<'a> {
    #[must_use]
    pub fn new(rest: &'a Arc<Rest>) -> Self {
        Self { rest }
    }

    /// `GET /channels/{channel_id}`
    pub async fn get(&self, channel_id: Snowflake) -> Result<Value, RestError> {
        self.rest
            .fire(
                Route::new(Method::GET, "/channels/%{channel_id}").param("channel_id", channel_id),
                RequestOptions::new(),
            )
            .await
    }

    /// `DELETE /channels/{channel_id}`
    pub async fn delete(
        &self,
        channel_id: Snowflake,
        reason: Option<&str>,
    ) -> Result<Value, RestError> {
        let mut options = RequestOptions::new();
        if let Some(reason) = reason {
            options = options.reason(reason);
        }
        self.rest
            .fire(
                Route::new(Method::DELETE, "/channels/%{channel_id}")
                    .param("channel_id", channel_id),
                options,
            )
            .await
    }

    /// `GET /channels/{channel_id}/messages`
    pub async fn messages(
        &self,
        channel_id: Snowflake,
        query: GetMessages,
    ) -> Result<Vec<Value>, RestError> {
        self.rest
            .fire(
                Route::new(Method::GET, "/channels/%{channel_id}/messages")
                    .param("channel_id", channel_id),
                query.into_query(RequestOptions::new()),
            )
            .await
    }

    /// `POST /channels/{channel_id}/messages`
    pub async fn create_message(
        &self,
        channel_id: Snowflake,
        message: CreateMessage,
    ) -> Result<Value, RestError> {
        self.rest
            .fire(
                Route::new(Method::POST, "/channels/%{channel_id}/messages")
                    .param("channel_id", channel_id),
                message.into_options()?,
            )
            .await
    }

    /// `DELETE /channels/{channel_id}/messages/{message_id}`
    pub async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        reason: Option<&str>,
    ) -> Result<(), RestError> {
        let mut options = RequestOptions::new();
        if let Some(reason) = reason {
            options = options.reason(reason);
        }
        self.rest
            .fire(
                Route::new(
                    Method::DELETE,
                    "/channels/%{channel_id}/messages/%{message_id}",
                )
                .param("channel_id", channel_id)
                .param("message_id", message_id),
                options,
            )
            .await
    }

    /// `POST /channels/{channel_id}/typing`
    pub async fn trigger_typing(&self, channel_id: Snowflake) -> Result<(), RestError> {
        self.rest
            .fire(
                Route::new(Method::POST, "/channels/%{channel_id}/typing")
                    .param("channel_id", channel_id),
                RequestOptions::new(),
            )
            .await
    }
}
