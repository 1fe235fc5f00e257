//! reqwest-backed HTTP transport
//!
//! Owns the base `reqwest::Client` plus the headers every request carries:
//! the `Bot`-prefixed authorization and the library `User-Agent`.

use crate::error::RestError;
use crate::limiter::Transport;
use crate::request::{RequestBody, RestRequest, RestResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};

/// Concrete transport over `reqwest`
pub struct HttpClient {
    http: reqwest::Client,
    authorization: HeaderValue,
    user_agent: HeaderValue,
}

impl HttpClient {
    /// Build a transport for a bot token
    ///
    /// The `Bot ` prefix is enforced whether or not the caller included it.
    pub fn new(token: &str) -> Result<Self, RestError> {
        Self::with_user_agent(token, &cord_common::default_user_agent())
    }

    /// Build a transport with a custom `User-Agent`
    pub fn with_user_agent(token: &str, user_agent: &str) -> Result<Self, RestError> {
        let token = token.trim();
        let authorization = if token.starts_with("Bot ") {
            token.to_string()
        } else {
            format!("Bot {token}")
        };

        let mut authorization = HeaderValue::from_str(&authorization)
            .map_err(|_| RestError::InvalidRequest("token is not a valid header value".into()))?;
        authorization.set_sensitive(true);

        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|_| RestError::InvalidRequest("user agent is not a valid header value".into()))?;

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            authorization,
            user_agent,
        })
    }

    fn build_form(form: crate::request::Multipart) -> Result<Form, RestError> {
        let mut multipart = Form::new();

        if let Some(payload) = form.payload_json {
            multipart = multipart.text("payload_json", serde_json::to_string(&payload)?);
        }

        for (index, file) in form.files.into_iter().enumerate() {
            let mut part = Part::bytes(file.data).file_name(file.filename);
            if let Some(content_type) = &file.content_type {
                part = part
                    .mime_str(content_type)
                    .map_err(RestError::Transport)?;
            }
            multipart = multipart.part(index.to_string(), part);
        }

        Ok(multipart)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn perform(&self, request: RestRequest) -> Result<RestResponse, RestError> {
        let trace = request.ctx.trace.clone();

        let mut builder = self
            .http
            .request(request.method, request.url)
            .header(AUTHORIZATION, self.authorization.clone())
            .header(USER_AGENT, self.user_agent.clone())
            .headers(request.headers);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(Self::build_form(form)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::trace!(
            trace = %trace,
            status = %status,
            bytes = body.len(),
            "response received"
        );

        Ok(RestResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}
