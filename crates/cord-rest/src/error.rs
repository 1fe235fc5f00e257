//! REST error types

use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

/// REST error type
///
/// Client errors (4xx) carry the decoded error envelope and the request
/// trace id; 429 never appears here because the dispatcher retries it.
#[derive(Debug, Error)]
pub enum RestError {
    /// Malformed template or missing substitution
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Request could not be assembled (bad base URL, bad header value)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("bad request [trace {trace}]: {error}")]
    BadRequest { error: ApiError, trace: String },

    #[error("unauthorized [trace {trace}]: {error}")]
    Unauthorized { error: ApiError, trace: String },

    #[error("forbidden [trace {trace}]: {error}")]
    Forbidden { error: ApiError, trace: String },

    #[error("not found [trace {trace}]: {error}")]
    NotFound { error: ApiError, trace: String },

    #[error("method not allowed [trace {trace}]: {error}")]
    MethodNotAllowed { error: ApiError, trace: String },

    /// 5xx from the API
    #[error("server error {status} [trace {trace}]")]
    Server { status: u16, trace: String },

    /// A status outside every contract bucket
    #[error("unexpected status {status} [trace {trace}]")]
    UnexpectedStatus { status: u16, trace: String },

    /// Underlying I/O or protocol fault in the HTTP transport
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Unparseable response body
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl RestError {
    /// The trace id attached to the failing request, when one exists
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::BadRequest { trace, .. }
            | Self::Unauthorized { trace, .. }
            | Self::Forbidden { trace, .. }
            | Self::NotFound { trace, .. }
            | Self::MethodNotAllowed { trace, .. }
            | Self::Server { trace, .. }
            | Self::UnexpectedStatus { trace, .. } => Some(trace),
            _ => None,
        }
    }

    /// The decoded API error envelope, when the response carried one
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::BadRequest { error, .. }
            | Self::Unauthorized { error, .. }
            | Self::Forbidden { error, .. }
            | Self::NotFound { error, .. }
            | Self::MethodNotAllowed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Route construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The template references a placeholder with no bound value
    #[error("missing substitution for %{{{0}}}")]
    MissingParam(String),

    /// Unterminated or otherwise broken placeholder syntax
    #[error("malformed path template: {0}")]
    MalformedTemplate(String),
}

/// Error envelope returned by the API on client errors
///
/// Wire shape: `{"code": <int>, "message": <string>, ...}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// Decode the envelope, degrading to the raw text when the body is not
    /// the documented JSON shape
    #[must_use]
    pub fn from_body(body: &Bytes) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|_| Self {
            code: 0,
            message: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Result type alias for REST operations
pub type RestResult<T> = Result<T, RestError>;
