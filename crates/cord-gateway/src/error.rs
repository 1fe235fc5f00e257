//! Gateway error types

use thiserror::Error;

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad gateway URL (scheme other than ws/wss, unparseable)
    #[error("invalid gateway url: {0}")]
    Url(String),

    /// The binary term encoding was requested without a decoder installed
    #[error("binary term encoding requested without a decoder")]
    InvalidEncoding,

    /// Unparseable or malformed frame
    #[error("codec error: {0}")]
    Codec(String),

    /// JSON encode/decode failure
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying socket fault
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection closed with a code that forbids reconnecting
    #[error("gateway closed with fatal code {code}: {reason}")]
    Fatal { code: u16, reason: String },

    /// A send was attempted with no live connection
    #[error("transport channel closed")]
    ChannelClosed,
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
