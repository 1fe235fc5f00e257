//! Frame codec
//!
//! Turns raw socket payloads into `GatewayFrame`s and back. JSON is the
//! mandatory encoding; an alternate binary term encoding can be plugged in
//! through `TermCodec`. Asking for the term encoding without a decoder
//! installed is refused at construction.

mod inflater;

pub use inflater::{Inflater, ZLIB_SUFFIX};

use crate::error::GatewayError;
use crate::protocol::GatewayFrame;
use crate::transport::OutboundFrame;
use std::sync::Arc;

/// Payload encoding negotiated in the connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// JSON text frames
    #[default]
    Json,
    /// External term format binary frames
    Term,
}

impl Encoding {
    /// The value used for the `encoding` query parameter
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Term => "etf",
        }
    }
}

/// Pluggable binary term encoder/decoder
pub trait TermCodec: Send + Sync {
    /// Encode a frame to term bytes
    fn encode(&self, frame: &GatewayFrame) -> Result<Vec<u8>, GatewayError>;

    /// Decode term bytes to a frame
    fn decode(&self, bytes: &[u8]) -> Result<GatewayFrame, GatewayError>;
}

/// Encoding-aware frame codec
#[derive(Clone)]
pub struct FrameCodec {
    encoding: Encoding,
    term: Option<Arc<dyn TermCodec>>,
}

impl FrameCodec {
    /// Build a codec for an encoding, with an optional term decoder
    pub fn new(
        encoding: Encoding,
        term: Option<Arc<dyn TermCodec>>,
    ) -> Result<Self, GatewayError> {
        if encoding == Encoding::Term && term.is_none() {
            return Err(GatewayError::InvalidEncoding);
        }
        Ok(Self { encoding, term })
    }

    /// The mandatory JSON codec
    #[must_use]
    pub fn json() -> Self {
        Self {
            encoding: Encoding::Json,
            term: None,
        }
    }

    /// The negotiated encoding
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Encode a frame for the wire
    pub fn encode(&self, frame: &GatewayFrame) -> Result<OutboundFrame, GatewayError> {
        match self.encoding {
            Encoding::Json => Ok(OutboundFrame::Text(frame.to_json()?)),
            Encoding::Term => {
                let term = self.term.as_ref().ok_or(GatewayError::InvalidEncoding)?;
                Ok(OutboundFrame::Binary(term.encode(frame)?))
            }
        }
    }

    /// Decode a text frame (always JSON on the wire)
    pub fn decode_text(&self, text: &str) -> Result<GatewayFrame, GatewayError> {
        Ok(GatewayFrame::from_json(text)?)
    }

    /// Decode a binary payload: inflated JSON bytes, or term bytes when
    /// the term encoding is negotiated
    pub fn decode_binary(&self, bytes: &[u8]) -> Result<GatewayFrame, GatewayError> {
        match self.encoding {
            Encoding::Json => Ok(serde_json::from_slice(bytes)?),
            Encoding::Term => {
                let term = self.term.as_ref().ok_or(GatewayError::InvalidEncoding)?;
                term.decode(bytes)
            }
        }
    }
}

impl std::fmt::Debug for FrameCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCodec")
            .field("encoding", &self.encoding.name())
            .finish_non_exhaustive()
    }
}
