//! zlib-stream inflater
//!
//! With transport compression the server shares one zlib stream across the
//! whole connection and fragments logical messages over multiple WebSocket
//! frames. A message is complete only when the accumulated compressed
//! bytes end with the sync-flush suffix `00 00 FF FF`. The stream context
//! must survive between messages and be reset on every reconnect.

use crate::error::GatewayError;
use flate2::{Decompress, FlushDecompress, Status};

/// Fragment boundary of the shared zlib stream
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

const INFLATE_CHUNK: usize = 16 * 1024;

/// Streaming decompression state for one gateway connection
#[derive(Debug)]
pub struct Inflater {
    stream: Decompress,
    pending: Vec<u8>,
}

impl Inflater {
    /// Fresh stream context
    #[must_use]
    pub fn new() -> Self {
        Self {
            stream: Decompress::new(true),
            pending: Vec::new(),
        }
    }

    /// Drop all stream state; must be called on reconnect
    pub fn reset(&mut self) {
        self.stream.reset(true);
        self.pending.clear();
    }

    /// Bytes buffered while waiting for the fragment boundary
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed one WebSocket frame
    ///
    /// Returns the inflated logical message once the suffix arrives,
    /// `None` while a message is still fragmented.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<Vec<u8>>, GatewayError> {
        self.pending.extend_from_slice(chunk);

        if self.pending.len() < ZLIB_SUFFIX.len() || !self.pending.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let mut out = Vec::with_capacity(self.pending.len().max(INFLATE_CHUNK));
        let mut offset = 0usize;

        while offset < self.pending.len() {
            out.reserve(INFLATE_CHUNK);
            let consumed_before = self.stream.total_in();
            let status = self
                .stream
                .decompress_vec(&self.pending[offset..], &mut out, FlushDecompress::Sync)
                .map_err(|e| GatewayError::Codec(format!("inflate: {e}")))?;
            offset += (self.stream.total_in() - consumed_before) as usize;

            if status == Status::StreamEnd {
                break;
            }
        }

        self.pending.clear();
        Ok(Some(out))
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}
