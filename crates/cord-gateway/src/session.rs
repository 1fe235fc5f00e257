//! Gateway session record
//!
//! `(id, seq)` is everything a RESUME needs: the id latched from READY and
//! the last sequence number seen on any dispatch. Both are absent until
//! READY and cleared when the server invalidates the session.

use std::sync::{Mutex, PoisonError};

/// Resume state for one gateway connection
#[derive(Debug, Default)]
pub struct Session {
    id: Mutex<Option<String>>,
    seq: Mutex<Option<u64>>,
}

impl Session {
    /// Empty session (next handshake identifies)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Server-assigned session id, once READY has arrived
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.id.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Last sequence number seen
    #[must_use]
    pub fn seq(&self) -> Option<u64> {
        *self.seq.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latch the id from READY
    pub fn set_id(&self, id: String) {
        *self.id.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    /// Record the sequence number of an incoming payload
    pub fn observe_seq(&self, seq: u64) {
        *self.seq.lock().unwrap_or_else(PoisonError::into_inner) = Some(seq);
    }

    /// Whether the stored state supports a RESUME handshake
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        self.id().is_some() && self.seq().is_some()
    }

    /// Forget everything; the next handshake must IDENTIFY
    pub fn clear(&self) {
        *self.id.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *self.seq.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
