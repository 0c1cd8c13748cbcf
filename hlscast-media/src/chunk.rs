//! Timed media fragments produced by a device stream

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A bounded fragment of captured media
///
/// Chunks are never retained: they are either forwarded to the event sink or
/// dropped on the spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Raw container fragment
    pub payload: Bytes,
    /// When the device handed the fragment over
    pub captured_at: DateTime<Utc>,
}

impl Chunk {
    /// Create a chunk captured now
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            captured_at: Utc::now(),
        }
    }

    /// Payload size in bytes
    pub fn size_bytes(&self) -> usize {
        self.payload.len()
    }

    /// Whether the chunk carries no data
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
