//! # hlscast Core
//!
//! Shared building blocks for the hlscast capture/playback bridge: the error
//! type and the event channel model that connects the capture side to the
//! backend and the backend to the playback side.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod error;

// Re-export main types
pub use channel::{
    local_channel, ChunkMetadata, EventSink, InboundEvent, InboundReceiver, InboundSender,
    LocalBackend, LocalEventSink, OutboundEvent, CHUNK_MIME_TYPE,
};
pub use error::HlsCastError;
