//! # hlscast Signaling
//!
//! WebSocket event channel between the capture/playback client and the
//! backend. Outbound `"chunk"` and `"stop"` events are queued and written by a
//! background task; inbound control frames are turned into
//! [`InboundEvent`](hlscast_core::InboundEvent)s.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod protocol;

// Re-export main types
pub use client::{ChannelStats, SignalingClient, WsEventSink};
pub use error::SignalingError;
pub use protocol::{
    decode_chunk_frame, decode_outbound, encode_chunk_frame, encode_outbound, ControlMessage,
};
