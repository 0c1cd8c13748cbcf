//! Event channel model shared by the capture side and the playback side
//!
//! The backend is reached through an opaque, ordered, bidirectional event
//! channel. Outbound traffic is a stream of `"chunk"` events followed by a
//! single `"stop"`; inbound traffic is the `"playlist_ready"` signal.

use crate::error::HlsCastError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// MIME type of the fragments produced by the recorder
pub const CHUNK_MIME_TYPE: &str = "video/webm; codecs=vp8";

/// Metadata sent alongside every chunk payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Capture session the chunk belongs to
    pub session_id: Uuid,
    /// Position of the chunk among forwarded chunks, starting at 0
    pub sequence: u64,
    /// Payload size in bytes
    pub size_bytes: usize,
    /// Wall-clock time the device produced the chunk
    pub captured_at: DateTime<Utc>,
    /// Container and codec of the payload
    pub mime_type: String,
}

/// Events pushed from the client to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// A media fragment
    Chunk {
        /// Chunk metadata
        metadata: ChunkMetadata,
        /// Raw container fragment
        payload: Bytes,
    },
    /// End of stream; carries no payload
    Stop,
}

impl OutboundEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Chunk { .. } => "chunk",
            OutboundEvent::Stop => "stop",
        }
    }

    /// Payload size for chunks, zero for everything else
    pub fn payload_len(&self) -> usize {
        match self {
            OutboundEvent::Chunk { payload, .. } => payload.len(),
            OutboundEvent::Stop => 0,
        }
    }
}

/// Events delivered from the backend to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundEvent {
    /// The backend has produced a consumable manifest
    PlaylistReady,
}

impl InboundEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::PlaylistReady => "playlist_ready",
        }
    }

    /// Parse an event from its wire name
    pub fn from_name(name: &str) -> Result<Self, HlsCastError> {
        match name {
            "playlist_ready" => Ok(InboundEvent::PlaylistReady),
            other => Err(HlsCastError::UnknownEvent {
                name: other.to_string(),
            }),
        }
    }
}

/// Outbound half of the event channel
///
/// `push` must not block: implementations queue the event and deliver it in
/// order. Delivery failures past the queue are the channel's concern.
pub trait EventSink: Send + Sync {
    /// Queue an event for delivery to the backend
    fn push(&self, event: OutboundEvent) -> Result<(), HlsCastError>;
}

/// Receiving end for inbound events
pub type InboundReceiver = mpsc::UnboundedReceiver<InboundEvent>;

/// Sending end for inbound events, held by whatever feeds the channel
pub type InboundSender = mpsc::UnboundedSender<InboundEvent>;

/// In-process event channel backed by unbounded mpsc queues
///
/// Useful when the backend lives in the same process, and in tests.
#[derive(Debug, Clone)]
pub struct LocalEventSink {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl EventSink for LocalEventSink {
    fn push(&self, event: OutboundEvent) -> Result<(), HlsCastError> {
        let name = event.name();
        self.tx
            .send(event)
            .map_err(|_| HlsCastError::ChannelClosed {
                event: name.to_string(),
            })
    }
}

/// Backend side of a [`LocalEventSink`] pair
#[derive(Debug)]
pub struct LocalBackend {
    /// Events pushed by the client
    pub outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    /// Use this to deliver inbound signals to the client
    pub inbound: InboundSender,
}

impl LocalBackend {
    /// Signal that the playlist can be consumed
    pub fn notify_playlist_ready(&self) -> Result<(), HlsCastError> {
        self.inbound
            .send(InboundEvent::PlaylistReady)
            .map_err(|_| HlsCastError::ChannelClosed {
                event: InboundEvent::PlaylistReady.name().to_string(),
            })
    }
}

/// Create a connected in-process channel
///
/// Returns the client-side sink, the client-side inbound receiver and the
/// backend handle.
pub fn local_channel() -> (LocalEventSink, InboundReceiver, LocalBackend) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    (
        LocalEventSink { tx: out_tx },
        in_rx,
        LocalBackend {
            outbound: out_rx,
            inbound: in_tx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn metadata(sequence: u64, size_bytes: usize) -> ChunkMetadata {
        ChunkMetadata {
            session_id: Uuid::new_v4(),
            sequence,
            size_bytes,
            captured_at: Utc::now(),
            mime_type: CHUNK_MIME_TYPE.to_string(),
        }
    }

    #[test]
    fn test_event_names() {
        let chunk = OutboundEvent::Chunk {
            metadata: metadata(0, 3),
            payload: Bytes::from_static(&[1, 2, 3]),
        };
        assert_eq!(chunk.name(), "chunk");
        assert_eq!(chunk.payload_len(), 3);
        assert_eq!(OutboundEvent::Stop.name(), "stop");
        assert_eq!(OutboundEvent::Stop.payload_len(), 0);
    }

    #[test]
    fn test_chunk_metadata_serialization() {
        let meta = metadata(4, 1200);
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"sequence\":4"));
        assert!(json.contains("\"size_bytes\":1200"));
        assert!(json.contains("video/webm; codecs=vp8"));

        let back: ChunkMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_inbound_from_name() {
        assert_eq!(
            InboundEvent::from_name("playlist_ready").unwrap(),
            InboundEvent::PlaylistReady
        );
        let err = InboundEvent::from_name("chunk").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_EVENT");
    }

    #[tokio::test]
    async fn test_local_channel_preserves_order() {
        let (sink, mut inbound, mut backend) = local_channel();

        assert_ok!(sink.push(OutboundEvent::Chunk {
            metadata: metadata(0, 2),
            payload: Bytes::from_static(&[9, 9]),
        }));
        assert_ok!(sink.push(OutboundEvent::Stop));

        assert_eq!(backend.outbound.recv().await.unwrap().name(), "chunk");
        assert_eq!(backend.outbound.recv().await.unwrap().name(), "stop");

        backend.notify_playlist_ready().unwrap();
        assert_eq!(inbound.recv().await, Some(InboundEvent::PlaylistReady));
    }

    #[test]
    fn test_push_after_backend_dropped() {
        let (sink, _inbound, backend) = local_channel();
        drop(backend);

        let err = sink.push(OutboundEvent::Stop).unwrap_err();
        match err {
            HlsCastError::ChannelClosed { event } => assert_eq!(event, "stop"),
            other => panic!("Expected ChannelClosed, got {:?}", other),
        }
    }
}
