//! Wire protocol of the event channel
//!
//! Two frame kinds travel over the socket:
//!
//! - control frames: WebSocket text carrying `{"event": <name>, "payload": {...}}`
//! - chunk frames: WebSocket binary laid out as
//!
//! ```text
//! +----------------+----------------------+-----------------+
//! | meta_len (u32) | metadata JSON        | payload bytes   |
//! | big endian     | meta_len bytes       | rest of frame   |
//! +----------------+----------------------+-----------------+
//! ```

use crate::error::SignalingError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use hlscast_core::{ChunkMetadata, InboundEvent, OutboundEvent};
use serde::{Deserialize, Serialize};
use tungstenite::Message;

/// Size of the metadata length prefix
pub const CHUNK_HEADER_LEN: usize = 4;

/// Named event with a JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Event name
    pub event: String,
    /// Event payload, an empty object when the event carries nothing
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ControlMessage {
    /// Control message with an empty payload
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            payload: empty_payload(),
        }
    }

    /// Serialize to the JSON text sent over the socket
    pub fn encode(&self) -> Result<String, SignalingError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse JSON text received from the socket
    pub fn decode(text: &str) -> Result<Self, SignalingError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Interpret as a backend-to-client event
    pub fn to_inbound(&self) -> Result<InboundEvent, SignalingError> {
        Ok(InboundEvent::from_name(&self.event)?)
    }
}

impl From<InboundEvent> for ControlMessage {
    fn from(event: InboundEvent) -> Self {
        ControlMessage::new(event.name())
    }
}

/// Encode a chunk into a binary frame
pub fn encode_chunk_frame(
    metadata: &ChunkMetadata,
    payload: &[u8],
) -> Result<Bytes, SignalingError> {
    let meta = serde_json::to_vec(metadata)?;
    let mut buf = BytesMut::with_capacity(CHUNK_HEADER_LEN + meta.len() + payload.len());
    buf.put_u32(meta.len() as u32);
    buf.put_slice(&meta);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Decode a binary frame into chunk metadata and payload
pub fn decode_chunk_frame(frame: Bytes) -> Result<(ChunkMetadata, Bytes), SignalingError> {
    if frame.len() < CHUNK_HEADER_LEN {
        return Err(SignalingError::TruncatedFrame {
            expected: CHUNK_HEADER_LEN,
            actual: frame.len(),
        });
    }

    let mut frame = frame;
    let meta_len = frame.get_u32() as usize;
    if frame.remaining() < meta_len {
        return Err(SignalingError::TruncatedFrame {
            expected: CHUNK_HEADER_LEN + meta_len,
            actual: CHUNK_HEADER_LEN + frame.remaining(),
        });
    }

    let meta = frame.split_to(meta_len);
    let metadata: ChunkMetadata = serde_json::from_slice(&meta)?;
    Ok((metadata, frame))
}

/// Encode an outbound event as a WebSocket message
pub fn encode_outbound(event: &OutboundEvent) -> Result<Message, SignalingError> {
    match event {
        OutboundEvent::Chunk { metadata, payload } => {
            let frame = encode_chunk_frame(metadata, payload)?;
            Ok(Message::Binary(frame.to_vec()))
        }
        OutboundEvent::Stop => Ok(Message::Text(ControlMessage::new(event.name()).encode()?)),
    }
}

/// Decode a WebSocket message into an outbound event
///
/// This is the backend's view of the channel. Ping, pong and close frames
/// yield `None`.
pub fn decode_outbound(message: Message) -> Result<Option<OutboundEvent>, SignalingError> {
    match message {
        Message::Binary(data) => {
            let (metadata, payload) = decode_chunk_frame(Bytes::from(data))?;
            Ok(Some(OutboundEvent::Chunk { metadata, payload }))
        }
        Message::Text(text) => {
            let control = ControlMessage::decode(&text)?;
            match control.event.as_str() {
                "stop" => Ok(Some(OutboundEvent::Stop)),
                other => Err(SignalingError::UnknownEvent {
                    name: other.to_string(),
                }),
            }
        }
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => Ok(None),
        Message::Frame(_) => Err(SignalingError::UnexpectedFrame {
            kind: "raw frame".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hlscast_core::CHUNK_MIME_TYPE;
    use uuid::Uuid;

    fn metadata(size_bytes: usize) -> ChunkMetadata {
        ChunkMetadata {
            session_id: Uuid::new_v4(),
            sequence: 7,
            size_bytes,
            captured_at: Utc::now(),
            mime_type: CHUNK_MIME_TYPE.to_string(),
        }
    }

    #[test]
    fn test_chunk_frame_layout() {
        let meta = metadata(4);
        let frame = encode_chunk_frame(&meta, &[0xde, 0xad, 0xbe, 0xef]).unwrap();

        let meta_len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(frame.len(), CHUNK_HEADER_LEN + meta_len + 4);
        assert_eq!(&frame[frame.len() - 4..], &[0xde, 0xad, 0xbe, 0xef]);

        let (decoded, payload) = decode_chunk_frame(frame).unwrap();
        assert_eq!(decoded, meta);
        assert_eq!(payload.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_truncated_frames() {
        let short = decode_chunk_frame(Bytes::from_static(&[0, 0]));
        assert!(matches!(
            short,
            Err(SignalingError::TruncatedFrame {
                expected: 4,
                actual: 2
            })
        ));

        // Header claims 100 bytes of metadata, only 3 follow
        let lying = decode_chunk_frame(Bytes::from_static(&[0, 0, 0, 100, b'{', b'}', b' ']));
        assert!(matches!(
            lying,
            Err(SignalingError::TruncatedFrame {
                expected: 104,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_control_message_wire_format() {
        let stop = ControlMessage::new("stop").encode().unwrap();
        assert_eq!(stop, r#"{"event":"stop","payload":{}}"#);

        let ready = ControlMessage::decode(r#"{"event":"playlist_ready"}"#).unwrap();
        assert_eq!(ready.payload, serde_json::json!({}));
        assert_eq!(ready.to_inbound().unwrap(), InboundEvent::PlaylistReady);

        let unknown = ControlMessage::decode(r#"{"event":"reload","payload":{}}"#).unwrap();
        assert!(matches!(
            unknown.to_inbound(),
            Err(SignalingError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn test_outbound_messages() {
        let stop = encode_outbound(&OutboundEvent::Stop).unwrap();
        assert!(matches!(stop, Message::Text(_)));
        assert_eq!(decode_outbound(stop).unwrap(), Some(OutboundEvent::Stop));

        let chunk = OutboundEvent::Chunk {
            metadata: metadata(2),
            payload: Bytes::from_static(&[1, 2]),
        };
        let message = encode_outbound(&chunk).unwrap();
        assert!(matches!(message, Message::Binary(_)));
        assert_eq!(decode_outbound(message).unwrap(), Some(chunk));

        assert_eq!(decode_outbound(Message::Ping(vec![])).unwrap(), None);
    }
}
