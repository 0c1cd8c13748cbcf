//! Error types for the WebSocket event channel

use hlscast_core::HlsCastError;
use thiserror::Error;

/// Errors raised while talking to the backend over WebSocket
#[derive(Error, Debug)]
pub enum SignalingError {
    /// The WebSocket handshake did not complete
    #[error("Failed to connect to {url}: {source}")]
    ConnectionFailed {
        /// Endpoint that was dialed
        url: String,
        /// Underlying WebSocket error
        #[source]
        source: tungstenite::Error,
    },

    /// Error on an established connection
    #[error("WebSocket error: {source}")]
    WebSocket {
        /// Underlying WebSocket error
        #[from]
        source: tungstenite::Error,
    },

    /// Control frame could not be (de)serialized
    #[error("Malformed control frame: {source}")]
    Serialization {
        /// JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Binary chunk frame shorter than its header claims
    #[error("Truncated chunk frame: need {expected} bytes, got {actual}")]
    TruncatedFrame {
        /// Bytes required
        expected: usize,
        /// Bytes present
        actual: usize,
    },

    /// Event name this side does not understand
    #[error("Unknown event: {name}")]
    UnknownEvent {
        /// Event name as received
        name: String,
    },

    /// Frame type that carries no event
    #[error("Unexpected frame: {kind}")]
    UnexpectedFrame {
        /// Frame kind
        kind: String,
    },

    /// The connection is gone
    #[error("Connection closed")]
    Closed,
}

impl SignalingError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            SignalingError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            SignalingError::WebSocket { .. } => "WEBSOCKET_ERROR",
            SignalingError::Serialization { .. } => "SERIALIZATION_ERROR",
            SignalingError::TruncatedFrame { .. } => "TRUNCATED_FRAME",
            SignalingError::UnknownEvent { .. } => "UNKNOWN_EVENT",
            SignalingError::UnexpectedFrame { .. } => "UNEXPECTED_FRAME",
            SignalingError::Closed => "CONNECTION_CLOSED",
        }
    }
}

impl From<HlsCastError> for SignalingError {
    fn from(error: HlsCastError) -> Self {
        match error {
            HlsCastError::UnknownEvent { name } => SignalingError::UnknownEvent { name },
            HlsCastError::ChannelClosed { .. } => SignalingError::Closed,
            other => SignalingError::UnexpectedFrame {
                kind: other.to_string(),
            },
        }
    }
}

impl From<SignalingError> for HlsCastError {
    fn from(error: SignalingError) -> Self {
        HlsCastError::Transport {
            reason: error.to_string(),
        }
    }
}
