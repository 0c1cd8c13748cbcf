//! Error types for hlscast

use thiserror::Error;

/// Main error type for the hlscast event channel and session plumbing
#[derive(Error, Debug)]
pub enum HlsCastError {
    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },

    /// The other end of the event channel has gone away
    #[error("Event channel closed while sending {event}")]
    ChannelClosed {
        /// Name of the event that could not be delivered
        event: String,
    },

    /// Inbound event name that this side does not understand
    #[error("Unknown event: {name}")]
    UnknownEvent {
        /// Event name as received
        name: String,
    },

    /// Transport error
    #[error("Transport error: {reason}")]
    Transport {
        /// Reason for transport error
        reason: String,
    },
}

impl HlsCastError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            HlsCastError::MissingConfiguration { .. } => "MISSING_CONFIGURATION".to_string(),
            HlsCastError::ChannelClosed { .. } => "CHANNEL_CLOSED".to_string(),
            HlsCastError::UnknownEvent { .. } => "UNKNOWN_EVENT".to_string(),
            HlsCastError::Transport { .. } => "TRANSPORT_ERROR".to_string(),
        }
    }
}
