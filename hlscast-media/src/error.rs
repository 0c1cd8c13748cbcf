//! Media error types and handling
//!
//! This module defines the error types used by the capture and playback
//! components. Device errors are terminal for a capture session; playback
//! engine errors are always reported and never fatal.

use hlscast_core::HlsCastError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to obtain a device stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The user or platform refused access to the device
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// No device satisfies the requested constraints
    #[error("No device matches constraints: {constraints}")]
    NotFound {
        /// Human readable constraints that could not be met
        constraints: String,
    },

    /// The device exists but could not be opened
    #[error("Device unavailable: {reason}")]
    Unavailable {
        /// Failure reason
        reason: String,
    },
}

/// Class of a playback engine error, as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackErrorKind {
    /// Manifest or segment could not be fetched
    Network,
    /// Media could not be decoded or appended
    Media,
    /// Container could not be demuxed/remuxed
    Mux,
    /// Anything else
    Other,
}

/// Error reported by the playback engine or the media element
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Playback error ({kind:?}, fatal: {fatal}): {details}")]
pub struct PlaybackEngineError {
    /// Error class
    pub kind: PlaybackErrorKind,
    /// Engine-specific details
    pub details: String,
    /// Whether the engine itself considers the error fatal
    pub fatal: bool,
}

impl PlaybackEngineError {
    /// Create a new playback error
    pub fn new(kind: PlaybackErrorKind, details: impl Into<String>, fatal: bool) -> Self {
        Self {
            kind,
            details: details.into(),
            fatal,
        }
    }
}

/// Main error type for media operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// Device acquisition failed
    #[error("Device error: {source}")]
    Device {
        #[from]
        source: DeviceError,
    },

    /// Playback engine failed
    #[error("Playback error: {source}")]
    Playback {
        #[from]
        source: PlaybackEngineError,
    },

    /// Event channel failure
    #[error("Channel error: {source}")]
    Channel {
        #[from]
        source: HlsCastError,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Invalid state for operation
    #[error("Invalid state: {message}")]
    InvalidState {
        /// State error message
        message: String,
    },

    /// The device stream failed while in use
    #[error("Device stream failure: {reason}")]
    DeviceStream {
        /// Failure reason
        reason: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::Device { .. } => false,
            MediaError::Playback { .. } => true,
            MediaError::Channel { .. } => false,
            MediaError::InvalidConfiguration { .. } => false,
            MediaError::InvalidState { .. } => true,
            MediaError::DeviceStream { .. } => true,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::Device { .. } => ErrorCategory::Device,
            MediaError::Playback { .. } => ErrorCategory::Playback,
            MediaError::Channel { .. } => ErrorCategory::Channel,
            MediaError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            MediaError::InvalidState { .. } => ErrorCategory::State,
            MediaError::DeviceStream { .. } => ErrorCategory::Device,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration and parameter errors
    Configuration,
    /// Device and hardware errors
    Device,
    /// State management errors
    State,
    /// Playback engine errors
    Playback,
    /// Event channel errors
    Channel,
}
