//! Error type of the facade

use crate::{HlsCastError, MediaError};
use thiserror::Error;

/// Errors surfaced by [`HlsCast`](crate::HlsCast) and bridge sessions
#[derive(Error, Debug)]
pub enum Error {
    /// Event channel or setup error
    #[error(transparent)]
    Core(#[from] HlsCastError),

    /// Capture or playback error
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Backend connection error
    #[cfg(feature = "signaling")]
    #[error(transparent)]
    Signaling(#[from] hlscast_signaling::SignalingError),

    /// The session task is gone
    #[error("Bridge session is no longer running")]
    SessionClosed,
}

impl Error {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            Error::Core(e) => e.error_code(),
            Error::Media(e) => format!("MEDIA_{:?}", e.category()).to_uppercase(),
            #[cfg(feature = "signaling")]
            Error::Signaling(e) => e.error_code().to_string(),
            Error::SessionClosed => "SESSION_CLOSED".to_string(),
        }
    }
}

/// Result alias for facade operations
pub type Result<T> = std::result::Result<T, Error>;
