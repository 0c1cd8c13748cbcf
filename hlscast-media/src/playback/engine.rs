//! Seams to the playback side of the host environment
//!
//! The adaptive engine and the media element are external collaborators.
//! Their asynchronous notifications come back as [`EngineEvent`] and
//! [`MediaElementEvent`] values instead of callbacks.

use super::capability::CanPlay;
use crate::error::PlaybackEngineError;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notifications emitted by an adaptive engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The manifest was fetched and parsed
    ManifestParsed,
    /// The engine hit an error
    Error(PlaybackEngineError),
}

/// Notifications emitted by the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaElementEvent {
    /// Duration and dimensions are known
    MetadataLoaded,
}

/// Channel an engine reports on
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving side of the engine channel
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// The playback surface, shared with the UI
pub trait MediaElement: Send + Sync {
    /// Whether the element can play `mime_type` on its own
    fn can_play_type(&self, mime_type: &str) -> CanPlay;

    /// Point the element directly at a source
    fn set_source(&self, uri: &str);

    /// Begin playback
    fn play(&self) -> Result<(), PlaybackEngineError>;
}

/// An instantiated adaptive streaming engine
pub trait AdaptiveEngine: Send {
    /// Start loading the manifest at `uri`
    fn load_source(&mut self, uri: &str) -> Result<(), PlaybackEngineError>;

    /// Bind the engine output to `element`
    fn attach_media(&mut self, element: Arc<dyn MediaElement>) -> Result<(), PlaybackEngineError>;

    /// Tear the engine down
    fn destroy(&mut self) {}
}

/// Factory and support check for adaptive engines
pub trait AdaptiveRuntime: Send + Sync {
    /// Whether adaptive streaming works in this environment
    fn is_supported(&self) -> bool;

    /// Build an engine reporting on `events`
    fn create_engine(&self, events: EngineEventSender) -> Box<dyn AdaptiveEngine>;
}

/// Runtime without adaptive streaming support
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdaptiveRuntime;

impl AdaptiveRuntime for NoAdaptiveRuntime {
    fn is_supported(&self) -> bool {
        false
    }

    fn create_engine(&self, _events: EngineEventSender) -> Box<dyn AdaptiveEngine> {
        Box::new(InertEngine)
    }
}

struct InertEngine;

impl AdaptiveEngine for InertEngine {
    fn load_source(&mut self, uri: &str) -> Result<(), PlaybackEngineError> {
        Err(PlaybackEngineError::new(
            crate::error::PlaybackErrorKind::Other,
            format!("adaptive streaming unsupported, cannot load {}", uri),
            true,
        ))
    }

    fn attach_media(&mut self, _element: Arc<dyn MediaElement>) -> Result<(), PlaybackEngineError> {
        Ok(())
    }
}
