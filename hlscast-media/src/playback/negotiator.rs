//! Playback source negotiation
//!
//! The negotiator waits for the backend's `"playlist_ready"` signal, probes
//! the environment once and attaches exactly one playback path:
//!
//! 1. adaptive engine on the streaming host's manifest, play on "manifest parsed"
//! 2. native playback of the origin-relative manifest, play on "metadata loaded"
//! 3. nothing at all, silently
//!
//! After attaching it only reacts to the events of the chosen path.

use super::capability::{Capability, CapabilityProbe, CapabilitySet, HLS_MIME_TYPE};
use super::engine::{
    AdaptiveEngine, AdaptiveRuntime, EngineEvent, EngineEventSender, MediaElement,
    MediaElementEvent,
};
use crate::error::{MediaError, MediaResult, PlaybackEngineError};
use hlscast_core::InboundEvent;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Base URL of the streaming host serving the adaptive manifest
    pub streaming_base_url: String,
    /// Manifest path on the streaming host
    pub adaptive_manifest_path: String,
    /// Source used for native playback, relative to the current origin
    pub native_source: String,
    /// Manifest MIME type probed on the media element
    pub native_mime_type: String,
    /// Capacity of the playback event broadcast channel
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            streaming_base_url: "http://localhost:4001".to_string(),
            adaptive_manifest_path: "hls/playlist.m3u8".to_string(),
            native_source: "/output/playlist.m3u8".to_string(),
            native_mime_type: HLS_MIME_TYPE.to_string(),
            event_capacity: 100,
        }
    }
}

impl PlaybackConfig {
    /// Full URI of the adaptive manifest
    pub fn adaptive_manifest_uri(&self) -> String {
        format!(
            "{}/{}",
            self.streaming_base_url.trim_end_matches('/'),
            self.adaptive_manifest_path.trim_start_matches('/')
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.streaming_base_url.is_empty() || self.adaptive_manifest_path.is_empty() {
            return Err(MediaError::InvalidConfiguration {
                message: "Adaptive manifest location must be set".to_string(),
            });
        }
        if self.native_source.is_empty() {
            return Err(MediaError::InvalidConfiguration {
                message: "Native source must be set".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(MediaError::InvalidConfiguration {
                message: "Event capacity must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Playback path chosen at attach time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Adaptive,
    Native,
    None,
}

/// Where playback was attached; fixed for the rest of the session
#[derive(Clone)]
pub struct PlaybackTarget {
    engine_kind: EngineKind,
    manifest_uri: Option<String>,
    element: Arc<dyn MediaElement>,
}

impl PlaybackTarget {
    /// Chosen playback path
    pub fn engine_kind(&self) -> EngineKind {
        self.engine_kind
    }

    /// Manifest the path plays, if any
    pub fn manifest_uri(&self) -> Option<&str> {
        self.manifest_uri.as_deref()
    }

    /// The media element playback is bound to
    pub fn element(&self) -> &Arc<dyn MediaElement> {
        &self.element
    }
}

impl fmt::Debug for PlaybackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackTarget")
            .field("engine_kind", &self.engine_kind)
            .field("manifest_uri", &self.manifest_uri)
            .finish_non_exhaustive()
    }
}

/// Negotiator lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiatorState {
    /// No readiness signal yet
    Waiting,
    /// A playback path has been chosen
    Attached,
}

/// External triggers understood by the negotiator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackTrigger {
    /// Backend signalled `"playlist_ready"`
    PlaylistReady,
    /// Adaptive engine parsed the manifest
    ManifestParsed,
    /// Adaptive engine reported an error
    EngineError(PlaybackEngineError),
    /// Media element loaded metadata
    MetadataLoaded,
}

impl From<InboundEvent> for PlaybackTrigger {
    fn from(event: InboundEvent) -> Self {
        match event {
            InboundEvent::PlaylistReady => PlaybackTrigger::PlaylistReady,
        }
    }
}

impl From<EngineEvent> for PlaybackTrigger {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::ManifestParsed => PlaybackTrigger::ManifestParsed,
            EngineEvent::Error(error) => PlaybackTrigger::EngineError(error),
        }
    }
}

impl From<MediaElementEvent> for PlaybackTrigger {
    fn from(event: MediaElementEvent) -> Self {
        match event {
            MediaElementEvent::MetadataLoaded => PlaybackTrigger::MetadataLoaded,
        }
    }
}

/// Observable playback transitions
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A playback path was chosen
    Attached {
        /// Chosen path
        engine_kind: EngineKind,
        /// Manifest being played, if any
        manifest_uri: Option<String>,
    },
    /// Play was issued on the media element
    PlayRequested {
        /// Path that issued play
        engine_kind: EngineKind,
    },
    /// A recoverable playback error was recorded
    PlaybackError {
        /// The error
        error: PlaybackEngineError,
    },
}

/// Playback statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub play_requests: u64,
    pub errors: u64,
    pub ignored_triggers: u64,
}

/// Chooses and drives the playback path
pub struct PlaybackNegotiator {
    config: PlaybackConfig,
    runtime: Arc<dyn AdaptiveRuntime>,
    element: Arc<dyn MediaElement>,
    engine_events: EngineEventSender,
    state: NegotiatorState,
    target: Option<PlaybackTarget>,
    engine: Option<Box<dyn AdaptiveEngine>>,
    last_error: Option<PlaybackEngineError>,
    event_tx: broadcast::Sender<PlaybackEvent>,
    stats: PlaybackStats,
}

impl PlaybackNegotiator {
    /// Create a waiting negotiator
    ///
    /// `engine_events` is handed to the adaptive engine if one gets created;
    /// its receiver must be fed back through [`dispatch`](Self::dispatch).
    pub fn new(
        config: PlaybackConfig,
        runtime: Arc<dyn AdaptiveRuntime>,
        element: Arc<dyn MediaElement>,
        engine_events: EngineEventSender,
    ) -> MediaResult<Self> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            config,
            runtime,
            element,
            engine_events,
            state: NegotiatorState::Waiting,
            target: None,
            engine: None,
            last_error: None,
            event_tx,
            stats: PlaybackStats::default(),
        })
    }

    /// Single entry point for every playback trigger
    ///
    /// Never fails on engine or element errors; those are recorded and
    /// reported as [`PlaybackEvent::PlaybackError`].
    pub fn dispatch(&mut self, trigger: PlaybackTrigger) {
        match trigger {
            PlaybackTrigger::PlaylistReady => self.on_playlist_ready(),
            PlaybackTrigger::ManifestParsed => {
                if self.engine_kind() == Some(EngineKind::Adaptive) {
                    self.request_play(EngineKind::Adaptive);
                } else {
                    self.ignore("manifest parsed");
                }
            }
            PlaybackTrigger::MetadataLoaded => {
                if self.engine_kind() == Some(EngineKind::Native) {
                    self.request_play(EngineKind::Native);
                } else {
                    self.ignore("metadata loaded");
                }
            }
            PlaybackTrigger::EngineError(error) => {
                if self.engine_kind() == Some(EngineKind::Adaptive) {
                    self.record_error(error);
                } else {
                    self.ignore("engine error");
                }
            }
        }
    }

    fn on_playlist_ready(&mut self) {
        if self.state == NegotiatorState::Attached {
            debug!("Duplicate playlist_ready ignored");
            self.stats.ignored_triggers += 1;
            return;
        }

        let capabilities = self.probe();
        debug!("🔍 Playback capabilities: {:?}", capabilities);

        let target = match capabilities.preferred() {
            Some(Capability::Adaptive) => self.attach_adaptive(),
            Some(Capability::Native) => self.attach_native(),
            None => {
                debug!("No playback path available, playback will not start");
                PlaybackTarget {
                    engine_kind: EngineKind::None,
                    manifest_uri: None,
                    element: self.element.clone(),
                }
            }
        };

        info!(
            "📺 Playback attached: {:?} {}",
            target.engine_kind,
            target.manifest_uri.as_deref().unwrap_or("-")
        );
        let _ = self.event_tx.send(PlaybackEvent::Attached {
            engine_kind: target.engine_kind,
            manifest_uri: target.manifest_uri.clone(),
        });
        self.target = Some(target);
        self.state = NegotiatorState::Attached;
    }

    fn attach_adaptive(&mut self) -> PlaybackTarget {
        let uri = self.config.adaptive_manifest_uri();
        let mut engine = self.runtime.create_engine(self.engine_events.clone());

        if let Err(e) = engine.load_source(&uri) {
            self.record_error(e);
        }
        if let Err(e) = engine.attach_media(self.element.clone()) {
            self.record_error(e);
        }
        self.engine = Some(engine);

        PlaybackTarget {
            engine_kind: EngineKind::Adaptive,
            manifest_uri: Some(uri),
            element: self.element.clone(),
        }
    }

    fn attach_native(&mut self) -> PlaybackTarget {
        let uri = self.config.native_source.clone();
        self.element.set_source(&uri);

        PlaybackTarget {
            engine_kind: EngineKind::Native,
            manifest_uri: Some(uri),
            element: self.element.clone(),
        }
    }

    fn request_play(&mut self, engine_kind: EngineKind) {
        self.stats.play_requests += 1;
        if let Err(e) = self.element.play() {
            self.record_error(e);
            return;
        }
        info!("▶️ Play requested via {:?} path", engine_kind);
        let _ = self
            .event_tx
            .send(PlaybackEvent::PlayRequested { engine_kind });
    }

    fn record_error(&mut self, error: PlaybackEngineError) {
        warn!("⚠️ Playback error (non-fatal here): {}", error);
        self.stats.errors += 1;
        self.last_error = Some(error.clone());
        let _ = self.event_tx.send(PlaybackEvent::PlaybackError { error });
    }

    fn ignore(&mut self, what: &str) {
        debug!("Ignoring {} in state {:?}", what, self.state);
        self.stats.ignored_triggers += 1;
    }

    /// Probe the environment without changing any state
    pub fn probe(&self) -> CapabilitySet {
        CapabilityProbe::probe(
            self.runtime.as_ref(),
            self.element.as_ref(),
            &self.config.native_mime_type,
        )
    }

    /// Current state
    pub fn state(&self) -> NegotiatorState {
        self.state
    }

    /// Chosen target once attached
    pub fn target(&self) -> Option<&PlaybackTarget> {
        self.target.as_ref()
    }

    /// Chosen path once attached
    pub fn engine_kind(&self) -> Option<EngineKind> {
        self.target.as_ref().map(|t| t.engine_kind)
    }

    /// Whether an adaptive engine was instantiated
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Most recent recorded playback error
    pub fn last_error(&self) -> Option<&PlaybackEngineError> {
        self.last_error.as_ref()
    }

    /// Get current statistics
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Get current configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Subscribe to playback events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_tx.subscribe()
    }
}

impl Drop for PlaybackNegotiator {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
    }
}

impl fmt::Debug for PlaybackNegotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackNegotiator")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("target", &self.target)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
