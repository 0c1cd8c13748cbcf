//! # hlscast - Camera capture to HLS playback bridge
//!
//! hlscast records a camera in fixed timeslices and ships each container
//! fragment to a backend that segments it into HLS. When the backend reports
//! that the playlist is ready, playback is attached through an adaptive
//! streaming engine if one is available, or natively by the media element.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hlscast::{local_channel, HlsCast, NoAdaptiveRuntime, SyntheticDeviceProvider};
//! # use hlscast::{CanPlay, MediaElement, PlaybackEngineError};
//! # use std::sync::Arc;
//! # struct Screen;
//! # impl MediaElement for Screen {
//! #     fn can_play_type(&self, _: &str) -> CanPlay { CanPlay::Maybe }
//! #     fn set_source(&self, _: &str) {}
//! #     fn play(&self) -> Result<(), PlaybackEngineError> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hlscast::Error> {
//!     hlscast::init_logging();
//!     let hlscast = HlsCast::init()?;
//!
//!     let (sink, inbound, _backend) = local_channel();
//!     let (_element_tx, element_rx) = tokio::sync::mpsc::unbounded_channel();
//!
//!     let session = hlscast
//!         .session()
//!         .device_provider(Arc::new(SyntheticDeviceProvider::new()))
//!         .adaptive_runtime(Arc::new(NoAdaptiveRuntime))
//!         .media_element(Arc::new(Screen), element_rx)
//!         .event_channel(Arc::new(sink), inbound)
//!         .start()
//!         .await?;
//!
//!     session.start().await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     session.stop().await?;
//!     session.shutdown().await
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use hlscast_core::{
    local_channel, ChunkMetadata, EventSink, HlsCastError, InboundEvent, InboundReceiver,
    InboundSender, LocalBackend, LocalEventSink, OutboundEvent, CHUNK_MIME_TYPE,
};

pub use hlscast_media::{
    AdaptiveEngine, AdaptiveRuntime, CanPlay, Capability, CapabilityProbe, CapabilitySet,
    CaptureConfig, CaptureController, CaptureEvent, CaptureState, CaptureStats, CaptureTrigger,
    Chunk, ChunkReceiver, ChunkSender, DeviceConstraints, DeviceError, DeviceProvider,
    DeviceStream, DiscardReason, EngineEvent, EngineEventSender, EngineKind, MediaElement,
    MediaElementEvent, MediaError, NegotiatorState, NoAdaptiveRuntime, PlaybackConfig,
    PlaybackEngineError, PlaybackErrorKind, PlaybackEvent, PlaybackNegotiator, PlaybackStats,
    PlaybackTrigger, RecorderState, SyntheticDeviceProvider, VideoResolution, HLS_MIME_TYPE,
};

#[cfg(feature = "signaling")]
pub use hlscast_signaling::{SignalingClient, SignalingError, WsEventSink};

// Public API modules
pub mod config;
pub mod error;
pub mod event;
pub mod session;

// Re-export main API types
pub use config::{GlobalConfig, DEFAULT_LOG_FILTER};
pub use error::{Error, Result};
pub use event::{Event, EventFilter, EventStream, FilteredEventStream};
pub use session::{BridgeSessionBuilder, ElementEventReceiver, SessionHandle, SessionSnapshot};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for hlscast
#[derive(Debug, Clone)]
pub struct HlsCast {
    inner: Arc<HlsCastInner>,
}

#[derive(Debug)]
struct HlsCastInner {
    config: GlobalConfig,
}

impl HlsCast {
    /// Initialize hlscast with default settings
    ///
    /// # Example
    /// ```rust,no_run
    /// use hlscast::HlsCast;
    ///
    /// let hlscast = HlsCast::init()?;
    /// # Ok::<(), hlscast::Error>(())
    /// ```
    pub fn init() -> Result<Self> {
        Self::init_with(GlobalConfig::default())
    }

    /// Initialize with custom global configuration
    pub fn init_with(config: GlobalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(HlsCastInner { config }),
        })
    }

    /// Create a session builder using the global defaults
    pub fn session(&self) -> BridgeSessionBuilder {
        BridgeSessionBuilder::new(self)
    }

    /// Global configuration
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }
}

/// Install a `tracing` subscriber honouring `RUST_LOG`, falling back to
/// [`DEFAULT_LOG_FILTER`]
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    init_logging_with(DEFAULT_LOG_FILTER);
}

/// Same as [`init_logging`] with an explicit fallback filter
pub fn init_logging_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
