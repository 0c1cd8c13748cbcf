//! # hlscast Media
//!
//! Capture and playback logic for the hlscast bridge: the device stream
//! abstraction, the chunked capture controller, the capability probe and the
//! playback negotiator.

#![warn(clippy::all)]

pub mod capture;
pub mod capture_controller;
pub mod chunk;
pub mod error;
pub mod playback;

// Re-export main types
pub use capture::{
    ChunkReceiver, ChunkSender, DeviceConstraints, DeviceProvider, DeviceStream, RecorderState,
    SyntheticDevice, SyntheticDeviceProvider, VideoResolution,
};
pub use capture_controller::{
    CaptureConfig, CaptureController, CaptureEvent, CaptureSession, CaptureState, CaptureStats,
    CaptureTrigger, DiscardReason, DEFAULT_CHUNK_INTERVAL,
};
pub use chunk::Chunk;
pub use error::{
    DeviceError, ErrorCategory, MediaError, MediaResult, PlaybackEngineError, PlaybackErrorKind,
};
pub use playback::{
    AdaptiveEngine, AdaptiveRuntime, CanPlay, Capability, CapabilityProbe, CapabilitySet,
    EngineEvent, EngineEventReceiver, EngineEventSender, EngineKind, MediaElement,
    MediaElementEvent, NegotiatorState, NoAdaptiveRuntime, PlaybackConfig, PlaybackEvent,
    PlaybackNegotiator, PlaybackStats, PlaybackTarget, PlaybackTrigger, HLS_MIME_TYPE,
};
