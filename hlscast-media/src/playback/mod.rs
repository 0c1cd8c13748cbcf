//! Playback side: capability probing and source negotiation

pub mod capability;
pub mod engine;
pub mod negotiator;

pub use capability::{CanPlay, Capability, CapabilityProbe, CapabilitySet, HLS_MIME_TYPE};
pub use engine::{
    AdaptiveEngine, AdaptiveRuntime, EngineEvent, EngineEventReceiver, EngineEventSender,
    MediaElement, MediaElementEvent, NoAdaptiveRuntime,
};
pub use negotiator::{
    EngineKind, NegotiatorState, PlaybackConfig, PlaybackEvent, PlaybackNegotiator,
    PlaybackStats, PlaybackTarget, PlaybackTrigger,
};
