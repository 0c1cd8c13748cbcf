//! Tests for playback source negotiation

use hlscast_core::InboundEvent;
use hlscast_media::*;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

// ============================================================================
// TEST DOUBLES
// ============================================================================

struct FakeElement {
    answer: CanPlay,
    sources: Mutex<Vec<String>>,
    plays: Mutex<u32>,
    probed: Mutex<Vec<String>>,
    refuse_play: bool,
}

impl FakeElement {
    fn build(answer: CanPlay, refuse_play: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            sources: Mutex::new(Vec::new()),
            plays: Mutex::new(0),
            probed: Mutex::new(Vec::new()),
            refuse_play,
        })
    }

    fn new(answer: CanPlay) -> Arc<Self> {
        Self::build(answer, false)
    }

    fn refusing_play(answer: CanPlay) -> Arc<Self> {
        Self::build(answer, true)
    }

    fn plays(&self) -> u32 {
        *self.plays.lock()
    }
}

impl MediaElement for FakeElement {
    fn can_play_type(&self, mime_type: &str) -> CanPlay {
        self.probed.lock().push(mime_type.to_string());
        self.answer
    }

    fn set_source(&self, uri: &str) {
        self.sources.lock().push(uri.to_string());
    }

    fn play(&self) -> Result<(), PlaybackEngineError> {
        if self.refuse_play {
            return Err(PlaybackEngineError::new(
                PlaybackErrorKind::Media,
                "autoplay blocked",
                false,
            ));
        }
        *self.plays.lock() += 1;
        Ok(())
    }
}

#[derive(Default)]
struct EngineLog {
    loaded: Mutex<Vec<String>>,
    attached: Mutex<u32>,
    created: Mutex<u32>,
    destroyed: Mutex<bool>,
}

struct FakeEngine {
    log: Arc<EngineLog>,
    events: EngineEventSender,
}

impl AdaptiveEngine for FakeEngine {
    fn load_source(&mut self, uri: &str) -> Result<(), PlaybackEngineError> {
        self.log.loaded.lock().push(uri.to_string());
        Ok(())
    }

    fn attach_media(&mut self, _element: Arc<dyn MediaElement>) -> Result<(), PlaybackEngineError> {
        *self.log.attached.lock() += 1;
        // A real engine would fetch the manifest asynchronously
        let _ = self.events.send(EngineEvent::ManifestParsed);
        Ok(())
    }

    fn destroy(&mut self) {
        *self.log.destroyed.lock() = true;
    }
}

struct FakeRuntime {
    supported: bool,
    log: Arc<EngineLog>,
}

impl FakeRuntime {
    fn supported() -> Arc<Self> {
        Arc::new(Self {
            supported: true,
            log: Arc::new(EngineLog::default()),
        })
    }
}

impl AdaptiveRuntime for FakeRuntime {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create_engine(&self, events: EngineEventSender) -> Box<dyn AdaptiveEngine> {
        *self.log.created.lock() += 1;
        Box::new(FakeEngine {
            log: self.log.clone(),
            events,
        })
    }
}

fn negotiator(
    runtime: Arc<dyn AdaptiveRuntime>,
    element: Arc<dyn MediaElement>,
) -> (PlaybackNegotiator, EngineEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let negotiator = PlaybackNegotiator::new(PlaybackConfig::default(), runtime, element, tx)
        .expect("default config is valid");
    (negotiator, rx)
}

// ============================================================================
// ATTACH TESTS
// ============================================================================

#[tokio::test]
async fn test_nothing_happens_before_playlist_ready() {
    let runtime = FakeRuntime::supported();
    let element = FakeElement::new(CanPlay::Probably);
    let (mut negotiator, _rx) = negotiator(runtime.clone(), element.clone());

    negotiator.dispatch(PlaybackTrigger::ManifestParsed);
    negotiator.dispatch(PlaybackTrigger::MetadataLoaded);

    assert_eq!(negotiator.state(), NegotiatorState::Waiting);
    assert_eq!(*runtime.log.created.lock(), 0);
    assert!(element.sources.lock().is_empty());
    assert_eq!(element.plays(), 0);
    assert_eq!(negotiator.stats().ignored_triggers, 2);
}

#[tokio::test]
async fn test_adaptive_preferred_over_native() {
    let runtime = FakeRuntime::supported();
    let element = FakeElement::new(CanPlay::Probably);
    let (mut negotiator, mut engine_rx) = negotiator(runtime.clone(), element.clone());
    let mut events = negotiator.subscribe_events();

    negotiator.dispatch(InboundEvent::PlaylistReady.into());

    assert_eq!(negotiator.state(), NegotiatorState::Attached);
    assert_eq!(negotiator.engine_kind(), Some(EngineKind::Adaptive));
    assert_eq!(
        *runtime.log.loaded.lock(),
        vec!["http://localhost:4001/hls/playlist.m3u8".to_string()]
    );
    assert_eq!(*runtime.log.attached.lock(), 1);
    // Native path untouched
    assert!(element.sources.lock().is_empty());
    assert_eq!(element.plays(), 0);

    assert_eq!(
        events.try_recv().unwrap(),
        PlaybackEvent::Attached {
            engine_kind: EngineKind::Adaptive,
            manifest_uri: Some("http://localhost:4001/hls/playlist.m3u8".to_string()),
        }
    );

    let parsed = engine_rx.recv().await.unwrap();
    negotiator.dispatch(parsed.into());
    assert_eq!(element.plays(), 1);
    assert_eq!(
        events.try_recv().unwrap(),
        PlaybackEvent::PlayRequested {
            engine_kind: EngineKind::Adaptive
        }
    );
}

#[tokio::test]
async fn test_adaptive_ignores_metadata_loaded() {
    let runtime = FakeRuntime::supported();
    let element = FakeElement::new(CanPlay::No);
    let (mut negotiator, _rx) = negotiator(runtime, element.clone());

    negotiator.dispatch(PlaybackTrigger::PlaylistReady);
    negotiator.dispatch(PlaybackTrigger::MetadataLoaded);

    assert_eq!(element.plays(), 0);
}

#[tokio::test]
async fn test_native_fallback_plays_after_metadata() {
    let runtime = Arc::new(NoAdaptiveRuntime);
    let element = FakeElement::new(CanPlay::Maybe);
    let (mut negotiator, _rx) = negotiator(runtime, element.clone());

    negotiator.dispatch(PlaybackTrigger::PlaylistReady);

    assert_eq!(negotiator.engine_kind(), Some(EngineKind::Native));
    assert!(!negotiator.has_engine());
    assert_eq!(
        *element.sources.lock(),
        vec!["/output/playlist.m3u8".to_string()]
    );
    assert_eq!(
        *element.probed.lock(),
        vec!["application/vnd.apple.mpegurl".to_string()]
    );
    // Play waits for metadata
    assert_eq!(element.plays(), 0);

    negotiator.dispatch(PlaybackTrigger::ManifestParsed);
    assert_eq!(element.plays(), 0);

    negotiator.dispatch(MediaElementEvent::MetadataLoaded.into());
    assert_eq!(element.plays(), 1);
    assert_eq!(
        negotiator.target().unwrap().manifest_uri(),
        Some("/output/playlist.m3u8")
    );
}

#[tokio::test]
async fn test_no_capability_is_silent() {
    let runtime = Arc::new(NoAdaptiveRuntime);
    let element = FakeElement::new(CanPlay::No);
    let (mut negotiator, _rx) = negotiator(runtime, element.clone());
    let mut events = negotiator.subscribe_events();

    negotiator.dispatch(PlaybackTrigger::PlaylistReady);
    negotiator.dispatch(PlaybackTrigger::MetadataLoaded);
    negotiator.dispatch(PlaybackTrigger::ManifestParsed);

    assert_eq!(negotiator.state(), NegotiatorState::Attached);
    assert_eq!(negotiator.engine_kind(), Some(EngineKind::None));
    assert!(negotiator.last_error().is_none());
    assert!(element.sources.lock().is_empty());
    assert_eq!(element.plays(), 0);
    assert_eq!(
        events.try_recv().unwrap(),
        PlaybackEvent::Attached {
            engine_kind: EngineKind::None,
            manifest_uri: None,
        }
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_duplicate_playlist_ready_ignored() {
    let runtime = FakeRuntime::supported();
    let element = FakeElement::new(CanPlay::Probably);
    let (mut negotiator, _rx) = negotiator(runtime.clone(), element);

    negotiator.dispatch(PlaybackTrigger::PlaylistReady);
    negotiator.dispatch(PlaybackTrigger::PlaylistReady);

    assert_eq!(*runtime.log.created.lock(), 1);
    assert_eq!(runtime.log.loaded.lock().len(), 1);
    assert_eq!(negotiator.stats().ignored_triggers, 1);
}

// ============================================================================
// ERROR HANDLING TESTS
// ============================================================================

#[tokio::test]
async fn test_engine_errors_are_recorded_not_fatal() {
    let runtime = FakeRuntime::supported();
    let element = FakeElement::new(CanPlay::No);
    let (mut negotiator, _rx) = negotiator(runtime, element.clone());
    negotiator.dispatch(PlaybackTrigger::PlaylistReady);

    let fatal = PlaybackEngineError::new(PlaybackErrorKind::Network, "manifest 404", true);
    negotiator.dispatch(EngineEvent::Error(fatal.clone()).into());

    assert_eq!(negotiator.state(), NegotiatorState::Attached);
    assert_eq!(negotiator.last_error(), Some(&fatal));
    assert_eq!(negotiator.stats().errors, 1);

    // Later events on the same path still work
    negotiator.dispatch(PlaybackTrigger::ManifestParsed);
    assert_eq!(element.plays(), 1);
}

#[tokio::test]
async fn test_engine_error_ignored_on_native_path() {
    let runtime = Arc::new(NoAdaptiveRuntime);
    let element = FakeElement::new(CanPlay::Probably);
    let (mut negotiator, _rx) = negotiator(runtime, element);
    negotiator.dispatch(PlaybackTrigger::PlaylistReady);

    negotiator.dispatch(PlaybackTrigger::EngineError(PlaybackEngineError::new(
        PlaybackErrorKind::Other,
        "stray",
        false,
    )));

    assert!(negotiator.last_error().is_none());
}

#[tokio::test]
async fn test_refused_play_is_recorded() {
    let runtime = Arc::new(NoAdaptiveRuntime);
    let element = FakeElement::refusing_play(CanPlay::Probably);
    let (mut negotiator, _rx) = negotiator(runtime, element);
    let mut events = negotiator.subscribe_events();

    negotiator.dispatch(PlaybackTrigger::PlaylistReady);
    negotiator.dispatch(PlaybackTrigger::MetadataLoaded);

    let _attached = events.try_recv().unwrap();
    assert!(matches!(
        events.try_recv().unwrap(),
        PlaybackEvent::PlaybackError { .. }
    ));
    assert_eq!(
        negotiator.last_error().map(|e| e.kind),
        Some(PlaybackErrorKind::Media)
    );
}

#[tokio::test]
async fn test_engine_destroyed_on_drop() {
    let runtime = FakeRuntime::supported();
    let element = FakeElement::new(CanPlay::No);
    let (mut negotiator, _rx) = negotiator(runtime.clone(), element);
    negotiator.dispatch(PlaybackTrigger::PlaylistReady);

    drop(negotiator);
    assert!(*runtime.log.destroyed.lock());
}

#[tokio::test]
async fn test_custom_streaming_host() {
    let runtime = FakeRuntime::supported();
    let element = FakeElement::new(CanPlay::No);
    let config = PlaybackConfig {
        streaming_base_url: "https://media.example.net/".to_string(),
        adaptive_manifest_path: "/live/index.m3u8".to_string(),
        ..PlaybackConfig::default()
    };
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut negotiator = PlaybackNegotiator::new(config, runtime.clone(), element, tx).unwrap();

    negotiator.dispatch(PlaybackTrigger::PlaylistReady);
    assert_eq!(
        *runtime.log.loaded.lock(),
        vec!["https://media.example.net/live/index.m3u8".to_string()]
    );
}

#[tokio::test]
async fn test_invalid_playback_config() {
    let config = PlaybackConfig {
        native_source: String::new(),
        ..PlaybackConfig::default()
    };
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = PlaybackNegotiator::new(
        config,
        Arc::new(NoAdaptiveRuntime),
        FakeElement::new(CanPlay::No),
        tx,
    );
    assert!(matches!(result, Err(MediaError::InvalidConfiguration { .. })));
}
