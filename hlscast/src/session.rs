//! Bridge session: one capture controller and one playback negotiator driven
//! by a single task
//!
//! The task owns both components. User commands, device chunks, backend
//! signals, engine notifications and media element notifications all arrive
//! on channels and are handled one at a time in a `tokio::select!` loop, so
//! no two triggers ever interleave.

use crate::error::{Error, Result};
use crate::event::{Event, EventStream};
use crate::{
    AdaptiveRuntime, CaptureConfig, CaptureController, CaptureEvent, CaptureState, CaptureStats,
    CaptureTrigger, ChunkReceiver, DeviceConstraints, DeviceProvider, EngineKind, EventSink,
    HlsCast, HlsCastError, InboundReceiver, MediaElement, MediaElementEvent, MediaError,
    NegotiatorState, NoAdaptiveRuntime, PlaybackConfig, PlaybackEvent, PlaybackNegotiator,
    PlaybackStats, PlaybackTrigger,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Receiving end for media element notifications
pub type ElementEventReceiver = mpsc::UnboundedReceiver<MediaElementEvent>;

/// Point-in-time view of a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Capture state
    pub capture_state: CaptureState,
    /// Capture counters
    pub capture_stats: CaptureStats,
    /// Negotiator state
    pub negotiator_state: NegotiatorState,
    /// Chosen playback path, once attached
    pub engine_kind: Option<EngineKind>,
    /// Playback counters
    pub playback_stats: PlaybackStats,
}

enum Command {
    Start(oneshot::Sender<std::result::Result<(), MediaError>>),
    Stop(oneshot::Sender<std::result::Result<(), MediaError>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Fluent builder for a bridge session
pub struct BridgeSessionBuilder {
    hlscast: HlsCast,
    provider: Option<Arc<dyn DeviceProvider>>,
    runtime: Arc<dyn AdaptiveRuntime>,
    element: Option<(Arc<dyn MediaElement>, ElementEventReceiver)>,
    channel: Option<(Arc<dyn EventSink>, InboundReceiver)>,
    signaling_url: Option<String>,
    constraints: DeviceConstraints,
    capture: CaptureConfig,
    playback: PlaybackConfig,
}

impl BridgeSessionBuilder {
    pub(crate) fn new(hlscast: &HlsCast) -> Self {
        let config = hlscast.config();
        Self {
            provider: None,
            runtime: Arc::new(NoAdaptiveRuntime),
            element: None,
            channel: None,
            signaling_url: config.signaling_url.clone(),
            constraints: config.constraints,
            capture: config.capture.clone(),
            playback: config.playback.clone(),
            hlscast: hlscast.clone(),
        }
    }

    /// Set where the camera comes from (required)
    pub fn device_provider(mut self, provider: Arc<dyn DeviceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the adaptive streaming runtime; without one only native playback is tried
    pub fn adaptive_runtime(mut self, runtime: Arc<dyn AdaptiveRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Set the playback surface and its notification channel (required)
    pub fn media_element(
        mut self,
        element: Arc<dyn MediaElement>,
        events: ElementEventReceiver,
    ) -> Self {
        self.element = Some((element, events));
        self
    }

    /// Use an explicit event channel to the backend
    pub fn event_channel(mut self, sink: Arc<dyn EventSink>, inbound: InboundReceiver) -> Self {
        self.channel = Some((sink, inbound));
        self
    }

    /// Connect to the backend over WebSocket when the session starts
    #[cfg(feature = "signaling")]
    pub fn signaling_server(mut self, url: &str) -> Self {
        self.signaling_url = Some(url.to_string());
        self
    }

    /// Override the device constraints
    pub fn constraints(mut self, constraints: DeviceConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Override the capture settings
    pub fn capture_config(mut self, config: CaptureConfig) -> Self {
        self.capture = config;
        self
    }

    /// Override the playback settings
    pub fn playback_config(mut self, config: PlaybackConfig) -> Self {
        self.playback = config;
        self
    }

    /// Acquire the device, wire up playback and spawn the session task
    ///
    /// A device that cannot be acquired does not fail the session: it is
    /// logged, capture stays idle and playback still works.
    pub async fn start(self) -> Result<SessionHandle> {
        let provider = self
            .provider
            .ok_or_else(|| HlsCastError::MissingConfiguration {
                field: "device_provider".to_string(),
            })?;
        let (element, element_events) =
            self.element
                .ok_or_else(|| HlsCastError::MissingConfiguration {
                    field: "media_element".to_string(),
                })?;
        let (sink, inbound) = match self.channel {
            Some(channel) => channel,
            None => Self::connect(self.signaling_url.as_deref()).await?,
        };

        let mut controller = CaptureController::new(self.capture, sink)?;
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let negotiator = PlaybackNegotiator::new(self.playback, self.runtime, element, engine_tx)?;

        let chunks = match controller.acquire(provider.as_ref(), &self.constraints).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("⚠️ Session running without capture: {}", e);
                // Closed channel: the chunk branch of the loop never fires
                let (_, chunks) = mpsc::unbounded_channel();
                chunks
            }
        };

        let id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(self.hlscast.config().session_event_capacity);

        let task = SessionTask {
            id,
            capture_events: controller.subscribe_events(),
            playback_events: negotiator.subscribe_events(),
            controller,
            negotiator,
            event_tx: event_tx.clone(),
        };
        let task = tokio::spawn(task.run(SessionInputs {
            commands: command_rx,
            chunks,
            inbound,
            engine_events: engine_rx,
            element_events,
        }));

        info!("🚀 Bridge session {} started", id);
        Ok(SessionHandle {
            id,
            commands: command_tx,
            event_tx,
            task: Some(task),
        })
    }

    #[cfg(feature = "signaling")]
    async fn connect(url: Option<&str>) -> Result<(Arc<dyn EventSink>, InboundReceiver)> {
        let url = url.ok_or_else(|| HlsCastError::MissingConfiguration {
            field: "event_channel or signaling_url".to_string(),
        })?;
        let (sink, inbound) = hlscast_signaling::SignalingClient::connect(url).await?;
        Ok((Arc::new(sink), inbound))
    }

    #[cfg(not(feature = "signaling"))]
    async fn connect(_url: Option<&str>) -> Result<(Arc<dyn EventSink>, InboundReceiver)> {
        Err(HlsCastError::MissingConfiguration {
            field: "event_channel".to_string(),
        }
        .into())
    }
}

impl std::fmt::Debug for BridgeSessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSessionBuilder")
            .field("has_provider", &self.provider.is_some())
            .field("has_element", &self.element.is_some())
            .field("has_channel", &self.channel.is_some())
            .field("signaling_url", &self.signaling_url)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}

/// Handle to a running bridge session
#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    event_tx: broadcast::Sender<Event>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Start recording
    pub async fn start(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start(tx))?;
        rx.await.map_err(|_| Error::SessionClosed)??;
        Ok(())
    }

    /// Stop recording; a no-op unless recording
    pub async fn stop(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop(tx))?;
        rx.await.map_err(|_| Error::SessionClosed)??;
        Ok(())
    }

    /// Current capture and playback state
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Subscribe to session events from now on
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_tx.subscribe())
    }

    /// Whether the session task is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop recording, release the device and end the session task
    pub async fn shutdown(mut self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        let _ = rx.await;
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| {
                error!("❌ Session task failed: {}", e);
                Error::SessionClosed
            })?;
        }
        Ok(())
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::SessionClosed)
    }
}

struct SessionInputs {
    commands: mpsc::UnboundedReceiver<Command>,
    chunks: ChunkReceiver,
    inbound: InboundReceiver,
    engine_events: mpsc::UnboundedReceiver<crate::EngineEvent>,
    element_events: ElementEventReceiver,
}

struct SessionTask {
    id: Uuid,
    controller: CaptureController,
    negotiator: PlaybackNegotiator,
    capture_events: broadcast::Receiver<CaptureEvent>,
    playback_events: broadcast::Receiver<PlaybackEvent>,
    event_tx: broadcast::Sender<Event>,
}

impl SessionTask {
    async fn run(mut self, mut inputs: SessionInputs) {
        loop {
            // Chunks already handed over are handled before a queued stop
            tokio::select! {
                biased;

                Some(chunk) = inputs.chunks.recv() => {
                    let _ = self.capture(CaptureTrigger::ChunkProduced(chunk));
                }
                command = inputs.commands.recv() => {
                    let Some(command) = command else {
                        debug!("All session handles dropped");
                        break;
                    };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Some(event) = inputs.inbound.recv() => {
                    self.negotiator.dispatch(event.into());
                }
                Some(event) = inputs.engine_events.recv() => {
                    self.negotiator.dispatch(PlaybackTrigger::from(event));
                }
                Some(event) = inputs.element_events.recv() => {
                    self.negotiator.dispatch(PlaybackTrigger::from(event));
                }
            }
            self.forward_events();
        }

        if let Err(e) = self.controller.release() {
            error!("❌ Failed to release capture device: {}", e);
        }
        self.forward_events();
        info!("👋 Bridge session {} closed", self.id);
        let _ = self.event_tx.send(Event::SessionClosed);
    }

    /// Returns `false` once the session should end
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.capture(CaptureTrigger::Start));
            }
            Command::Stop(reply) => {
                let _ = reply.send(self.capture(CaptureTrigger::Stop));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown(reply) => {
                debug!("Shutdown requested for session {}", self.id);
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn capture(&mut self, trigger: CaptureTrigger) -> std::result::Result<(), MediaError> {
        let result = self.controller.dispatch(trigger);
        if let Err(e) = &result {
            let _ = self.event_tx.send(Event::SessionError {
                error: e.to_string(),
                recoverable: e.is_recoverable(),
            });
        }
        result
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            capture_state: self.controller.state(),
            capture_stats: self.controller.stats().clone(),
            negotiator_state: self.negotiator.state(),
            engine_kind: self.negotiator.engine_kind(),
            playback_stats: self.negotiator.stats().clone(),
        }
    }

    fn forward_events(&mut self) {
        while let Some(event) = next_event(&mut self.capture_events) {
            let _ = self.event_tx.send(Event::Capture(event));
        }
        while let Some(event) = next_event(&mut self.playback_events) {
            let _ = self.event_tx.send(Event::Playback(event));
        }
    }
}

fn next_event<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Option<T> {
    loop {
        match rx.try_recv() {
            Ok(event) => return Some(event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                warn!("⚠️ Dropped {} session events", missed);
            }
            Err(_) => return None,
        }
    }
}
