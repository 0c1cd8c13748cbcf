//! Chunked capture lifecycle
//!
//! The [`CaptureController`] owns one device stream and turns it into a
//! sequence of `"chunk"` events followed by a single `"stop"` event on the
//! outbound [`EventSink`].
//!
//! ```text
//!   Idle ──acquire──► Armed ──start──► Recording ──stop──► Stopped
//!    ▲                                    ▲                   │
//!    └──────────── release ───────────────┴────── start ──────┘
//! ```
//!
//! Every trigger (user start, user stop, device chunk) reaches the controller
//! through [`CaptureController::dispatch`]. Chunks are produced by the device
//! even while the controller is not recording; those are dropped, never
//! buffered, and the device is not throttled.

use crate::capture::{ChunkReceiver, DeviceConstraints, DeviceProvider, DeviceStream, RecorderState};
use crate::chunk::Chunk;
use crate::error::{MediaError, MediaResult};
use chrono::{DateTime, Utc};
use hlscast_core::{ChunkMetadata, EventSink, OutboundEvent, CHUNK_MIME_TYPE};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default time between two chunks
pub const DEFAULT_CHUNK_INTERVAL: Duration = Duration::from_millis(1000);

/// Capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Time between two chunks emitted by the device
    pub chunk_interval: Duration,
    /// MIME type advertised in chunk metadata
    pub mime_type: String,
    /// Capacity of the capture event broadcast channel
    pub event_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            chunk_interval: DEFAULT_CHUNK_INTERVAL,
            mime_type: CHUNK_MIME_TYPE.to_string(),
            event_capacity: 100,
        }
    }
}

impl CaptureConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.chunk_interval.is_zero() {
            return Err(MediaError::InvalidConfiguration {
                message: "Chunk interval must be > 0".to_string(),
            });
        }
        if self.mime_type.is_empty() {
            return Err(MediaError::InvalidConfiguration {
                message: "MIME type must not be empty".to_string(),
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

/// Recording lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No device acquired
    Idle,
    /// Device acquired, not recording yet
    Armed,
    /// Chunks are forwarded
    Recording,
    /// Recording ended, `"stop"` sent
    Stopped,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Idle => "idle",
            CaptureState::Armed => "armed",
            CaptureState::Recording => "recording",
            CaptureState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// External triggers understood by the controller
#[derive(Debug, Clone)]
pub enum CaptureTrigger {
    /// User asked to start recording
    Start,
    /// User asked to stop recording
    Stop,
    /// The device handed over a chunk
    ChunkProduced(Chunk),
}

impl From<Chunk> for CaptureTrigger {
    fn from(chunk: Chunk) -> Self {
        CaptureTrigger::ChunkProduced(chunk)
    }
}

/// Why a chunk was not forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Controller was not recording
    NotRecording(CaptureState),
    /// Chunk carried no data
    Empty,
}

/// Observable capture transitions
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// A device was acquired and the session is ready to record
    Armed {
        /// Session ID
        session_id: Uuid,
        /// Device label
        device: String,
    },
    /// Recording started
    RecordingStarted {
        /// Session ID
        session_id: Uuid,
    },
    /// A chunk went out to the sink
    ChunkForwarded {
        /// Sequence number of the chunk
        sequence: u64,
        /// Payload size in bytes
        size_bytes: usize,
    },
    /// A chunk was dropped
    ChunkDiscarded {
        /// Payload size in bytes
        size_bytes: usize,
        /// Why it was dropped
        reason: DiscardReason,
    },
    /// Recording stopped and `"stop"` was pushed
    Stopped {
        /// Session ID
        session_id: Uuid,
        /// Chunks forwarded during the session
        chunks_forwarded: u64,
    },
    /// Device released, controller back to idle
    Released {
        /// Session ID
        session_id: Uuid,
    },
}

/// Capture statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub chunks_forwarded: u64,
    pub chunks_discarded: u64,
    pub bytes_forwarded: u64,
    pub sink_failures: u64,
}

/// A live capture session: one device stream and its recording state
pub struct CaptureSession {
    id: Uuid,
    state: CaptureState,
    device: Box<dyn DeviceStream>,
    chunk_interval: Duration,
    acquired_at: DateTime<Utc>,
}

impl CaptureSession {
    /// Session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Label of the owned device
    pub fn device_label(&self) -> &str {
        self.device.label()
    }

    /// Time between two chunks
    pub fn chunk_interval(&self) -> Duration {
        self.chunk_interval
    }

    /// When the device was acquired
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("device", &self.device.label())
            .field("chunk_interval", &self.chunk_interval)
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.device.release();
    }
}

/// Drives a capture session and forwards its chunks
pub struct CaptureController {
    config: CaptureConfig,
    sink: Arc<dyn EventSink>,
    session: Option<CaptureSession>,
    event_tx: broadcast::Sender<CaptureEvent>,
    stats: CaptureStats,
}

impl CaptureController {
    /// Create an idle controller pushing to `sink`
    pub fn new(config: CaptureConfig, sink: Arc<dyn EventSink>) -> MediaResult<Self> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            config,
            sink,
            session: None,
            event_tx,
            stats: CaptureStats::default(),
        })
    }

    /// Acquire a device stream matching `constraints`
    ///
    /// On success the controller is `Armed` and the returned receiver yields
    /// the chunks the device produces; feed them back through
    /// [`dispatch`](Self::dispatch). A [`DeviceError`](crate::DeviceError) is
    /// returned as is and leaves the controller idle; retrying is up to the
    /// caller.
    pub async fn acquire(
        &mut self,
        provider: &dyn DeviceProvider,
        constraints: &DeviceConstraints,
    ) -> MediaResult<ChunkReceiver> {
        if let Some(session) = &self.session {
            return Err(MediaError::InvalidState {
                message: format!("device already acquired, session is {}", session.state),
            });
        }
        constraints.validate()?;

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let device = match provider.acquire(constraints, chunk_tx).await {
            Ok(device) => device,
            Err(e) => {
                error!("❌ Device acquisition failed: {}", e);
                return Err(e.into());
            }
        };

        let session = CaptureSession {
            id: Uuid::new_v4(),
            state: CaptureState::Armed,
            device,
            chunk_interval: self.config.chunk_interval,
            acquired_at: Utc::now(),
        };
        info!(
            "📹 Capture session {} armed on {}",
            session.id,
            session.device_label()
        );
        let _ = self.event_tx.send(CaptureEvent::Armed {
            session_id: session.id,
            device: session.device_label().to_string(),
        });

        self.session = Some(session);
        self.stats = CaptureStats::default();
        Ok(chunk_rx)
    }

    /// Single entry point for every capture trigger
    pub fn dispatch(&mut self, trigger: CaptureTrigger) -> MediaResult<()> {
        match trigger {
            CaptureTrigger::Start => self.start(),
            CaptureTrigger::Stop => self.stop(),
            CaptureTrigger::ChunkProduced(chunk) => {
                self.on_chunk_produced(chunk);
                Ok(())
            }
        }
    }

    /// Start recording from `Armed` or `Stopped`; no-op while recording
    pub fn start(&mut self) -> MediaResult<()> {
        let session = self.session.as_mut().ok_or_else(|| MediaError::InvalidState {
            message: "start requested before a device was acquired".to_string(),
        })?;

        match session.state {
            CaptureState::Recording => {
                debug!("Capture session {} already recording", session.id);
                Ok(())
            }
            CaptureState::Armed | CaptureState::Stopped => {
                if session.device.state() == RecorderState::Inactive {
                    session.device.start(session.chunk_interval)?;
                }
                session.state = CaptureState::Recording;

                info!("🔴 Capture session {} recording", session.id);
                let _ = self.event_tx.send(CaptureEvent::RecordingStarted {
                    session_id: session.id,
                });
                Ok(())
            }
            CaptureState::Idle => Err(MediaError::InvalidState {
                message: "session is idle".to_string(),
            }),
        }
    }

    /// Stop recording and push `"stop"`; no-op unless recording
    pub fn stop(&mut self) -> MediaResult<()> {
        let Some(session) = self.session.as_mut() else {
            debug!("Stop ignored, no capture session");
            return Ok(());
        };
        if session.state != CaptureState::Recording {
            debug!(
                "Stop ignored, capture session {} is {}",
                session.id, session.state
            );
            return Ok(());
        }

        // The flush chunk arrives after the transition and is dropped
        if let Err(e) = session.device.stop() {
            warn!("⚠️ Device did not stop cleanly: {}", e);
        }
        session.state = CaptureState::Stopped;
        let session_id = session.id;

        if let Err(e) = self.sink.push(OutboundEvent::Stop) {
            warn!("⚠️ Failed to push stop event: {}", e);
            self.stats.sink_failures += 1;
        }

        info!(
            "⏹️ Capture session {} stopped after {} chunks",
            session_id, self.stats.chunks_forwarded
        );
        let _ = self.event_tx.send(CaptureEvent::Stopped {
            session_id,
            chunks_forwarded: self.stats.chunks_forwarded,
        });
        Ok(())
    }

    /// Forward a chunk if recording and non-empty, otherwise drop it
    pub fn on_chunk_produced(&mut self, chunk: Chunk) {
        let state = self.state();
        let size_bytes = chunk.size_bytes();

        let reason = if state != CaptureState::Recording {
            Some(DiscardReason::NotRecording(state))
        } else if chunk.is_empty() {
            Some(DiscardReason::Empty)
        } else {
            None
        };
        if let Some(reason) = reason {
            debug!("🗑️ Discarding {} byte chunk ({:?})", size_bytes, reason);
            self.stats.chunks_discarded += 1;
            let _ = self
                .event_tx
                .send(CaptureEvent::ChunkDiscarded { size_bytes, reason });
            return;
        }

        let Some(session) = self.session.as_ref() else {
            return;
        };
        let sequence = self.stats.chunks_forwarded;
        let metadata = ChunkMetadata {
            session_id: session.id,
            sequence,
            size_bytes,
            captured_at: chunk.captured_at,
            mime_type: self.config.mime_type.clone(),
        };

        match self.sink.push(OutboundEvent::Chunk {
            metadata,
            payload: chunk.payload,
        }) {
            Ok(()) => {
                debug!("📤 Forwarded chunk #{} ({} bytes)", sequence, size_bytes);
                self.stats.chunks_forwarded += 1;
                self.stats.bytes_forwarded += size_bytes as u64;
                let _ = self.event_tx.send(CaptureEvent::ChunkForwarded {
                    sequence,
                    size_bytes,
                });
            }
            Err(e) => {
                warn!("⚠️ Failed to push chunk #{}: {}", sequence, e);
                self.stats.sink_failures += 1;
            }
        }
    }

    /// Release the device and return to `Idle`, stopping first if needed
    pub fn release(&mut self) -> MediaResult<()> {
        self.stop()?;
        if let Some(session) = self.session.take() {
            let session_id = session.id;
            drop(session);
            info!("📷 Capture session {} released", session_id);
            let _ = self.event_tx.send(CaptureEvent::Released { session_id });
        }
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> CaptureState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(CaptureState::Idle)
    }

    /// Current session, if a device is held
    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Get current statistics
    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// Get current configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Subscribe to capture events
    pub fn subscribe_events(&self) -> broadcast::Receiver<CaptureEvent> {
        self.event_tx.subscribe()
    }
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("stats", &self.stats)
            .finish()
    }
}
