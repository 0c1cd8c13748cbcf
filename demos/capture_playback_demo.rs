//! Capture → backend → playback demo
//!
//! Records a synthetic camera for a few seconds, ships the chunks to an
//! in-process backend and attaches native playback once the backend reports
//! the playlist as ready.

use anyhow::Context;
use hlscast::{
    local_channel, CanPlay, EngineKind, Event, EventFilter, HlsCast, LocalBackend, MediaElement,
    MediaElementEvent, NoAdaptiveRuntime, OutboundEvent, PlaybackEngineError,
    SyntheticDeviceProvider, HLS_MIME_TYPE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Prints what a real player would do and fires "metadata loaded" right away
struct ConsoleScreen {
    events: mpsc::UnboundedSender<MediaElementEvent>,
}

impl MediaElement for ConsoleScreen {
    fn can_play_type(&self, mime_type: &str) -> CanPlay {
        if mime_type == HLS_MIME_TYPE {
            CanPlay::Maybe
        } else {
            CanPlay::No
        }
    }

    fn set_source(&self, uri: &str) {
        println!("   📺 Screen source set to {}", uri);
        let _ = self.events.send(MediaElementEvent::MetadataLoaded);
    }

    fn play(&self) -> Result<(), PlaybackEngineError> {
        println!("   ▶️  Screen playing");
        Ok(())
    }
}

/// Counts chunks and declares the playlist ready after the third one
async fn run_backend(mut backend: LocalBackend) -> anyhow::Result<usize> {
    let mut received = 0usize;
    let mut bytes = 0usize;

    while let Some(event) = backend.outbound.recv().await {
        match event {
            OutboundEvent::Chunk { metadata, payload } => {
                received += 1;
                bytes += payload.len();
                println!(
                    "   📦 Backend got chunk #{} ({} bytes, {})",
                    metadata.sequence,
                    payload.len(),
                    metadata.mime_type
                );
                if received == 3 {
                    backend
                        .notify_playlist_ready()
                        .context("session went away before playlist_ready")?;
                }
            }
            OutboundEvent::Stop => {
                println!("   🛑 Backend got stop after {} bytes", bytes);
                break;
            }
        }
    }
    Ok(received)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hlscast::init_logging();

    println!("🎥 hlscast Capture & Playback Demo");
    println!("==================================");

    let hlscast = HlsCast::init()?;
    let (sink, inbound, backend) = local_channel();
    let (element_tx, element_rx) = mpsc::unbounded_channel();
    let backend_task = tokio::spawn(run_backend(backend));

    let session = hlscast
        .session()
        .device_provider(Arc::new(SyntheticDeviceProvider::new()))
        .adaptive_runtime(Arc::new(NoAdaptiveRuntime))
        .media_element(Arc::new(ConsoleScreen { events: element_tx }), element_rx)
        .event_channel(Arc::new(sink), inbound)
        .start()
        .await
        .context("failed to start bridge session")?;

    let mut playback = session.events().filtered(EventFilter::playback_only());

    println!("\n🔴 Recording for 5 seconds");
    session.start().await?;
    tokio::time::sleep(Duration::from_secs(5)).await;
    session.stop().await?;

    let chunks = backend_task.await??;
    println!("\n✅ Backend received {} chunks", chunks);

    while let Some(event) = playback.try_next() {
        if let Event::Playback(hlscast::PlaybackEvent::Attached { engine_kind, .. }) = &event {
            let path = match engine_kind {
                EngineKind::Adaptive => "adaptive engine",
                EngineKind::Native => "native element",
                EngineKind::None => "nothing",
            };
            println!("   Playback attached via {}", path);
        }
    }

    let snapshot = session.snapshot().await?;
    println!(
        "\n📊 Forwarded {} chunks, discarded {}, {} play requests",
        snapshot.capture_stats.chunks_forwarded,
        snapshot.capture_stats.chunks_discarded,
        snapshot.playback_stats.play_requests
    );

    session.shutdown().await?;
    println!("\n✨ Demo completed!");
    Ok(())
}
