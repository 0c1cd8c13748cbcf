//! WebSocket client side of the event channel

use crate::error::SignalingError;
use crate::protocol::{encode_outbound, ControlMessage};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use hlscast_core::{EventSink, HlsCastError, InboundReceiver, InboundSender, OutboundEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, WebSocketStream};
use tracing::{debug, info, warn};
use tungstenite::Message;

/// Counters for one connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Frames written to the socket
    pub frames_sent: u64,
    /// Bytes written to the socket, frame bodies only
    pub bytes_sent: u64,
    /// Inbound events delivered to the client
    pub events_received: u64,
    /// Inbound frames skipped because they could not be understood
    pub frames_skipped: u64,
}

/// Entry point for connecting to the backend
#[derive(Debug)]
pub struct SignalingClient;

impl SignalingClient {
    /// Dial `url` and split the socket into an event sink and an inbound receiver
    pub async fn connect(url: &str) -> Result<(WsEventSink, InboundReceiver), SignalingError> {
        let (ws, _response) =
            connect_async(url)
                .await
                .map_err(|source| SignalingError::ConnectionFailed {
                    url: url.to_string(),
                    source,
                })?;

        info!("🔌 Connected to {}", url);
        Ok(Self::from_stream(ws))
    }

    /// Wrap an already established WebSocket
    ///
    /// Must be called inside a tokio runtime: a writer and a reader task are
    /// spawned for the lifetime of the connection.
    pub fn from_stream<S>(ws: WebSocketStream<S>) -> (WsEventSink, InboundReceiver)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (write, read) = ws.split();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(ChannelStats::default()));

        let writer = tokio::spawn(write_loop(write, queue_rx, stats.clone()));
        let reader = tokio::spawn(read_loop(read, inbound_tx, stats.clone()));

        (
            WsEventSink {
                queue: queue_tx,
                writer: Some(writer),
                reader,
                stats,
            },
            inbound_rx,
        )
    }
}

/// [`EventSink`] writing to a WebSocket
///
/// `push` only queues; a background task encodes and writes in order.
/// Dropping the sink closes the socket once the queue is drained.
#[derive(Debug)]
pub struct WsEventSink {
    queue: mpsc::UnboundedSender<OutboundEvent>,
    writer: Option<JoinHandle<()>>,
    reader: JoinHandle<()>,
    stats: Arc<Mutex<ChannelStats>>,
}

impl WsEventSink {
    /// Snapshot of the connection counters
    pub fn stats(&self) -> ChannelStats {
        self.stats.lock().clone()
    }

    /// Whether the writer is still accepting events
    pub fn is_open(&self) -> bool {
        !self.queue.is_closed()
    }

    /// Whether the backend side of the socket is still being read
    pub fn is_receiving(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Flush queued events and close the socket
    pub async fn close(mut self) -> Result<(), SignalingError> {
        let writer = self.writer.take();
        drop(self);
        if let Some(writer) = writer {
            writer.await.map_err(|_| SignalingError::Closed)?;
        }
        Ok(())
    }
}

impl EventSink for WsEventSink {
    fn push(&self, event: OutboundEvent) -> Result<(), HlsCastError> {
        let name = event.name();
        self.queue
            .send(event)
            .map_err(|_| HlsCastError::ChannelClosed {
                event: name.to_string(),
            })
    }
}

async fn write_loop<S>(
    mut write: SplitSink<WebSocketStream<S>, Message>,
    mut queue: mpsc::UnboundedReceiver<OutboundEvent>,
    stats: Arc<Mutex<ChannelStats>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(event) = queue.recv().await {
        let message = match encode_outbound(&event) {
            Ok(message) => message,
            Err(e) => {
                warn!("⚠️ Dropping unencodable {} event: {}", event.name(), e);
                continue;
            }
        };
        let len = message.len() as u64;

        if let Err(e) = write.send(message).await {
            warn!("⚠️ Failed to send {} event: {}", event.name(), e);
            queue.close();
            return;
        }

        let mut counters = stats.lock();
        counters.frames_sent += 1;
        counters.bytes_sent += len;
    }

    debug!("Outbound queue closed, closing socket");
    if let Err(e) = write.close().await {
        debug!("Socket close failed: {}", e);
    }
}

async fn read_loop<S>(
    mut read: SplitStream<WebSocketStream<S>>,
    inbound: InboundSender,
    stats: Arc<Mutex<ChannelStats>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = read.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                debug!("Backend closed the connection: {:?}", frame);
                break;
            }
            Ok(Message::Binary(data)) => {
                warn!("⚠️ Ignoring {} byte binary frame from backend", data.len());
                stats.lock().frames_skipped += 1;
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("⚠️ Connection error: {}", e);
                break;
            }
        };

        let event = match ControlMessage::decode(&text).and_then(|m| m.to_inbound()) {
            Ok(event) => event,
            Err(e) => {
                warn!("⚠️ Skipping inbound frame: {}", e);
                stats.lock().frames_skipped += 1;
                continue;
            }
        };

        debug!("📥 Inbound {}", event.name());
        if inbound.send(event).is_err() {
            debug!("Inbound receiver dropped, stopping reader");
            break;
        }
        stats.lock().events_received += 1;
    }
}
