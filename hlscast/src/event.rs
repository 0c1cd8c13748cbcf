//! Observer events of a bridge session

use crate::{CaptureEvent, PlaybackEvent};
use tokio::sync::broadcast;
use tracing::debug;

/// Everything a bridge session reports to observers
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Capture side transition
    Capture(CaptureEvent),
    /// Playback side transition
    Playback(PlaybackEvent),
    /// A command or trigger failed inside the session
    SessionError {
        /// Error that occurred
        error: String,
        /// Whether the session can carry on
        recoverable: bool,
    },
    /// The session task ended
    SessionClosed,
}

impl Event {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Capture(event) => match event {
                CaptureEvent::Armed { .. } => "capture_armed",
                CaptureEvent::RecordingStarted { .. } => "recording_started",
                CaptureEvent::ChunkForwarded { .. } => "chunk_forwarded",
                CaptureEvent::ChunkDiscarded { .. } => "chunk_discarded",
                CaptureEvent::Stopped { .. } => "recording_stopped",
                CaptureEvent::Released { .. } => "device_released",
            },
            Event::Playback(event) => match event {
                PlaybackEvent::Attached { .. } => "playback_attached",
                PlaybackEvent::PlayRequested { .. } => "play_requested",
                PlaybackEvent::PlaybackError { .. } => "playback_error",
            },
            Event::SessionError { .. } => "session_error",
            Event::SessionClosed => "session_closed",
        }
    }

    /// Check if this is a capture event
    pub fn is_capture_event(&self) -> bool {
        matches!(self, Event::Capture(_))
    }

    /// Check if this is a playback event
    pub fn is_playback_event(&self) -> bool {
        matches!(self, Event::Playback(_))
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        matches!(
            self,
            Event::SessionError { .. } | Event::Playback(PlaybackEvent::PlaybackError { .. })
        )
    }
}

impl From<CaptureEvent> for Event {
    fn from(event: CaptureEvent) -> Self {
        Event::Capture(event)
    }
}

impl From<PlaybackEvent> for Event {
    fn from(event: PlaybackEvent) -> Self {
        Event::Playback(event)
    }
}

/// Stream of session events for async iteration
///
/// A slow reader skips the events it missed instead of failing.
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<Event>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: broadcast::Receiver<Event>) -> Self {
        Self { receiver }
    }

    /// Get the next event from the stream
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!("Event stream lagged, skipped {} events", missed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to get the next event without blocking
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    debug!("Event stream lagged, skipped {} events", missed);
                }
                Err(_) => return None,
            }
        }
    }

    /// Restrict the stream to events matching `filter`
    pub fn filtered(self, filter: EventFilter) -> FilteredEventStream {
        FilteredEventStream::new(self, filter)
    }
}

/// Event filter for selective event processing
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Whether to include capture events
    pub include_capture_events: bool,
    /// Whether to include playback events
    pub include_playback_events: bool,
    /// Whether to include session level events
    pub include_session_events: bool,
    /// Specific event types to include (if specified, overrides other filters)
    pub specific_event_types: Option<Vec<String>>,
}

impl EventFilter {
    /// Create a filter that includes all events
    pub fn all() -> Self {
        Self {
            include_capture_events: true,
            include_playback_events: true,
            include_session_events: true,
            specific_event_types: None,
        }
    }

    /// Create a filter that includes only capture events
    pub fn capture_only() -> Self {
        Self {
            include_capture_events: true,
            include_playback_events: false,
            include_session_events: false,
            specific_event_types: None,
        }
    }

    /// Create a filter that includes only playback events
    pub fn playback_only() -> Self {
        Self {
            include_capture_events: false,
            include_playback_events: true,
            include_session_events: false,
            specific_event_types: None,
        }
    }

    /// Create a filter for specific event types
    pub fn specific(event_types: Vec<String>) -> Self {
        Self {
            include_capture_events: false,
            include_playback_events: false,
            include_session_events: false,
            specific_event_types: Some(event_types),
        }
    }

    /// Check if an event should be included based on this filter
    pub fn should_include(&self, event: &Event) -> bool {
        if let Some(ref specific_types) = self.specific_event_types {
            return specific_types.iter().any(|t| t == event.event_type());
        }

        (self.include_capture_events && event.is_capture_event())
            || (self.include_playback_events && event.is_playback_event())
            || (self.include_session_events
                && !event.is_capture_event()
                && !event.is_playback_event())
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Filtered event stream that only yields events matching a filter
#[derive(Debug)]
pub struct FilteredEventStream {
    stream: EventStream,
    filter: EventFilter,
}

impl FilteredEventStream {
    /// Create a new filtered event stream
    pub fn new(stream: EventStream, filter: EventFilter) -> Self {
        Self { stream, filter }
    }

    /// Get the next event that matches the filter
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            let event = self.stream.next().await?;
            if self.filter.should_include(&event) {
                return Some(event);
            }
        }
    }

    /// Try to get the next filtered event without blocking
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            let event = self.stream.try_next()?;
            if self.filter.should_include(&event) {
                return Some(event);
            }
        }
    }

    /// Get the current filter
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiscardReason, EngineKind, PlaybackEngineError, PlaybackErrorKind};
    use uuid::Uuid;

    fn recording_started() -> Event {
        CaptureEvent::RecordingStarted {
            session_id: Uuid::new_v4(),
        }
        .into()
    }

    fn attached() -> Event {
        PlaybackEvent::Attached {
            engine_kind: EngineKind::Native,
            manifest_uri: Some("/output/playlist.m3u8".to_string()),
        }
        .into()
    }

    #[test]
    fn test_event_type_classification() {
        let started = recording_started();
        assert_eq!(started.event_type(), "recording_started");
        assert!(started.is_capture_event());
        assert!(!started.is_playback_event());

        let discarded = Event::Capture(CaptureEvent::ChunkDiscarded {
            size_bytes: 0,
            reason: DiscardReason::Empty,
        });
        assert_eq!(discarded.event_type(), "chunk_discarded");

        let playback_error = Event::Playback(PlaybackEvent::PlaybackError {
            error: PlaybackEngineError::new(PlaybackErrorKind::Network, "timeout", false),
        });
        assert!(playback_error.is_playback_event());
        assert!(playback_error.is_error_event());

        assert_eq!(Event::SessionClosed.event_type(), "session_closed");
        assert!(!Event::SessionClosed.is_error_event());
    }

    #[test]
    fn test_event_filter() {
        let capture = EventFilter::capture_only();
        assert!(capture.should_include(&recording_started()));
        assert!(!capture.should_include(&attached()));
        assert!(!capture.should_include(&Event::SessionClosed));

        let playback = EventFilter::playback_only();
        assert!(playback.should_include(&attached()));
        assert!(!playback.should_include(&recording_started()));

        let all = EventFilter::default();
        assert!(all.should_include(&Event::SessionClosed));

        let specific = EventFilter::specific(vec!["playback_attached".to_string()]);
        assert!(specific.should_include(&attached()));
        assert!(!specific.should_include(&recording_started()));
    }

    #[tokio::test]
    async fn test_filtered_event_stream() {
        let (tx, rx) = broadcast::channel(16);
        let mut stream = EventStream::new(rx).filtered(EventFilter::playback_only());

        tx.send(recording_started()).unwrap();
        tx.send(attached()).unwrap();
        tx.send(Event::SessionClosed).unwrap();
        drop(tx);

        assert_eq!(stream.next().await, Some(attached()));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_lagging_stream_skips_ahead() {
        let (tx, rx) = broadcast::channel(2);
        let mut stream = EventStream::new(rx);

        for _ in 0..4 {
            tx.send(recording_started()).unwrap();
        }
        tx.send(Event::SessionClosed).unwrap();

        // Oldest events were overwritten; the stream resumes at what is left
        let mut seen = Vec::new();
        while let Some(event) = stream.try_next() {
            seen.push(event.event_type());
        }
        assert_eq!(seen, vec!["recording_started", "session_closed"]);
    }
}
