//! Event system for session, roster and media events

use crate::room::SessionState;
use std::fmt;
use tokio::sync::mpsc;
use watchroom_media::{MediaError, MediaKind, PlaybackState};

/// Why the session asks to go back to the join screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The room was entered outside its operating hours
    OutsideOperatingHours {
        /// Local hour at mount
        hour: u32,
    },
    /// The user pressed exit
    UserExit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::OutsideOperatingHours { hour } => {
                write!(f, "outside operating hours (hour {})", hour)
            }
            ExitReason::UserExit => f.write_str("user exit"),
        }
    }
}

/// Events emitted by a room session
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The session moved to another lifecycle state
    StateChanged {
        /// Previous state
        from: SessionState,
        /// New state
        to: SessionState,
    },
    /// A participant was added to the roster
    ParticipantJoined {
        /// Participant ID
        participant_id: String,
        /// Display name
        name: String,
    },
    /// A participant was removed from the roster
    ParticipantLeft {
        /// Participant ID
        participant_id: String,
    },
    /// Local capture produced a stream
    CaptureStarted {
        /// Stream ID
        stream_id: String,
        /// Whether a camera track was acquired
        camera: bool,
        /// Whether a microphone track was acquired
        microphone: bool,
    },
    /// A capture request failed; the session carries on
    CaptureFailed {
        /// Failure reported by the device layer
        error: MediaError,
    },
    /// A local track kind was enabled or disabled
    TrackToggled {
        /// Track kind
        kind: MediaKind,
        /// New `enabled` flag
        enabled: bool,
    },
    /// Main playback changed state
    PlaybackStateChanged {
        /// New state
        state: PlaybackState,
    },
    /// Main volume changed
    VolumeChanged {
        /// New volume (0-100)
        volume: u8,
    },
    /// Main mute flag changed
    MuteChanged {
        /// Whether output is now muted
        muted: bool,
    },
    /// The host should navigate back to the join screen
    NavigateToJoin {
        /// Why
        reason: ExitReason,
    },
    /// A non-fatal failure outside capture and playback
    RoomError {
        /// Error that occurred
        error: String,
        /// Whether this error is recoverable
        recoverable: bool,
    },
}

impl Event {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::StateChanged { .. } => "state_changed",
            Event::ParticipantJoined { .. } => "participant_joined",
            Event::ParticipantLeft { .. } => "participant_left",
            Event::CaptureStarted { .. } => "capture_started",
            Event::CaptureFailed { .. } => "capture_failed",
            Event::TrackToggled { .. } => "track_toggled",
            Event::PlaybackStateChanged { .. } => "playback_state_changed",
            Event::VolumeChanged { .. } => "volume_changed",
            Event::MuteChanged { .. } => "mute_changed",
            Event::NavigateToJoin { .. } => "navigate_to_join",
            Event::RoomError { .. } => "room_error",
        }
    }

    /// Check if this is a lifecycle event
    pub fn is_session_event(&self) -> bool {
        matches!(
            self,
            Event::StateChanged { .. } | Event::NavigateToJoin { .. }
        )
    }

    /// Check if this is a participant-related event
    pub fn is_participant_event(&self) -> bool {
        matches!(
            self,
            Event::ParticipantJoined { .. } | Event::ParticipantLeft { .. }
        )
    }

    /// Check if this is a local capture event
    pub fn is_capture_event(&self) -> bool {
        matches!(
            self,
            Event::CaptureStarted { .. } | Event::CaptureFailed { .. } | Event::TrackToggled { .. }
        )
    }

    /// Check if this is a main playback event
    pub fn is_playback_event(&self) -> bool {
        matches!(
            self,
            Event::PlaybackStateChanged { .. }
                | Event::VolumeChanged { .. }
                | Event::MuteChanged { .. }
        )
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        match self {
            Event::CaptureFailed { .. } | Event::RoomError { .. } => true,
            Event::PlaybackStateChanged { state } => state.is_errored(),
            _ => false,
        }
    }
}

/// Stream of session events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { receiver }
    }

    /// Get the next event from the stream
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Try to get the next event without blocking
    pub fn try_next(&mut self) -> Result<Option<Event>, mpsc::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(mpsc::error::TryRecvError::Disconnected)
            }
        }
    }

    /// Everything queued right now, without waiting
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Close the event stream
    pub fn close(&mut self) {
        self.receiver.close();
    }

    /// Check if the event stream is closed
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

/// Event filter for selective event processing
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Whether to include lifecycle events
    pub include_session_events: bool,
    /// Whether to include participant events
    pub include_participant_events: bool,
    /// Whether to include capture events
    pub include_capture_events: bool,
    /// Whether to include playback events
    pub include_playback_events: bool,
    /// Whether to include error events
    pub include_error_events: bool,
    /// Specific event types to include (if specified, overrides other filters)
    pub specific_event_types: Option<Vec<String>>,
}

impl EventFilter {
    fn none() -> Self {
        Self {
            include_session_events: false,
            include_participant_events: false,
            include_capture_events: false,
            include_playback_events: false,
            include_error_events: false,
            specific_event_types: None,
        }
    }

    /// Create a filter that includes all events
    pub fn all() -> Self {
        Self {
            include_session_events: true,
            include_participant_events: true,
            include_capture_events: true,
            include_playback_events: true,
            include_error_events: true,
            specific_event_types: None,
        }
    }

    /// Lifecycle events only
    pub fn session_only() -> Self {
        Self {
            include_session_events: true,
            ..Self::none()
        }
    }

    /// Create a filter that includes only participant events
    pub fn participant_only() -> Self {
        Self {
            include_participant_events: true,
            ..Self::none()
        }
    }

    /// Local capture events only
    pub fn capture_only() -> Self {
        Self {
            include_capture_events: true,
            ..Self::none()
        }
    }

    /// Main playback events only
    pub fn playback_only() -> Self {
        Self {
            include_playback_events: true,
            ..Self::none()
        }
    }

    /// Create a filter for specific event types
    pub fn specific(event_types: Vec<String>) -> Self {
        Self {
            specific_event_types: Some(event_types),
            ..Self::none()
        }
    }

    /// Check if an event should be included based on this filter
    pub fn should_include(&self, event: &Event) -> bool {
        if let Some(ref specific_types) = self.specific_event_types {
            return specific_types.iter().any(|t| t == event.event_type());
        }

        (self.include_session_events && event.is_session_event())
            || (self.include_participant_events && event.is_participant_event())
            || (self.include_capture_events && event.is_capture_event())
            || (self.include_playback_events && event.is_playback_event())
            || (self.include_error_events && event.is_error_event())
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
        while let Some(event) = self.stream.next().await {
            if self.filter.should_include(&event) {
                return Some(event);
            }
        }
        None
    }

    /// Try to get the next filtered event without blocking
    pub fn try_next(&mut self) -> Result<Option<Event>, mpsc::error::TryRecvError> {
        while let Some(event) = self.stream.try_next()? {
            if self.filter.should_include(&event) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    /// Update the filter
    pub fn set_filter(&mut self, filter: EventFilter) {
        self.filter = filter;
    }

    /// Get the current filter
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}
