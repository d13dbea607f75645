//! Serializable snapshot of a session for debugging
//!
//! The report is plain data: the facade crate fills it in from live session
//! state, this crate only knows how to render it.

use serde::Serialize;
use watchroom_core::{ResourceUsage, RoomError};

/// One roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    /// Participant id
    pub id: String,
    /// Display name
    pub name: String,
    /// Join time, ISO 8601 local time
    pub joined_at: String,
    /// Whether the entry is the local user
    pub local: bool,
    /// Whether an audio stream is attached
    pub has_audio: bool,
}

/// Local capture indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureSummary {
    /// A stream is held
    pub active: bool,
    /// Camera indicator
    pub camera_on: bool,
    /// Microphone indicator
    pub microphone_on: bool,
}

/// Main playback status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSummary {
    /// `loading`, `playing` or `errored`
    pub state: String,
    /// Viewer-facing message when errored
    pub error_message: Option<String>,
    /// Stored volume (0-100)
    pub volume: u8,
    /// Mute flag
    pub muted: bool,
}

/// Snapshot of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Session id
    pub session_id: String,
    /// Lifecycle state name
    pub state: String,
    /// Mount epoch
    pub epoch: u64,
    /// Roster in join order
    pub roster: Vec<ParticipantSummary>,
    /// Local capture
    pub capture: CaptureSummary,
    /// Main playback
    pub playback: PlaybackSummary,
    /// Tracked hardware and host resources
    pub resources: ResourceUsage,
}

impl SessionReport {
    /// Whether any tracked resource is still held
    pub fn has_outstanding_resources(&self) -> bool {
        self.resources.held_total() > 0
    }

    /// Render as indented JSON
    pub fn to_json_pretty(&self) -> Result<String, RoomError> {
        serde_json::to_string_pretty(self).map_err(|e| RoomError::InvalidState {
            expected: "serializable report".to_string(),
            actual: e.to_string(),
        })
    }
}
