//! Participant roster
//!
//! The roster is an in-memory list in join order. The local participant is
//! always first and always has the id [`LOCAL_PARTICIPANT_ID`]. Other entries
//! are decorative placeholders without media; nothing is received over the
//! network.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use watchroom_core::RoomError;
use watchroom_media::StreamView;

/// Id of the local participant
pub const LOCAL_PARTICIPANT_ID: &str = "current-user";

/// What a roster entry stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// The user of this session
    Local,
    /// Decorative entry with no media
    Placeholder,
}

/// A roster entry
#[derive(Debug, Clone)]
pub struct Participant {
    id: String,
    name: String,
    joined_at: NaiveDateTime,
    role: ParticipantRole,
    audio_stream: Option<StreamView>,
}

impl Participant {
    /// Create the local participant
    pub fn local(name: impl Into<String>, joined_at: NaiveDateTime) -> Self {
        Self {
            id: LOCAL_PARTICIPANT_ID.to_string(),
            name: name.into(),
            joined_at,
            role: ParticipantRole::Local,
            audio_stream: None,
        }
    }

    /// Create a placeholder with a fresh id
    pub fn placeholder(name: impl Into<String>, joined_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            joined_at,
            role: ParticipantRole::Placeholder,
            audio_stream: None,
        }
    }

    /// Get participant ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local time of joining
    pub fn joined_at(&self) -> NaiveDateTime {
        self.joined_at
    }

    /// Role
    pub fn role(&self) -> ParticipantRole {
        self.role
    }

    /// Whether this is the local participant
    pub fn is_local(&self) -> bool {
        self.role == ParticipantRole::Local
    }

    /// Attached audio, if any
    pub fn audio_stream(&self) -> Option<&StreamView> {
        self.audio_stream.as_ref()
    }
}

/// Collection of participants in a room
#[derive(Debug, Default)]
pub struct Participants {
    entries: Vec<Participant>,
}

impl Participants {
    /// Empty roster, as before entry and after teardown
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster holding only the local participant
    pub fn with_local(name: impl Into<String>, joined_at: NaiveDateTime) -> Self {
        Self {
            entries: vec![Participant::local(name, joined_at)],
        }
    }

    /// The local participant
    pub fn local(&self) -> Option<&Participant> {
        self.entries.first().filter(|participant| participant.is_local())
    }

    /// Look up by id
    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.entries.iter().find(|participant| participant.id == id)
    }

    /// Entries in join order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a participant
    pub fn insert(&mut self, participant: Participant) -> Result<&Participant, RoomError> {
        if self.get(&participant.id).is_some() {
            return Err(RoomError::ParticipantAlreadyExists {
                participant_id: participant.id,
            });
        }
        if participant.is_local() && !self.entries.is_empty() {
            return Err(RoomError::InvalidState {
                expected: "empty roster".to_string(),
                actual: format!("{} participant(s)", self.entries.len()),
            });
        }

        debug!("Participant {} ({}) joined", participant.id, participant.name);
        let index = self.entries.len();
        self.entries.push(participant);
        Ok(&self.entries[index])
    }

    /// Remove a placeholder; the local participant cannot be removed
    pub fn remove(&mut self, id: &str) -> Result<Participant, RoomError> {
        let index = self
            .entries
            .iter()
            .position(|participant| participant.id == id)
            .ok_or_else(|| RoomError::ParticipantNotFound {
                participant_id: id.to_string(),
            })?;
        if self.entries[index].is_local() {
            return Err(RoomError::LocalParticipantRemoval);
        }
        Ok(self.entries.remove(index))
    }

    /// Attach an audio stream reference; the only mutation a participant sees
    pub fn attach_audio_stream(&mut self, id: &str, stream: StreamView) -> Result<(), RoomError> {
        let participant = self
            .entries
            .iter_mut()
            .find(|participant| participant.id == id)
            .ok_or_else(|| RoomError::ParticipantNotFound {
                participant_id: id.to_string(),
            })?;
        participant.audio_stream = Some(stream);
        Ok(())
    }

    /// Drop every entry, returning how many there were
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
