//! Error types for Watchroom sessions

use thiserror::Error;

/// Main error type for room session operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Invalid configuration value
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration {
        /// Configuration field that failed validation
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },

    /// Invalid state error
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Participant already exists
    #[error("Participant {participant_id} already exists")]
    ParticipantAlreadyExists {
        /// Participant ID that already exists
        participant_id: String,
    },

    /// Participant not found
    #[error("Participant {participant_id} not found")]
    ParticipantNotFound {
        /// Participant ID that was not found
        participant_id: String,
    },

    /// The local participant can never leave the roster on its own
    #[error("The local participant cannot be removed from the roster")]
    LocalParticipantRemoval,

    /// A resource was released that is not currently held
    #[error("Resource not held: {resource}")]
    ResourceNotHeld {
        /// Resource description
        resource: String,
    },

    /// Media layer failure surfaced to the session
    #[error("Media error: {reason}")]
    Media {
        /// Reason for the media failure
        reason: String,
    },
}

impl RoomError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            RoomError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            RoomError::MissingConfiguration { .. } => "MISSING_CONFIGURATION",
            RoomError::InvalidState { .. } => "INVALID_STATE",
            RoomError::ParticipantAlreadyExists { .. } => "PARTICIPANT_ALREADY_EXISTS",
            RoomError::ParticipantNotFound { .. } => "PARTICIPANT_NOT_FOUND",
            RoomError::LocalParticipantRemoval => "LOCAL_PARTICIPANT_REMOVAL",
            RoomError::ResourceNotHeld { .. } => "RESOURCE_NOT_HELD",
            RoomError::Media { .. } => "MEDIA_ERROR",
        }
    }

    /// Whether the session can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            RoomError::InvalidConfiguration { .. } | RoomError::MissingConfiguration { .. } => {
                false
            }
            RoomError::InvalidState { .. } => true,
            RoomError::ParticipantAlreadyExists { .. }
            | RoomError::ParticipantNotFound { .. }
            | RoomError::LocalParticipantRemoval => true,
            RoomError::ResourceNotHeld { .. } => true,
            RoomError::Media { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let error = RoomError::InvalidConfiguration {
            field: "operating_hours".to_string(),
            reason: "open hour must precede close hour".to_string(),
        };
        assert_eq!(error.error_code(), "INVALID_CONFIGURATION");
        assert!(!error.is_recoverable());

        let error = RoomError::ParticipantNotFound {
            participant_id: "ghost".to_string(),
        };
        assert_eq!(error.error_code(), "PARTICIPANT_NOT_FOUND");
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = RoomError::InvalidState {
            expected: "active".to_string(),
            actual: "exited".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid state: expected active, got exited"
        );
    }
}
