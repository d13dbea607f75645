//! Media error types and handling
//!
//! Capture and audio-graph failures are recovered locally; only the two main
//! playback failures ([`MediaError::LoadError`] and
//! [`MediaError::PlaybackRejected`]) carry a message meant for the viewer.

use thiserror::Error;
use watchroom_core::RoomError;

/// Message shown when the main content cannot be fetched or decoded
pub const LOAD_ERROR_MESSAGE: &str =
    "Error loading the video. Please check your internet connection and try again.";

/// Message shown when the element refuses to start playback
pub const PLAYBACK_ERROR_MESSAGE: &str = "Error playing the video. Please reload the page.";

/// Main error type for media operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The user or the platform refused access to a capture device
    #[error("Permission denied: {device}")]
    PermissionDenied {
        /// Device that was requested
        device: String,
    },

    /// No usable capture device
    #[error("Device unavailable: {device} - {reason}")]
    DeviceUnavailable {
        /// Device that was requested
        device: String,
        /// Failure reason
        reason: String,
    },

    /// A capture request asked for nothing
    #[error("Invalid constraints: {message}")]
    InvalidConstraints {
        /// Error message
        message: String,
    },

    /// Main content failed to fetch or decode
    #[error("Failed to load {source_url}: {reason}")]
    LoadError {
        /// Source that failed
        source_url: String,
        /// Failure reason reported by the element
        reason: String,
    },

    /// The element refused to start playback
    #[error("Playback rejected: {reason}")]
    PlaybackRejected {
        /// Failure reason reported by the element
        reason: String,
    },

    /// A stream was offered while another one is already owned
    #[error("Capture already holds stream {stream_id}")]
    CaptureAlreadyActive {
        /// Stream that is already owned
        stream_id: String,
    },

    /// The audio graph has already been wired to a stream
    #[error("Audio graph already attached")]
    AudioGraphAlreadyAttached,

    /// The audio graph's context has been closed
    #[error("Audio graph closed")]
    AudioGraphClosed,

    /// Audio specific errors
    #[error("Audio error: {message}")]
    Audio {
        /// Error message
        message: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::PermissionDenied { .. } => true,
            MediaError::DeviceUnavailable { .. } => true,
            MediaError::InvalidConstraints { .. } => false,
            MediaError::LoadError { .. } => false,
            MediaError::PlaybackRejected { .. } => false,
            MediaError::CaptureAlreadyActive { .. } => true,
            MediaError::AudioGraphAlreadyAttached => true,
            MediaError::AudioGraphClosed => true,
            MediaError::Audio { .. } => true,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::PermissionDenied { .. } => ErrorCategory::Permission,
            MediaError::DeviceUnavailable { .. } => ErrorCategory::Device,
            MediaError::InvalidConstraints { .. } => ErrorCategory::Configuration,
            MediaError::LoadError { .. } => ErrorCategory::Network,
            MediaError::PlaybackRejected { .. } => ErrorCategory::Playback,
            MediaError::CaptureAlreadyActive { .. } => ErrorCategory::State,
            MediaError::AudioGraphAlreadyAttached => ErrorCategory::Audio,
            MediaError::AudioGraphClosed => ErrorCategory::Audio,
            MediaError::Audio { .. } => ErrorCategory::Audio,
        }
    }

    /// Message meant for the viewer, for failures that are shown on screen
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            MediaError::LoadError { .. } => Some(LOAD_ERROR_MESSAGE),
            MediaError::PlaybackRejected { .. } => Some(PLAYBACK_ERROR_MESSAGE),
            _ => None,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Access to a device was refused
    Permission,
    /// Device and hardware errors
    Device,
    /// Configuration and parameter errors
    Configuration,
    /// Remote content could not be fetched
    Network,
    /// Playback negotiation errors
    Playback,
    /// State management errors
    State,
    /// Audio-specific errors
    Audio,
}

impl From<MediaError> for RoomError {
    fn from(error: MediaError) -> Self {
        RoomError::Media {
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let denied = MediaError::PermissionDenied {
            device: "microphone".to_string(),
        };
        assert_eq!(denied.category(), ErrorCategory::Permission);
        assert!(denied.is_recoverable());
        assert!(denied.user_message().is_none());

        let load = MediaError::LoadError {
            source_url: "https://example.com/movie.mp4".to_string(),
            reason: "network".to_string(),
        };
        assert_eq!(load.category(), ErrorCategory::Network);
        assert!(!load.is_recoverable());
    }

    #[test]
    fn test_ownership_and_graph_errors() {
        let held = MediaError::CaptureAlreadyActive {
            stream_id: "stream-1".to_string(),
        };
        assert_eq!(held.category(), ErrorCategory::State);
        assert!(held.is_recoverable());

        for error in [MediaError::AudioGraphAlreadyAttached, MediaError::AudioGraphClosed] {
            assert_eq!(error.category(), ErrorCategory::Audio);
            assert!(error.is_recoverable());
            assert!(error.user_message().is_none());
        }
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let load = MediaError::LoadError {
            source_url: "movie.mp4".to_string(),
            reason: "404".to_string(),
        };
        let rejected = MediaError::PlaybackRejected {
            reason: "NotAllowedError".to_string(),
        };

        assert_eq!(load.user_message(), Some(LOAD_ERROR_MESSAGE));
        assert_eq!(rejected.user_message(), Some(PLAYBACK_ERROR_MESSAGE));
        assert_ne!(load.user_message(), rejected.user_message());
    }

    #[test]
    fn test_into_room_error() {
        let error: RoomError = MediaError::AudioGraphClosed.into();
        assert_eq!(error.error_code(), "MEDIA_ERROR");
        assert_eq!(error.to_string(), "Media error: Audio graph closed");
    }
}
