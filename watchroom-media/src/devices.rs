//! Media device gateway
//!
//! Thin capability wrapper over the host's camera/microphone access. Every
//! request either yields an acquired [`MediaStream`] or fails with
//! [`MediaError::PermissionDenied`] / [`MediaError::DeviceUnavailable`]. There
//! are no retries at this layer; callers decide their own policy.

use crate::error::{MediaError, MediaResult};
use crate::tracks::{MediaKind, MediaStream};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which kinds of device a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    /// Request a camera track
    pub video: bool,
    /// Request a microphone track
    pub audio: bool,
}

impl MediaConstraints {
    /// Camera only
    pub const VIDEO: Self = Self {
        video: true,
        audio: false,
    };

    /// Microphone only
    pub const AUDIO: Self = Self {
        video: false,
        audio: true,
    };

    /// Camera and microphone in a single request
    pub const VIDEO_AND_AUDIO: Self = Self {
        video: true,
        audio: true,
    };

    /// Constraints for a single kind
    pub fn only(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => Self::VIDEO,
            MediaKind::Audio => Self::AUDIO,
        }
    }

    /// Whether the request asks for `kind`
    pub fn wants(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Video => self.video,
            MediaKind::Audio => self.audio,
        }
    }

    /// Whether the request asks for nothing
    pub fn is_empty(&self) -> bool {
        !self.video && !self.audio
    }
}

impl fmt::Display for MediaConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.video, self.audio) {
            (true, true) => f.write_str("camera+microphone"),
            (true, false) => f.write_str("camera"),
            (false, true) => f.write_str("microphone"),
            (false, false) => f.write_str("nothing"),
        }
    }
}

/// Host capability for acquiring capture hardware
#[async_trait]
pub trait MediaDevices: Send + Sync + fmt::Debug {
    /// Acquire a stream satisfying `constraints`.
    ///
    /// The returned future may stay pending for as long as the host keeps
    /// its permission prompt open.
    async fn get_user_media(&self, constraints: MediaConstraints) -> MediaResult<MediaStream>;
}

/// Gateway used by the capture manager to reach the hardware
#[derive(Debug, Clone)]
pub struct MediaDeviceGateway {
    devices: Arc<dyn MediaDevices>,
}

impl MediaDeviceGateway {
    /// Wrap a host implementation
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self { devices }
    }

    /// Camera only
    pub async fn request_video(&self) -> MediaResult<MediaStream> {
        self.request(MediaConstraints::VIDEO).await
    }

    /// Microphone only
    pub async fn request_audio(&self) -> MediaResult<MediaStream> {
        self.request(MediaConstraints::AUDIO).await
    }

    /// Camera and microphone in a single request
    pub async fn request_video_and_audio(&self) -> MediaResult<MediaStream> {
        self.request(MediaConstraints::VIDEO_AND_AUDIO).await
    }

    /// Arbitrary request
    pub async fn request(&self, constraints: MediaConstraints) -> MediaResult<MediaStream> {
        if constraints.is_empty() {
            return Err(MediaError::InvalidConstraints {
                message: "at least one of video or audio must be requested".to_string(),
            });
        }

        debug!("Requesting {}", constraints);
        let stream = self.devices.get_user_media(constraints).await?;
        debug!(
            "Acquired stream {} with {} track(s)",
            stream.id(),
            stream.tracks().len()
        );
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints() {
        assert!(MediaConstraints::VIDEO_AND_AUDIO.wants(MediaKind::Video));
        assert!(MediaConstraints::VIDEO_AND_AUDIO.wants(MediaKind::Audio));
        assert!(!MediaConstraints::AUDIO.wants(MediaKind::Video));
        assert_eq!(MediaConstraints::only(MediaKind::Video), MediaConstraints::VIDEO);
        assert!(MediaConstraints {
            video: false,
            audio: false
        }
        .is_empty());
        assert_eq!(MediaConstraints::VIDEO_AND_AUDIO.to_string(), "camera+microphone");
    }
}
