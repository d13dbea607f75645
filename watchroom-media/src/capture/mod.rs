//! Local capture management
//!
//! The [`LocalCaptureManager`] exclusively owns the local participant's
//! camera+microphone stream. Toggling a kind flips `enabled` on the tracks that
//! are already acquired; the hardware is never stopped or requested again, so
//! toggles are instant and never re-prompt for permission.

use crate::devices::MediaDeviceGateway;
use crate::error::MediaError;
use crate::tracks::{MediaKind, MediaStream, StreamView};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Stream id given to a stream assembled from per-kind fallback requests
pub const MERGED_STREAM_ID: &str = "local-capture";

/// Capture configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// When the combined camera+microphone request fails, request each kind
    /// on its own so a denied microphone does not cost the camera
    pub per_kind_fallback: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            per_kind_fallback: true,
        }
    }
}

/// Result of one capture attempt
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    /// Whatever could be acquired
    pub stream: Option<MediaStream>,
    /// Every failure met on the way, in request order
    pub errors: Vec<MediaError>,
}

impl CaptureOutcome {
    fn acquired(stream: MediaStream) -> Self {
        Self {
            stream: Some(stream),
            errors: Vec::new(),
        }
    }

    /// Whether nothing at all could be acquired
    pub fn is_failure(&self) -> bool {
        self.stream.is_none()
    }
}

/// Read-only handle for the self-view surface
#[derive(Debug, Clone)]
pub struct LocalPreview {
    view: StreamView,
}

impl LocalPreview {
    /// Stream being previewed
    pub fn stream_id(&self) -> &str {
        self.view.id()
    }

    /// Camera indicator
    pub fn camera_on(&self) -> bool {
        self.view.enabled(MediaKind::Video).unwrap_or(false)
    }

    /// Microphone indicator
    pub fn microphone_on(&self) -> bool {
        self.view.enabled(MediaKind::Audio).unwrap_or(false)
    }

    /// Whether the owner still holds the stream
    pub fn is_live(&self) -> bool {
        self.view.is_live()
    }

    /// Underlying weak view
    pub fn view(&self) -> &StreamView {
        &self.view
    }
}

/// Owner of the local camera+microphone stream
#[derive(Debug)]
pub struct LocalCaptureManager {
    gateway: MediaDeviceGateway,
    config: CaptureConfig,
    stream: Option<MediaStream>,
}

impl LocalCaptureManager {
    /// Create a manager that acquires through `gateway`
    pub fn new(gateway: MediaDeviceGateway, config: CaptureConfig) -> Self {
        Self {
            gateway,
            config,
            stream: None,
        }
    }

    /// Build the acquisition future.
    ///
    /// The future borrows nothing from the manager, so the caller can run it
    /// detached and hand the outcome back through [`LocalCaptureManager::adopt`]
    /// once it knows the result is still wanted.
    pub fn request(&self) -> BoxFuture<'static, CaptureOutcome> {
        let gateway = self.gateway.clone();
        let per_kind_fallback = self.config.per_kind_fallback;

        async move {
            let error = match gateway.request_video_and_audio().await {
                Ok(stream) => return CaptureOutcome::acquired(stream),
                Err(error) => error,
            };

            if !per_kind_fallback {
                return CaptureOutcome {
                    stream: None,
                    errors: vec![error],
                };
            }

            warn!("Camera+microphone request failed ({}), trying each device alone", error);
            let (video, audio) = futures::join!(gateway.request_video(), gateway.request_audio());

            let mut errors = vec![error];
            let mut streams = Vec::new();
            for result in [video, audio] {
                match result {
                    Ok(stream) => streams.push(stream),
                    Err(error) => errors.push(error),
                }
            }

            let stream = match streams.len() {
                0 => None,
                1 => streams.pop(),
                _ => Some(MediaStream::merge(MERGED_STREAM_ID, streams)),
            };
            CaptureOutcome { stream, errors }
        }
        .boxed()
    }

    /// Take exclusive ownership of an acquired stream.
    ///
    /// A stream offered while another one is held is dropped, which stops its
    /// tracks.
    pub fn adopt(&mut self, stream: MediaStream) -> Result<(), MediaError> {
        if let Some(current) = &self.stream {
            return Err(MediaError::CaptureAlreadyActive {
                stream_id: current.id().to_string(),
            });
        }

        info!(
            "📹 Local capture active: stream {} (camera: {}, microphone: {})",
            stream.id(),
            stream.has_kind(MediaKind::Video),
            stream.has_kind(MediaKind::Audio)
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Whether a stream is held
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Held stream, if any
    pub fn stream(&self) -> Option<&MediaStream> {
        self.stream.as_ref()
    }

    /// Read-only handle for display
    pub fn preview(&self) -> Option<LocalPreview> {
        self.stream.as_ref().map(|stream| LocalPreview {
            view: stream.view(),
        })
    }

    /// Camera indicator, read straight from the tracks
    pub fn camera_enabled(&self) -> bool {
        self.enabled(MediaKind::Video)
    }

    /// Microphone indicator, read straight from the tracks
    pub fn microphone_enabled(&self) -> bool {
        self.enabled(MediaKind::Audio)
    }

    /// Indicator for one kind
    pub fn enabled(&self, kind: MediaKind) -> bool {
        self.stream
            .as_ref()
            .and_then(|stream| stream.enabled(kind))
            .unwrap_or(false)
    }

    /// Flip the camera tracks; `None` when there is no camera to toggle
    pub fn toggle_camera(&mut self) -> Option<bool> {
        self.toggle(MediaKind::Video)
    }

    /// Flip the microphone tracks; `None` when there is no microphone to toggle
    pub fn toggle_microphone(&mut self) -> Option<bool> {
        self.toggle(MediaKind::Audio)
    }

    /// Flip every track of `kind` on the held stream
    pub fn toggle(&mut self, kind: MediaKind) -> Option<bool> {
        let stream = self.stream.as_ref()?;
        let enabled = !stream.enabled(kind)?;
        stream.set_enabled(kind, enabled);
        info!("Local {} {}", kind, if enabled { "enabled" } else { "disabled" });
        Some(enabled)
    }

    /// Stop every held track and forget the stream.
    ///
    /// Returns how many tracks were stopped; zero on repeated calls.
    pub fn release(&mut self) -> usize {
        match self.stream.take() {
            Some(stream) => {
                let stopped = stream.stop_all();
                info!("Released local capture stream {} ({} track(s))", stream.id(), stopped);
                stopped
            }
            None => 0,
        }
    }
}
