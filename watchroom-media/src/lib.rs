//! # Watchroom Media
//!
//! Media plumbing for a watch-room session: local camera/microphone capture,
//! the shared main-content video element and the per-session audio graph.
//! Host capabilities sit behind traits ([`MediaDevices`], [`MediaElement`],
//! [`AudioBackend`]); the [`simulated`] module provides in-memory versions.

#![warn(clippy::all)]

pub mod audio_graph;
pub mod capture;
pub mod devices;
pub mod error;
pub mod playback;
pub mod simulated;
pub mod tracks;

// Re-export main types
pub use audio_graph::{AudioBackend, AudioContext, AudioGraph, AudioGraphState, NodeId, UNITY_GAIN};
pub use capture::{CaptureConfig, CaptureOutcome, LocalCaptureManager, LocalPreview, MERGED_STREAM_ID};
pub use devices::{MediaConstraints, MediaDeviceGateway, MediaDevices};
pub use error::{
    ErrorCategory, MediaError, MediaResult, LOAD_ERROR_MESSAGE, PLAYBACK_ERROR_MESSAGE,
};
pub use playback::{
    ElementCallback, ElementEventKind, ElementSignal, ListenerId, MediaElement, PlaybackConfig,
    PlaybackController, PlaybackState, DEFAULT_SOURCE_URL, MAX_VOLUME,
};
pub use simulated::{
    AcquisitionGate, AudioStats, DevicePolicy, DeviceStats, ElementHandle, PlayPolicy,
    SimulatedAudioBackend, SimulatedDevices, SimulatedElement,
};
pub use tracks::{MediaKind, MediaStream, MediaStreamTrack, PlatformTrack, StreamView, TrackView};
