//! # Watchroom - Media session controller for a shared video room
//!
//! A participant joins with a display name, turns on camera and microphone and
//! watches a shared video together with a local self-view. This crate is the
//! controller behind that room view: it gates entry by time of day, keeps the
//! roster, owns the local capture stream, drives the main video element and
//! releases every piece of hardware again when the view goes away.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use watchroom::{Platform, RoomBuilder};
//! use watchroom_core::SystemClock;
//! use watchroom_media::{SimulatedAudioBackend, SimulatedDevices, SimulatedElement};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (element, _handle) = SimulatedElement::new();
//!     let platform = Platform::new(
//!         Arc::new(SimulatedDevices::new()),
//!         Box::new(element),
//!         Arc::new(SimulatedAudioBackend::new()),
//!         Arc::new(SystemClock),
//!     );
//!
//!     let mut session = RoomBuilder::new().display_name("Ada").mount(platform)?;
//!     let mut events = session.events();
//!     session.settle().await;
//!
//!     session.toggle_camera();
//!     session.set_volume(70);
//!     session.exit();
//!
//!     for event in events.drain() {
//!         println!("Room event: {:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use watchroom_core::{
    Clock, FixedClock, GateDecision, OperatingHours, ResourceKind, ResourceUsage, RoomError,
    SessionGate, SystemClock,
};

pub use watchroom_media::{
    CaptureConfig, LocalPreview, MediaError, MediaKind, PlaybackConfig, PlaybackState,
    LOAD_ERROR_MESSAGE, PLAYBACK_ERROR_MESSAGE,
};

#[cfg(feature = "diagnostics")]
pub use watchroom_diagnostics::{DebugLogger, SessionReport};

// Public API modules
pub mod config;
pub mod event;
pub mod participant;
pub mod room;

// Re-export main API types
pub use config::{GlobalConfig, RoomConfig, DEFAULT_DISPLAY_NAME};
pub use event::{Event, EventFilter, EventStream, ExitReason, FilteredEventStream};
pub use participant::{Participant, ParticipantRole, Participants, LOCAL_PARTICIPANT_ID};
pub use room::{Platform, RoomBuilder, RoomSession, SessionState, TeardownSummary};

/// Apply process-wide settings.
///
/// Installs the tracing subscriber when `debug_logging` is set. Returns
/// whether a subscriber was installed by this call.
#[cfg(feature = "diagnostics")]
pub fn init(config: &GlobalConfig) -> Result<bool, RoomError> {
    if !config.debug_logging {
        return Ok(false);
    }
    DebugLogger::init_logging(&config.log_directive)
}
