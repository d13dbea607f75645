//! # Watchroom Diagnostics
//!
//! Logging setup and session snapshots for debugging Watchroom sessions.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod session_report;

// Re-export main types
pub use debug_logger::{DebugLogger, DEFAULT_DIRECTIVE};
pub use session_report::{CaptureSummary, ParticipantSummary, PlaybackSummary, SessionReport};
