//! # Watchroom Core
//!
//! Session-level building blocks shared by every Watchroom crate: the error
//! type, the operating-hours gate and resource bookkeeping.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod gate;
pub mod resource;

// Re-export main types
pub use error::RoomError;
pub use gate::{Clock, FixedClock, GateDecision, OperatingHours, SessionGate, SystemClock};
pub use resource::{ResourceId, ResourceKind, ResourceRecord, ResourceTracker, ResourceUsage};
