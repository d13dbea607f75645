//! Operating-hours gate for room entry
//!
//! The gate holds no state of its own: every decision is a pure function of
//! the configured [`OperatingHours`] and the local wall-clock hour reported by
//! a [`Clock`].

use crate::error::RoomError;
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of local wall-clock time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current local date and time
    fn local_now(&self) -> NaiveDateTime;

    /// Current local hour (0-23)
    fn current_hour(&self) -> u32 {
        self.local_now().hour()
    }
}

/// Clock backed by the host's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    /// Freeze the clock at an arbitrary local instant
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Freeze the clock at the top of `hour` on a fixed reference day
    pub fn at_hour(hour: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|day| day.and_hms_opt(hour % 24, 0, 0))
            .unwrap_or_default();
        Self { now }
    }
}

impl Clock for FixedClock {
    fn local_now(&self) -> NaiveDateTime {
        self.now
    }
}

/// Half-open range of local hours `[open_hour, close_hour)` during which the
/// room accepts participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    /// First hour the room is open
    pub open_hour: u32,
    /// First hour the room is closed again
    pub close_hour: u32,
}

impl OperatingHours {
    /// Create a new operating window
    pub fn new(open_hour: u32, close_hour: u32) -> Result<Self, RoomError> {
        let hours = Self {
            open_hour,
            close_hour,
        };
        hours.validate()?;
        Ok(hours)
    }

    /// Check the window is a non-empty range inside a single day
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.close_hour > 24 {
            return Err(RoomError::InvalidConfiguration {
                field: "operating_hours.close_hour".to_string(),
                reason: format!("{} is past the end of the day", self.close_hour),
            });
        }
        if self.open_hour >= self.close_hour {
            return Err(RoomError::InvalidConfiguration {
                field: "operating_hours".to_string(),
                reason: format!(
                    "open hour {} must be before close hour {}",
                    self.open_hour, self.close_hour
                ),
            });
        }
        Ok(())
    }

    /// Whether `hour` falls inside the window
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.open_hour && hour < self.close_hour
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            open_hour: 7,
            close_hour: 21,
        }
    }
}

/// Outcome of a single gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateDecision {
    /// The room may be entered
    Open {
        /// Local hour at evaluation time
        hour: u32,
    },
    /// The room is closed; the caller must navigate away
    Closed {
        /// Local hour at evaluation time
        hour: u32,
    },
}

impl GateDecision {
    /// Whether entry is permitted
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open { .. })
    }

    /// Hour the decision was made at
    pub fn hour(&self) -> u32 {
        match self {
            GateDecision::Open { hour } | GateDecision::Closed { hour } => *hour,
        }
    }
}

/// Operating-hours gate
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionGate {
    hours: OperatingHours,
}

impl SessionGate {
    /// Create a gate for the given window
    pub fn new(hours: OperatingHours) -> Self {
        Self { hours }
    }

    /// Configured window
    pub fn hours(&self) -> OperatingHours {
        self.hours
    }

    /// Decide whether the room is open right now
    pub fn evaluate(&self, clock: &dyn Clock) -> GateDecision {
        let hour = clock.current_hour();
        if self.hours.contains(hour) {
            GateDecision::Open { hour }
        } else {
            GateDecision::Closed { hour }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_boundaries() {
        let gate = SessionGate::default();

        for hour in 0..24 {
            let decision = gate.evaluate(&FixedClock::at_hour(hour));
            assert_eq!(decision.is_open(), (7..21).contains(&hour), "hour {}", hour);
            assert_eq!(decision.hour(), hour);
        }
    }

    #[test]
    fn test_custom_window_decisions() {
        let gate = SessionGate::new(OperatingHours::new(9, 17).unwrap());
        assert_eq!(
            gate.evaluate(&FixedClock::at_hour(17)),
            GateDecision::Closed { hour: 17 }
        );
        assert_eq!(
            gate.evaluate(&FixedClock::at_hour(9)),
            GateDecision::Open { hour: 9 }
        );
    }

    #[test]
    fn test_operating_hours_validation() {
        assert!(OperatingHours::new(7, 21).is_ok());
        assert!(OperatingHours::new(0, 24).is_ok());
        assert!(OperatingHours::new(21, 7).is_err());
        assert!(OperatingHours::new(9, 9).is_err());
        assert!(OperatingHours::new(9, 25).is_err());
    }

    #[test]
    fn test_system_clock_hour_in_range() {
        assert!(SystemClock.current_hour() < 24);
    }
}
