//! Configuration types and defaults

use serde::{Deserialize, Serialize};
use watchroom_core::{OperatingHours, RoomError};
use watchroom_media::{CaptureConfig, PlaybackConfig, MAX_VOLUME};

/// Display name used when the join screen supplies none
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Process-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Install a tracing subscriber on [`crate::init`]
    pub debug_logging: bool,
    /// Fallback filter directive when `RUST_LOG` is unset
    pub log_directive: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_directive: "watchroom=info".to_string(),
        }
    }
}

/// Room-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Name given to the local participant when none is supplied
    pub fallback_display_name: String,
    /// Hours during which the room can be entered
    pub operating_hours: OperatingHours,
    /// Main playback settings
    pub playback: PlaybackConfig,
    /// Local capture settings
    pub capture: CaptureConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            fallback_display_name: DEFAULT_DISPLAY_NAME.to_string(),
            operating_hours: OperatingHours::default(),
            playback: PlaybackConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl RoomConfig {
    /// Parse and validate a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, RoomError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RoomError::InvalidConfiguration {
                field: "room_config".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.fallback_display_name.trim().is_empty() {
            return Err(RoomError::InvalidConfiguration {
                field: "fallback_display_name".to_string(),
                reason: "must not be blank".to_string(),
            });
        }
        self.operating_hours.validate()?;

        let playback = &self.playback;
        if playback.source_url.trim().is_empty() {
            return Err(RoomError::MissingConfiguration {
                field: "playback.source_url".to_string(),
            });
        }
        if playback.initial_volume > MAX_VOLUME {
            return Err(RoomError::InvalidConfiguration {
                field: "playback.initial_volume".to_string(),
                reason: format!("{} exceeds {}", playback.initial_volume, MAX_VOLUME),
            });
        }
        if playback.volume_step == 0 || playback.volume_step > MAX_VOLUME {
            return Err(RoomError::InvalidConfiguration {
                field: "playback.volume_step".to_string(),
                reason: format!("must be within 1..={}", MAX_VOLUME),
            });
        }
        Ok(())
    }

    /// Name for the local participant: `supplied` when it has content, the
    /// fallback otherwise
    pub fn display_name(&self, supplied: Option<&str>) -> String {
        match supplied.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.fallback_display_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RoomConfig::default();
        assert_eq!(config.fallback_display_name, "Anonymous");
        assert_eq!(config.operating_hours, OperatingHours::new(7, 21).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = RoomConfig::from_json(
            r#"{
                "fallback_display_name": "Guest",
                "playback": { "initial_volume": 80 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.fallback_display_name, "Guest");
        assert_eq!(config.playback.initial_volume, 80);
        assert_eq!(config.playback.volume_step, 10);
        assert!(config.capture.per_kind_fallback);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = RoomConfig::from_json(r#"{ "playback": { "volume_step": 0 } }"#).unwrap_err();
        assert!(matches!(err, RoomError::InvalidConfiguration { ref field, .. } if field == "playback.volume_step"));

        let err = RoomConfig::from_json(r#"{ "playback": { "source_url": " " } }"#).unwrap_err();
        assert!(matches!(err, RoomError::MissingConfiguration { .. }));

        let err = RoomConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, RoomError::InvalidConfiguration { ref field, .. } if field == "room_config"));
    }

    #[test]
    fn test_display_name_fallback() {
        let config = RoomConfig::default();
        assert_eq!(config.display_name(Some("Ada")), "Ada");
        assert_eq!(config.display_name(Some("  Ada  ")), "Ada");
        assert_eq!(config.display_name(Some("   ")), "Anonymous");
        assert_eq!(config.display_name(None), "Anonymous");
    }
}
