//! Structured debug logging system

use tracing_subscriber::{fmt, EnvFilter};
use watchroom_core::RoomError;

/// Directive used when neither `RUST_LOG` nor the caller supplies one
pub const DEFAULT_DIRECTIVE: &str = "watchroom=info";

/// Debug logger for structured logging
#[derive(Debug, Clone)]
pub struct DebugLogger {
    directive: String,
    with_targets: bool,
}

impl DebugLogger {
    /// Create a logger falling back to `directive` when `RUST_LOG` is unset
    pub fn new(directive: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            with_targets: false,
        }
    }

    /// Print the module target next to each line
    pub fn with_targets(mut self) -> Self {
        self.with_targets = true;
        self
    }

    /// Fallback directive
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Build the filter: `RUST_LOG` wins, the fallback directive otherwise
    pub fn filter(&self) -> Result<EnvFilter, RoomError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.directive).map_err(|e| {
                RoomError::InvalidConfiguration {
                    field: "log_directive".to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Install the global subscriber.
    ///
    /// Returns `Ok(false)` when a subscriber was already installed, which is
    /// the normal case for a second session in the same process.
    pub fn install(&self) -> Result<bool, RoomError> {
        let filter = self.filter()?;
        let installed = fmt()
            .with_env_filter(filter)
            .with_target(self.with_targets)
            .try_init()
            .is_ok();
        Ok(installed)
    }

    /// Initialize logging with `directive` as fallback
    pub fn init_logging(directive: &str) -> Result<bool, RoomError> {
        Self::new(directive).install()
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let logger = DebugLogger::default();
        assert_eq!(logger.directive(), DEFAULT_DIRECTIVE);
    }

    #[test]
    fn test_second_install_is_not_an_error() {
        let logger = DebugLogger::new("watchroom=debug");
        let _ = logger.install().unwrap();
        assert!(!logger.install().unwrap());
    }
}
