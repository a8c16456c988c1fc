//! Configuration types and defaults

use crate::error::SessionResult;
use crate::state::Orientation;
use camsession_core::CoreError;
use camsession_media::CameraDirection;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Enable debug logging
    pub debug_logging: bool,
    /// Filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_filter: "info".to_string(),
        }
    }
}

/// Per-session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Camera opened by `initialize_video` and by reinitialization when no
    /// direction was active
    pub default_direction: CameraDirection,
    /// Device orientation assumed until the first sensor update
    pub initial_orientation: Orientation,
    /// Name of the thread that owns every hardware call
    pub affinity_thread_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_direction: CameraDirection::Front,
            initial_orientation: Orientation::Portrait,
            affinity_thread_name: "camsession-main".to_string(),
        }
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamSessionConfig {
    /// Process-wide settings
    pub global: GlobalConfig,
    /// Per-session settings
    pub session: SessionConfig,
}

impl CamSessionConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> SessionResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let json = std::fs::read_to_string(path).map_err(CoreError::from)?;
        Self::from_json_str(&json)
    }

    /// Reject values a session cannot start with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.session.affinity_thread_name.trim().is_empty() {
            return Err(CoreError::InvalidConfiguration {
                field: "session.affinity_thread_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !self.session.default_direction.is_usable() {
            return Err(CoreError::InvalidConfiguration {
                field: "session.default_direction".to_string(),
                reason: format!(
                    "{:?} is not a camera that can be opened",
                    self.session.default_direction
                ),
            });
        }
        if self.global.log_filter.trim().is_empty() {
            return Err(CoreError::InvalidConfiguration {
                field: "global.log_filter".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;

    #[test]
    fn test_defaults_are_valid() {
        let config = CamSessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.default_direction, CameraDirection::Front);
        assert_eq!(config.session.affinity_thread_name, "camsession-main");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config = CamSessionConfig::from_json_str(
            r#"{ "session": { "default_direction": "back", "initial_orientation": "landscape_left" } }"#,
        )
        .unwrap();

        assert_eq!(config.session.default_direction, CameraDirection::Back);
        assert_eq!(config.session.initial_orientation, Orientation::LandscapeLeft);
        assert_eq!(config.global, GlobalConfig::default());
    }

    #[test]
    fn test_rejects_unusable_direction() {
        let err = CamSessionConfig::from_json_str(r#"{ "session": { "default_direction": "pending" } }"#)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIGURATION");
    }

    #[test]
    fn test_rejects_empty_thread_name() {
        let mut config = CamSessionConfig::default();
        config.session.affinity_thread_name = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = CamSessionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CamSessionConfig::from_json_file("/nonexistent/camsession.json").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
