// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application configuration.
//!
//! Stored as RON. Every field has a default, so a config file only needs
//! the settings it changes.

use cutline_render::CompositorConfig;
use cutline_timeline::{TimelineError, TimelineView};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors reading or writing a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed RON
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Serialization failure
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    /// A setting is out of range
    #[error("Invalid config: {0}")]
    Invalid(#[from] TimelineError),
}

/// Cutline settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Compositor tunables
    pub compositor: CompositorConfig,
    /// Timeline viewport geometry
    pub view: TimelineView,
    /// Export settings
    pub export: ExportSettings,
}

/// Export output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// File name prefix of exported frames
    pub frame_prefix: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            frame_prefix: "frame".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a config from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.view.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save a config file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(AppConfig::from_ron("()").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::from_ron(
            "(compositor: (seek_tolerance: 0.1), view: (pixels_per_second: 50.0))",
        )
        .unwrap();
        assert_eq!(config.compositor.seek_tolerance, 0.1);
        assert_eq!(config.compositor.adjustment_alpha, 0.5);
        assert_eq!(config.view.pixels_per_second, 50.0);
        assert_eq!(config.export.frame_prefix, "frame");
    }

    #[test]
    fn test_save_load() {
        let dir = std::env::temp_dir().join(format!("cutline_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cutline.ron");

        let mut config = AppConfig::default();
        config.export.frame_prefix = "shot".to_string();
        config.compositor.seek_tolerance = 0.05;
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_degenerate_view_rejected() {
        for text in [
            "(view: (pixels_per_second: 0.0))",
            "(view: (pixels_per_second: -5.0))",
            "(view: (track_height: 0.0))",
        ] {
            assert!(
                matches!(AppConfig::from_ron(text), Err(ConfigError::Invalid(TimelineError::Validation { .. }))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_bad_config_reports_parse_error() {
        assert!(matches!(AppConfig::from_ron("(compositor: 3)"), Err(ConfigError::Parse(_))));
    }
}
