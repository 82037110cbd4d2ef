use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find config directory")]
    NoConfigDir,
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Styling options applied while a shape is being drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonOptions {
    /// Snap a new vertex onto the ring's first vertex to close it.
    pub snappable: bool,
    /// Guide-line color while drawing ("red", "#ff0000", ...).
    pub templine_color: String,
}

impl Default for PolygonOptions {
    fn default() -> Self {
        Self {
            snappable: true,
            templine_color: "red".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Placement of the key-hint bar ("topleft", "topright", ...).
    pub position: String,

    // Which draw modes are advertised in the UI. Drawing can be started
    // for any kind regardless; these only gate the hints.
    pub draw_polygon: bool,
    pub draw_rectangle: bool,
    pub draw_marker: bool,
    pub draw_circle: bool,
    pub draw_circle_marker: bool,
    pub draw_polyline: bool,

    pub edit_mode: bool,
    pub drag_mode: bool,
    pub cut_polygon: bool,
    pub removal_mode: bool,

    /// Display language code for prompts and unit names ("en", "zh").
    pub language: String,

    pub polygon_options: PolygonOptions,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            position: "topleft".to_string(),
            draw_polygon: false,
            draw_rectangle: false,
            draw_marker: false,
            draw_circle: false,
            draw_circle_marker: false,
            draw_polyline: false,
            edit_mode: true,
            drag_mode: false,
            cut_polygon: false,
            removal_mode: false,
            language: "en".to_string(),
            polygon_options: PolygonOptions::default(),
        }
    }
}

impl MeasureConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("menseki");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Self::default(),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            return Self::default();
        }

        let config = Self::default();
        if let Err(e) = config.save() {
            tracing::debug!("Could not write default config: {}", e);
        }
        config
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// True if any per-kind draw hint is enabled.
    pub fn any_draw_hint(&self) -> bool {
        self.draw_polygon
            || self.draw_rectangle
            || self.draw_circle
            || self.draw_polyline
            || self.draw_marker
            || self.draw_circle_marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = MeasureConfig {
            draw_polygon: true,
            draw_rectangle: true,
            language: "zh".to_string(),
            polygon_options: PolygonOptions {
                snappable: false,
                templine_color: "#00ff00".to_string(),
            },
            ..Default::default()
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: MeasureConfig = toml::from_str(&serialized).unwrap();

        assert!(deserialized.draw_polygon);
        assert!(deserialized.draw_rectangle);
        assert_eq!(deserialized.language, "zh");
        assert!(!deserialized.polygon_options.snappable);
        assert_eq!(deserialized.polygon_options.templine_color, "#00ff00");
    }

    #[test]
    fn test_defaults_match_plugin_defaults() {
        let config = MeasureConfig::default();
        assert_eq!(config.position, "topleft");
        assert!(config.edit_mode);
        assert!(!config.drag_mode);
        assert!(!config.cut_polygon);
        assert!(!config.removal_mode);
        assert!(!config.any_draw_hint());
        assert!(config.polygon_options.snappable);
        assert_eq!(config.polygon_options.templine_color, "red");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: MeasureConfig = toml::from_str("language = \"zh\"").unwrap();
        assert_eq!(config.language, "zh");
        assert!(config.edit_mode);
        assert!(config.polygon_options.snappable);
    }
}
