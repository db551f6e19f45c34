use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Height in pixels (rows when rendered in a terminal).
pub type Pixels = u32;

/// Estimated height of an unmeasured entry.
pub const DEFAULT_ESTIMATE_HEIGHT: Pixels = 80;

/// Rows' worth of estimated height added below the viewport.
pub const DEFAULT_BUFFER_ROWS: u32 = 10;

/// Extra entries materialised on each side of the window.
pub const DEFAULT_OVERSCAN: usize = 5;

/// Tolerance for deciding the list is scrolled to the bottom.
pub const DEFAULT_AT_BOTTOM_EPSILON: Pixels = 50;

/// Scroll offset below which older history is requested.
pub const DEFAULT_PAGINATION_THRESHOLD: Pixels = 100;

pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct TidelineConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,

    #[serde(default)]
    pub gestures: GestureThresholds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ViewportConfig {
    pub estimate_height: Pixels,
    pub buffer_rows: u32,
    pub overscan: usize,
    pub at_bottom_epsilon: Pixels,
    pub pagination_threshold: Pixels,
    pub history_page_size: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            estimate_height: DEFAULT_ESTIMATE_HEIGHT,
            buffer_rows: DEFAULT_BUFFER_ROWS,
            overscan: DEFAULT_OVERSCAN,
            at_bottom_epsilon: DEFAULT_AT_BOTTOM_EPSILON,
            pagination_threshold: DEFAULT_PAGINATION_THRESHOLD,
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
        }
    }
}

impl ViewportConfig {
    /// Row-based preset where one pixel unit is one terminal row.
    pub fn terminal() -> Self {
        Self {
            estimate_height: 3,
            buffer_rows: 10,
            overscan: 5,
            at_bottom_epsilon: 2,
            pagination_threshold: 4,
            history_page_size: 40,
        }
    }
}

/// Tunable limits for touch gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GestureThresholds {
    /// Horizontal travel a swipe must exceed.
    pub swipe_min_dx: f64,
    /// Vertical drift a swipe must stay under.
    pub swipe_max_dy: f64,
    /// Hold duration after which a touch is a long-press.
    pub long_press_ms: u64,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            swipe_min_dx: 50.0,
            swipe_max_dy: 100.0,
            long_press_ms: 500,
        }
    }
}

impl TidelineConfig {
    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("tideline").join("config.toml"))
    }

    /// Load configuration from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`. A missing file yields defaults; a file
    /// that fails to parse is reported as an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Self::load_from`] but falls back to defaults on parse errors.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Failed to load config file at {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Self::default()
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.viewport.estimate_height == 0 {
            return Err(Error::Configuration(
                "viewport.estimate-height must be greater than zero".to_string(),
            ));
        }
        if self.gestures.swipe_min_dx < 0.0 || self.gestures.swipe_max_dy < 0.0 {
            return Err(Error::Configuration(
                "gesture distances must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TidelineConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TidelineConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[viewport]\noverscan = 2\n\n[gestures]\nlong-press-ms = 650\n",
        )
        .unwrap();

        let config = TidelineConfig::load_from(&path).unwrap();
        assert_eq!(config.viewport.overscan, 2);
        assert_eq!(config.viewport.estimate_height, DEFAULT_ESTIMATE_HEIGHT);
        assert_eq!(config.gestures.long_press_ms, 650);
        assert!((config.gestures.swipe_min_dx - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = TidelineConfig::default();
        config.viewport = ViewportConfig::terminal();

        config.save_to(&path).unwrap();
        let loaded = TidelineConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn zero_estimate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[viewport]\nestimate-height = 0\n").unwrap();

        let err = TidelineConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(
            TidelineConfig::load_or_default(&path),
            TidelineConfig::default()
        );
    }
}
