//! Application-level settings that shape window behaviour.
//!
//! Stored as YAML in `~/.config/casement/config.yaml` (XDG config dir on
//! Linux, the platform equivalent elsewhere). Every field has a default so a
//! partial file is always accepted.

use crate::error::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Window chrome and fullscreen behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Title applied to fresh windows
    pub title: String,
    /// Use the OS fullscreen mode; when false macOS uses simple fullscreen
    pub native_full_screen: bool,
    /// Re-enter fullscreen for windows saved in fullscreen
    pub restore_full_screen: bool,
    /// Draw a custom title bar (enables window-controls overlay and the
    /// custom system context menu where supported)
    pub custom_titlebar: bool,
    /// Zoom level applied when a window has no custom zoom
    pub zoom_level: Option<f64>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Casement".to_string(),
            native_full_screen: true,
            restore_full_screen: true,
            custom_titlebar: true,
            zoom_level: None,
        }
    }
}

/// Timers used by the lifecycle controller and fullscreen arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long to wait for the OS to confirm a fullscreen transition
    pub fullscreen_transition_ms: u64,
    /// Development builds force-show a window still hidden after this delay
    pub dev_show_fallback_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fullscreen_transition_ms: 10_000,
            dev_show_fallback_ms: 10_000,
        }
    }
}

/// Call-stack sampling while a window is unresponsive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: i64,
    pub period_ms: i64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            period_ms: 15_000,
        }
    }
}

/// Top-level shell configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub window: WindowSettings,
    pub timeouts: TimeoutConfig,
    pub sampling: SamplingConfig,
}

impl ShellConfig {
    /// Directory holding the config file.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("casement")
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Load configuration from the default location, creating it if missing.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        log::info!(
            "Config file not found, creating default at {:?}",
            config_path
        );
        let config = Self::default();
        if let Err(e) = config.save() {
            log::error!("Failed to save default config: {}", e);
            return Err(e);
        }
        Ok(config)
    }

    /// Load configuration from a specific file.
    ///
    /// A missing or empty file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
        if contents.trim().is_empty() {
            log::info!("Config file {:?} is empty, using defaults", path);
            return Ok(Self::default());
        }

        let config: ShellConfig = serde_yaml_ng::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::from)?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::from)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;

        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values that would disable the timers they configure.
    ///
    /// Sampling values are not checked here; the sampler falls back to its
    /// defaults on its own when they are unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeouts.fullscreen_transition_ms == 0 {
            return Err(ConfigError::Validation(
                "timeouts.fullscreen_transition_ms must be positive".to_string(),
            ));
        }
        if self.timeouts.dev_show_fallback_ms == 0 {
            return Err(ConfigError::Validation(
                "timeouts.dev_show_fallback_ms must be positive".to_string(),
            ));
        }
        if let Some(zoom) = self.window.zoom_level
            && !zoom.is_finite()
        {
            return Err(ConfigError::Validation(format!(
                "window.zoom_level must be finite, got {zoom}"
            )));
        }
        Ok(())
    }
}
