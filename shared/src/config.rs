use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overlay tuning stored in JSON.
///
/// Every field has a serde default so older or partial files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Offset from the hover position to the overlay's top-left, so the
    /// cursor does not cover the text
    #[serde(default = "default_cursor_offset")]
    pub cursor_offset_x: i32,
    #[serde(default = "default_cursor_offset")]
    pub cursor_offset_y: i32,
    /// Anchor moves within this Manhattan distance do not reposition
    #[serde(default = "default_reposition_tolerance")]
    pub reposition_tolerance: i32,
    /// Slack around the overlay before the pointer counts as gone
    #[serde(default = "default_proximity_margin")]
    pub proximity_margin: i32,
    /// Radius of the vicinity around a bare anchor point
    #[serde(default = "default_anchor_radius")]
    pub anchor_radius: i32,
    #[serde(default = "default_proximity_interval_ms")]
    pub proximity_interval_ms: u64,
    #[serde(default = "default_max_text_width")]
    pub max_text_width: i32,
    #[serde(default = "default_text_padding")]
    pub text_padding: i32,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_cursor_offset() -> i32 {
    16
}

fn default_reposition_tolerance() -> i32 {
    10
}

fn default_proximity_margin() -> i32 {
    10
}

fn default_anchor_radius() -> i32 {
    8
}

fn default_proximity_interval_ms() -> u64 {
    250
}

fn default_max_text_width() -> i32 {
    360
}

fn default_text_padding() -> i32 {
    6
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            cursor_offset_x: default_cursor_offset(),
            cursor_offset_y: default_cursor_offset(),
            reposition_tolerance: default_reposition_tolerance(),
            proximity_margin: default_proximity_margin(),
            anchor_radius: default_anchor_radius(),
            proximity_interval_ms: default_proximity_interval_ms(),
            max_text_width: default_max_text_width(),
            text_padding: default_text_padding(),
            debug_logging: false,
        }
    }
}

impl OverlayConfig {
    pub fn proximity_interval(&self) -> Duration {
        // A zero interval would spin the timer
        Duration::from_millis(self.proximity_interval_ms.max(1))
    }
}

pub fn config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("ClickTip").join("config.json")
}

pub fn read_config(path: &Path) -> Result<OverlayConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_config(path: &Path, config: &OverlayConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config(config: &OverlayConfig) -> Result<(), ConfigError> {
    write_config(&config_path(), config)
}
