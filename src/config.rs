//! Configuration file handling.
//!
//! Loads configuration from `~/.config/framegrab/config.toml` or a
//! custom path.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::grabber::{PixelFormat, Resolution};

/// Configuration file structure.
/// Loaded from ~/.config/framegrab/config.toml (or a custom path via --config).
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct DeviceConfig {
    /// Positional device index; ignored when `unique_id` is set.
    #[serde(default)]
    pub index: usize,
    /// Stable device ID, preferred over the index when present.
    #[serde(default)]
    pub unique_id: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CaptureConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_format")]
    pub format: PixelFormat,
    #[serde(default = "default_true")]
    pub mirror: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            format: default_format(),
            mirror: default_true(),
        }
    }
}

fn default_width() -> u32 {
    Resolution::MEDIUM.width
}

fn default_height() -> u32 {
    Resolution::MEDIUM.height
}

fn default_fps() -> u32 {
    30
}

fn default_format() -> PixelFormat {
    PixelFormat::Rgb
}

fn default_true() -> bool {
    true
}

/// Contents written by `config init`.
pub const DEFAULT_CONFIG: &str = "\
# framegrab configuration

[device]
# Positional device index; unstable across hot-plug.
index = 0
# Stable device ID, preferred over the index when set.
# unique_id = \"...\"

[capture]
width = 640
height = 480
fps = 30
# One of: rgb, rgba, yuyv, nv12
format = \"rgb\"
# Mirror horizontally (selfie mode)
mirror = true
";

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Write [`DEFAULT_CONFIG`] to `path`, creating parent directories.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, DEFAULT_CONFIG).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("framegrab/config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/framegrab/config.toml")
        })
}
