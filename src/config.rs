// SPDX-License-Identifier: GPL-3.0-only

//! Persistent settings
//!
//! Stored as JSON at `<config dir>/scanner-camera/config.json`. A missing
//! file means defaults; unknown or missing fields fall back to their defaults
//! so older files keep loading.

use crate::backends::camera::format_converters::ConversionMode;
use crate::backends::camera::session::SessionSettings;
use crate::backends::camera::types::{CameraFacing, CameraSelector, FrameSize};
use crate::constants::APP_ID;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera to open
    pub camera_facing: CameraFacing,
    /// Upper bound for the preview stream size
    pub max_preview_size: Option<FrameSize>,
    /// Colour or luma-only preview conversion
    pub conversion_mode: ConversionMode,
    /// Log the preview frame rate
    pub fps_meter: bool,
    /// Where photos are saved; the pictures folder when unset
    pub photo_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_facing: CameraFacing::Back,
            max_preview_size: None,
            conversion_mode: ConversionMode::Rgba,
            fps_meter: false,
            photo_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_ID).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, returning defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings a camera session runs with
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            selector: CameraSelector::facing(self.camera_facing),
            max_preview_size: self.max_preview_size,
            conversion_mode: self.conversion_mode,
            fps_meter: self.fps_meter,
        }
    }

    /// Folder photos are saved to
    pub fn photo_dir(&self) -> PathBuf {
        self.photo_dir
            .clone()
            .unwrap_or_else(crate::storage::default_photo_dir)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_error)?;

        info!(path = %path.display(), "Config saved");
        Ok(())
    }
}
