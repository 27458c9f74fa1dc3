// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner camera

use crate::backends::camera::types::BackendError;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Camera backend errors
    #[error("Camera error: {0}")]
    Camera(#[from] BackendError),
    /// Photo capture errors
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Background executor could not be started or went away
    #[error("Executor error: {0}")]
    Executor(String),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Photo capture errors
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    /// Still image was not available when the hardware said it was
    #[error("No still image available")]
    NoImageAvailable,
    /// Still image did not carry JPEG data
    #[error("Still image is not a JPEG ({0})")]
    NotJpeg(String),
    /// A still capture was delivered with no request waiting for it
    #[error("No capture request pending")]
    NoPendingRequest,
    /// RGBA buffer length does not match the frame size
    #[error("Frame buffer of {len} bytes does not hold {width}x{height} RGBA pixels")]
    FrameSizeMismatch { width: u32, height: u32, len: usize },
    /// Writing the JPEG failed
    #[error("Failed to save {path}: {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration load/save errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration directory on this system")]
    NoConfigDir,
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
