// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for photo files

use crate::constants::DEFAULT_SAVE_FOLDER;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default photo directory: the pictures folder, else home, else the working directory
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}

/// File name for a photo taken at `at`
pub fn photo_file_name(at: DateTime<Local>) -> String {
    format!("scan_{}.jpg", at.format("%Y%m%d_%H%M%S"))
}

/// Create `dir` if needed and return a fresh timestamped photo path in it
///
/// A numeric suffix is added when a photo with the same second already exists.
pub fn timestamped_photo_path(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let name = photo_file_name(Local::now());
    let mut path = dir.join(&name);
    let stem = name.trim_end_matches(".jpg").to_string();
    let mut suffix = 1;
    while path.exists() {
        path = dir.join(format!("{stem}_{suffix}.jpg"));
        suffix += 1;
    }

    debug!(path = %path.display(), "Photo path chosen");
    Ok(path)
}
