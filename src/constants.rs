// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Application identifier, used for the config and photo directories
pub const APP_ID: &str = "scanner-camera";

/// Name of the thread that runs session callbacks and conversions
pub const EXECUTOR_THREAD_NAME: &str = "camera-background";

/// Images the preview stream may hold before the oldest is dropped
pub const PREVIEW_MAX_IMAGES: usize = 2;

/// Images the still stream may hold
pub const STILL_MAX_IMAGES: usize = 1;

/// Frames per frame-rate report
pub const FPS_METER_STEP: u64 = 20;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Folder under the pictures directory that receives photos
pub const DEFAULT_SAVE_FOLDER: &str = "Scans";

/// JPEG quality of stills produced by the virtual camera
pub const JPEG_QUALITY: u8 = 90;

/// Preview surface used by the command line when none is given
pub mod cli_defaults {
    pub const SURFACE_WIDTH: u32 = 1080;
    pub const SURFACE_HEIGHT: u32 = 1920;
    pub const PREVIEW_FRAMES: u32 = 60;
}

/// Timing of the virtual camera
pub mod virtual_timing {
    use std::time::Duration;

    /// Interval between synthetic preview frames
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// How long a command-line capture waits for its photo
    pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
}
