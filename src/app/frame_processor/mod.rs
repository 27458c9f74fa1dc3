// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing collaborator
//!
//! The session worker hands every converted preview frame to a
//! [`FrameListener`] before it is displayed, and reports still capture
//! outcomes to the same listener. All callbacks run on the session worker
//! thread, so they should return quickly.

use crate::backends::camera::types::{BackendError, ConvertedFrame};
use std::path::Path;
use tracing::{info, warn};

/// Receives converted frames and capture outcomes
pub trait FrameListener: Send + Sync {
    /// Process a frame; the returned frame is what gets displayed
    fn on_frame_ready(&self, frame: ConvertedFrame) -> ConvertedFrame {
        frame
    }

    /// A still capture was written to `path`
    fn on_still_capture_complete(&self, path: &Path) {
        info!(path = %path.display(), "Still capture complete");
    }

    /// A still capture aimed at `path` did not produce a file
    fn on_still_capture_failed(&self, path: &Path, reason: &str) {
        warn!(path = %path.display(), reason, "Still capture failed");
    }

    /// The camera could not be opened or went away
    fn on_camera_error(&self, error: &BackendError) {
        warn!(%error, "Camera error");
    }
}

/// Displays frames unchanged and only logs capture outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl FrameListener for PassThrough {}
