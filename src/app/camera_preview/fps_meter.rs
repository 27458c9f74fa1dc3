// SPDX-License-Identifier: GPL-3.0-only

//! Preview frame rate measurement

use crate::backends::camera::types::FrameSize;
use crate::constants::FPS_METER_STEP;
use std::time::Instant;
use tracing::info;

/// Counts presented frames and reports the rate every [`FPS_METER_STEP`] frames
#[derive(Debug)]
pub struct FpsMeter {
    frames: u64,
    window_start: Option<Instant>,
    resolution: FrameSize,
    last_fps: Option<f64>,
}

impl FpsMeter {
    pub fn new(resolution: FrameSize) -> Self {
        Self {
            frames: 0,
            window_start: None,
            resolution,
            last_fps: None,
        }
    }

    pub fn set_resolution(&mut self, resolution: FrameSize) {
        self.resolution = resolution;
    }

    /// Record one frame at `now`; returns the new rate when a window closes
    pub fn measure_at(&mut self, now: Instant) -> Option<f64> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames += 1;
        if self.frames % FPS_METER_STEP != 0 {
            return None;
        }

        let elapsed = now.duration_since(start).as_secs_f64();
        self.window_start = Some(now);
        if elapsed <= 0.0 {
            return None;
        }

        let fps = FPS_METER_STEP as f64 / elapsed;
        self.last_fps = Some(fps);
        info!(
            fps = %format!("{fps:.2}"),
            resolution = %self.resolution,
            "Preview frame rate"
        );
        Some(fps)
    }

    pub fn measure(&mut self) -> Option<f64> {
        self.measure_at(Instant::now())
    }

    /// Most recent rate, formatted like `29.97 FPS@640x480`
    pub fn summary(&self) -> Option<String> {
        self.last_fps
            .map(|fps| format!("{fps:.2} FPS@{}", self.resolution))
    }
}
