// SPDX-License-Identifier: GPL-3.0-only

//! Camera preview presentation
//!
//! Converted frames leave the session worker through a [`PreviewSurface`].
//! The channel-backed surface keeps only the newest undelivered frame, so a
//! slow display never backs up the worker. Drawing is done by whoever reads
//! the channel, through the transform kept by [`PreviewSurfaceRenderer`].

pub mod fps_meter;
pub mod transform;

pub use fps_meter::FpsMeter;
pub use transform::{
    DisplayMetrics, PreviewSurfaceRenderer, Rect, Transform2D, compute_transform,
    destination_rect, fit_scale,
};

use crate::backends::camera::types::ConvertedFrame;
use std::sync::Arc;
use tokio::sync::watch;

/// Where the session worker delivers frames for display
pub trait PreviewSurface: Send + Sync {
    fn present(&self, frame: ConvertedFrame);
}

/// Discards every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl PreviewSurface for NullSurface {
    fn present(&self, _frame: ConvertedFrame) {}
}

/// Create a latest-wins frame channel
pub fn frame_channel() -> (ChannelSurface, FrameReceiver) {
    let (sender, receiver) = watch::channel(None);
    (ChannelSurface { sender }, FrameReceiver { receiver })
}

/// Sending half of [`frame_channel`]
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    sender: watch::Sender<Option<Arc<ConvertedFrame>>>,
}

impl PreviewSurface for ChannelSurface {
    fn present(&self, frame: ConvertedFrame) {
        // Replaces whatever the display has not picked up yet
        self.sender.send_replace(Some(Arc::new(frame)));
    }
}

/// Receiving half of [`frame_channel`]
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    receiver: watch::Receiver<Option<Arc<ConvertedFrame>>>,
}

impl FrameReceiver {
    /// Wait for a frame newer than the last one seen
    ///
    /// Returns `None` once the sending side is gone.
    pub async fn next_frame(&mut self) -> Option<Arc<ConvertedFrame>> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(frame) = self.receiver.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }

    /// The newest frame, if one arrived since the last call
    pub fn try_latest(&mut self) -> Option<Arc<ConvertedFrame>> {
        if !self.receiver.has_changed().unwrap_or(false) {
            return None;
        }
        self.receiver.borrow_and_update().clone()
    }
}
