// SPDX-License-Identifier: GPL-3.0-only

//! Application layer
//!
//! Everything between the camera session and whoever shows its output:
//!
//! - [`state`]: starts and stops capture from the view's lifecycle inputs
//! - [`frame_processor`]: the listener that sees every converted frame and
//!   every capture outcome
//! - [`camera_preview`]: preview delivery, display transform and frame rate

pub mod camera_preview;
pub mod frame_processor;
pub mod state;

pub use camera_preview::{ChannelSurface, FrameReceiver, PreviewSurface, frame_channel};
pub use frame_processor::{FrameListener, PassThrough};
pub use state::{CaptureHost, RunState, ViewLifecycleController, ViewRunState};
