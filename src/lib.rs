// SPDX-License-Identifier: GPL-3.0-only

//! Scanner Camera - camera capture core for a document scanner
//!
//! This library opens a camera, streams YUV 4:2:0 preview frames converted to
//! RGBA to a frame listener and a display surface, and takes full-resolution
//! JPEG stills through an autofocus and auto-exposure locking sequence.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Lifecycle control, frame listener and preview delivery
//! - [`backends`]: Camera backend abstraction, session worker and the
//!   virtual camera
//! - [`pipelines`]: Still capture sequencing and photo output
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo file naming and locations
//!
//! # Example
//!
//! ```no_run
//! use scanner_camera::app::{PassThrough, ViewLifecycleController, frame_channel};
//! use scanner_camera::backends::camera::{CameraManager, FrameSize};
//! use scanner_camera::backends::camera::session::{SessionOutputs, SessionSettings};
//! use scanner_camera::backends::virtual_camera::{VirtualCameraConfig, virtual_camera};
//! use std::sync::Arc;
//!
//! let (camera, control) = virtual_camera(VirtualCameraConfig::default());
//! let (surface, _frames) = frame_channel();
//! let outputs = SessionOutputs {
//!     listener: Arc::new(PassThrough),
//!     surface: Arc::new(surface),
//! };
//! let controller = ViewLifecycleController::new(CameraManager::new(
//!     camera,
//!     SessionSettings::default(),
//!     outputs,
//! ));
//!
//! controller.set_enabled(true);
//! controller.set_permission();
//! controller.surface_changed(FrameSize::new(1080, 1920));
//! control.push_frame((128, 128, 128));
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{FrameListener, ViewLifecycleController};
pub use backends::camera::{CameraBackend, CameraManager};
pub use config::Config;
pub use errors::{AppError, AppResult};
