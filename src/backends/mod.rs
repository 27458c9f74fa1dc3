// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        Lifecycle controller / CLI            │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │  CameraManager ──▶ SessionWorker (thread)    │
//! │                        │                     │
//! │                 dyn CameraBackend            │
//! │                        │                     │
//! │                 ┌──────┴───────┐             │
//! │                 │ VirtualCamera│             │
//! │                 └──────────────┘             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Backend trait, session worker, conversion and sizing
//! - [`virtual_camera`]: Scriptable software camera

pub mod camera;
pub mod virtual_camera;
