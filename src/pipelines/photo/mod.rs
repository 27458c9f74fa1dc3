// SPDX-License-Identifier: GPL-3.0-only

//! Still photo pipeline
//!
//! ```text
//! take_picture ─▶ focus lock ─▶ precapture ─▶ still ─▶ JPEG on disk
//!                                                 │
//!                                   preview resumes ◀┘
//! ```
//!
//! [`capture`] holds the sequencing state machine; [`encoding`] writes the
//! resulting bytes.

pub mod capture;
pub mod encoding;

pub use capture::{
    CameraState, CaptureAction, CaptureStateMachine, ScreenRotation, StillCaptureRequest,
    Transition, compute_orientation,
};
pub use encoding::{save_frame_png, save_jpeg};
