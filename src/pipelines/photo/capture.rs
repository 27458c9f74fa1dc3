// SPDX-License-Identifier: GPL-3.0-only

//! Still capture sequencing
//!
//! A still capture is not a single request. The sensor is first asked to lock
//! focus, then (when exposure has not converged) to run a precapture metering
//! pass, and only then is the still request submitted. Each step waits on
//! asynchronous capture results.
//!
//! [`CaptureStateMachine`] decides; it never talks to hardware. The session
//! worker submits whatever [`CaptureAction`] a [`Transition`] names and
//! commits the transition only if that submission succeeded. A failed
//! submission halts the machine in place until the user asks again.

use crate::backends::camera::types::{AeState, AfState, CaptureResult};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Position in the still capture sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    /// Streaming preview, no capture in progress
    #[default]
    Preview,
    /// AF trigger sent, waiting for focus to lock
    WaitingLock,
    /// Precapture trigger sent, waiting for metering to start
    WaitingPrecapture,
    /// Waiting for precapture metering to finish
    WaitingNonPrecapture,
    /// Still request submitted, waiting for it to complete
    PictureTaken,
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preview => "preview",
            Self::WaitingLock => "waiting-lock",
            Self::WaitingPrecapture => "waiting-precapture",
            Self::WaitingNonPrecapture => "waiting-non-precapture",
            Self::PictureTaken => "picture-taken",
        };
        f.write_str(name)
    }
}

/// Display rotation at the moment a picture is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ScreenRotation {
    #[default]
    #[serde(rename = "0")]
    Rotation0,
    #[serde(rename = "90")]
    Rotation90,
    #[serde(rename = "180")]
    Rotation180,
    #[serde(rename = "270")]
    Rotation270,
}

impl ScreenRotation {
    pub const ALL: [ScreenRotation; 4] = [
        Self::Rotation0,
        Self::Rotation90,
        Self::Rotation180,
        Self::Rotation270,
    ];

    /// Parse a quarter turn given in degrees
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Self::Rotation0),
            90 => Some(Self::Rotation90),
            180 => Some(Self::Rotation180),
            270 => Some(Self::Rotation270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        self.index() as u32 * 90
    }

    fn index(self) -> usize {
        match self {
            Self::Rotation0 => 0,
            Self::Rotation90 => 1,
            Self::Rotation180 => 2,
            Self::Rotation270 => 3,
        }
    }
}

/// JPEG orientation base for each screen rotation, indexed by quarter turns
pub const DEVICE_ROTATION_TABLE: [u32; 4] = [90, 0, 270, 180];

/// JPEG orientation for a capture taken at `rotation` on a sensor mounted at
/// `sensor_orientation` degrees
///
/// Empirical correction for the sensor mounting offset, not a rotation
/// composition: `(table[rotation] + sensor + 270) mod 360`.
pub fn compute_orientation(rotation: ScreenRotation, sensor_orientation: u32) -> u32 {
    (DEVICE_ROTATION_TABLE[rotation.index()] + sensor_orientation % 360 + 270) % 360
}

/// A user's request to take a picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillCaptureRequest {
    /// Where the JPEG goes
    pub path: PathBuf,
    pub rotation: ScreenRotation,
}

impl StillCaptureRequest {
    pub fn new(path: impl Into<PathBuf>, rotation: ScreenRotation) -> Self {
        Self {
            path: path.into(),
            rotation,
        }
    }
}

/// Hardware work a transition requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    /// Nothing to submit
    None,
    /// Send AF trigger START on the preview request
    TriggerFocus,
    /// Send AE precapture trigger START on the preview request
    TriggerPrecapture,
    /// Stop preview, abort in-flight captures and submit the still request
    CaptureStill,
    /// Send AF trigger CANCEL and resume the repeating preview
    ResumePreview,
}

/// A decided, not yet committed, state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CameraState,
    pub next: CameraState,
    pub action: CaptureAction,
}

impl Transition {
    fn new(from: CameraState, next: CameraState, action: CaptureAction) -> Self {
        Self { from, next, action }
    }
}

/// The transition table for metering results
///
/// A missing AF or AE state never blocks progress; some sensors never report
/// them. Returns `None` when the result does not move the sequence.
pub fn next_transition(
    state: CameraState,
    af_state: Option<AfState>,
    ae_state: Option<AeState>,
) -> Option<Transition> {
    use CameraState::*;

    match state {
        WaitingLock => match af_state {
            None => Some(Transition::new(state, PictureTaken, CaptureAction::CaptureStill)),
            Some(af) if af.is_locked() => match ae_state {
                None | Some(AeState::Converged) => {
                    Some(Transition::new(state, PictureTaken, CaptureAction::CaptureStill))
                }
                Some(_) => Some(Transition::new(
                    state,
                    WaitingPrecapture,
                    CaptureAction::TriggerPrecapture,
                )),
            },
            Some(_) => None,
        },
        WaitingPrecapture => match ae_state {
            None | Some(AeState::Precapture) | Some(AeState::FlashRequired) => Some(
                Transition::new(state, WaitingNonPrecapture, CaptureAction::None),
            ),
            Some(_) => None,
        },
        WaitingNonPrecapture => match ae_state {
            Some(AeState::Precapture) => None,
            _ => Some(Transition::new(state, PictureTaken, CaptureAction::CaptureStill)),
        },
        Preview | PictureTaken => None,
    }
}

/// Still capture sequencer for one session
#[derive(Debug, Default)]
pub struct CaptureStateMachine {
    state: CameraState,
    halted: bool,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// True after a failed submission until the next capture request
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// User asked for a picture
    ///
    /// Accepted from preview, or from wherever a failed submission left the
    /// machine. A request while a sequence is already running is ignored.
    pub fn request_capture(&mut self) -> Option<Transition> {
        if self.state != CameraState::Preview && !self.halted {
            debug!(state = %self.state, "Capture already in progress, ignoring request");
            return None;
        }

        self.halted = false;
        Some(Transition::new(
            self.state,
            CameraState::WaitingLock,
            CaptureAction::TriggerFocus,
        ))
    }

    /// Feed a partial or completed capture result
    pub fn on_result(&self, result: &CaptureResult) -> Option<Transition> {
        if self.halted {
            return None;
        }

        if self.state == CameraState::PictureTaken {
            return result.is_still_completion().then(|| {
                Transition::new(
                    self.state,
                    CameraState::Preview,
                    CaptureAction::ResumePreview,
                )
            });
        }

        next_transition(self.state, result.af_state, result.ae_state)
    }

    /// Apply a transition whose action was submitted successfully
    pub fn commit(&mut self, transition: Transition) {
        if transition.from != self.state {
            warn!(
                expected = %transition.from,
                actual = %self.state,
                "Discarding stale transition"
            );
            return;
        }

        info!(from = %transition.from, to = %transition.next, "Capture state changed");
        self.state = transition.next;
    }

    /// A submission failed: hold the current state and ignore results
    pub fn halt(&mut self) {
        warn!(state = %self.state, "Capture sequence halted");
        self.halted = true;
    }

    /// Back to preview, used when a session is (re)opened
    pub fn reset(&mut self) {
        self.state = CameraState::Preview;
        self.halted = false;
    }
}
