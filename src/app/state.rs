// SPDX-License-Identifier: GPL-3.0-only

//! Preview lifecycle state
//!
//! Capture runs only while the view is enabled, camera permission is granted
//! and a surface exists. [`ViewLifecycleController`] keeps those three inputs
//! behind one lock and starts or stops its [`CaptureHost`] whenever the
//! derived state changes.

use crate::backends::camera::types::FrameSize;
use crate::errors::AppResult;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Whether capture should be running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Started,
}

/// The three lifecycle inputs and the state derived from them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewRunState {
    pub enabled: bool,
    pub permission_granted: bool,
    pub surface_present: bool,
    /// Size of the current surface, used when capture starts
    pub surface: FrameSize,
    pub state: RunState,
}

impl ViewRunState {
    /// State the inputs call for
    pub fn target(&self) -> RunState {
        if self.enabled && self.permission_granted && self.surface_present {
            RunState::Started
        } else {
            RunState::Stopped
        }
    }
}

/// What the controller starts and stops
pub trait CaptureHost {
    /// Open the camera and stream previews sized for `surface`
    fn start(&mut self, surface: FrameSize) -> AppResult<()>;

    /// Close the camera and release the background executor
    fn stop(&mut self);
}

struct Inner<H> {
    view: ViewRunState,
    host: H,
}

impl<H: CaptureHost> Inner<H> {
    /// Drive the host towards the state the inputs call for
    fn check_current_state(&mut self) {
        let target = self.view.target();
        if target == self.view.state {
            return;
        }

        debug!(from = ?self.view.state, to = ?target, "View run state changing");
        match target {
            RunState::Started => {
                info!(surface = %self.view.surface, "Starting capture");
                // Stays Started on failure; the host has reported the error
                // and the next input change retries
                if let Err(e) = self.host.start(self.view.surface) {
                    error!(error = %e, "Failed to start capture");
                }
            }
            RunState::Stopped => {
                info!("Stopping capture");
                self.host.stop();
            }
        }
        self.view.state = target;
    }
}

/// Starts and stops capture from the view's lifecycle inputs
///
/// Every setter updates one input and re-derives the state under a single
/// lock, so concurrent callers always observe a consistent read-decide-act
/// sequence.
pub struct ViewLifecycleController<H: CaptureHost> {
    inner: Mutex<Inner<H>>,
}

impl<H: CaptureHost> ViewLifecycleController<H> {
    pub fn new(host: H) -> Self {
        Self {
            inner: Mutex::new(Inner {
                view: ViewRunState::default(),
                host,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<H>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Camera permission was granted
    pub fn set_permission(&self) {
        self.set_permission_granted(true);
    }

    pub fn set_permission_granted(&self, granted: bool) {
        let mut inner = self.lock();
        inner.view.permission_granted = granted;
        inner.check_current_state();
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.lock();
        inner.view.enabled = enabled;
        inner.check_current_state();
    }

    /// Surface appeared or went away, keeping the last known size
    pub fn set_surface_present(&self, present: bool) {
        let mut inner = self.lock();
        inner.view.surface_present = present;
        inner.check_current_state();
    }

    /// Surface created or resized
    ///
    /// A resize is never applied in place: capture is forced to stop and
    /// then started again with the new size.
    pub fn surface_changed(&self, size: FrameSize) {
        let mut inner = self.lock();
        if inner.view.surface_present {
            inner.view.surface_present = false;
            inner.check_current_state();
        }
        inner.view.surface = size;
        inner.view.surface_present = true;
        inner.check_current_state();
    }

    pub fn surface_destroyed(&self) {
        self.set_surface_present(false);
    }

    pub fn state(&self) -> RunState {
        self.lock().view.state
    }

    pub fn view(&self) -> ViewRunState {
        self.lock().view
    }

    /// Run `f` on the host while holding the controller lock
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.lock().host)
    }

    /// Stop capture if running and hand back the host
    pub fn into_host(self) -> H {
        let mut inner = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.view.state == RunState::Started {
            inner.host.stop();
        }
        inner.host
    }
}
