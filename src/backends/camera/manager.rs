// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle manager
//!
//! The manager provides:
//! - Start/stop of one session worker at a time
//! - Picture requests forwarded to the running worker
//! - A read-only view of the still capture state
//!
//! Between sessions the manager holds the backend itself. Starting moves it
//! onto a fresh worker thread; stopping joins that thread and takes it back.

use super::CameraBackend;
use super::frame_loop::BackgroundExecutor;
use super::session::{CameraEvent, EventSink, SessionOutputs, SessionSettings, SessionWorker, lock};
use super::types::*;
use crate::app::state::CaptureHost;
use crate::constants::EXECUTOR_THREAD_NAME;
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::capture::{
    CameraState, CaptureStateMachine, ScreenRotation, StillCaptureRequest,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// A worker thread and the flag that cancels it
struct RunningSession<B: CameraBackend> {
    executor: BackgroundExecutor<CameraEvent, SessionWorker<B>>,
    closing: Arc<AtomicBool>,
    surface: FrameSize,
}

/// Camera session manager
pub struct CameraManager<B: CameraBackend> {
    /// Present while no session is running
    backend: Option<B>,
    settings: SessionSettings,
    outputs: SessionOutputs,
    machine: Arc<Mutex<CaptureStateMachine>>,
    running: Option<RunningSession<B>>,
}

impl<B: CameraBackend> CameraManager<B> {
    /// Create a new manager
    ///
    /// # Arguments
    /// * `backend` - The camera implementation to drive
    /// * `settings` - Camera selection and conversion settings
    /// * `outputs` - Frame listener and preview surface
    pub fn new(backend: B, settings: SessionSettings, outputs: SessionOutputs) -> Self {
        info!(facing = %settings.selector.facing, "Creating camera manager");
        Self {
            backend: Some(backend),
            settings,
            outputs,
            machine: Arc::new(Mutex::new(CaptureStateMachine::new())),
            running: None,
        }
    }

    /// Open the camera for a surface and start streaming
    ///
    /// A running session is stopped first. Opening itself happens on the
    /// worker; failures there reach the frame listener's `on_camera_error`.
    pub fn start(&mut self, surface: FrameSize) -> AppResult<()> {
        if self.running.is_some() {
            self.stop();
        }

        let backend = self
            .backend
            .take()
            .ok_or_else(|| AppError::Executor("camera backend was lost".into()))?;

        info!(surface = %surface, "Starting camera session");

        let closing = Arc::new(AtomicBool::new(false));
        let settings = self.settings.clone();
        let outputs = self.outputs.clone();
        let machine = Arc::clone(&self.machine);
        let worker_closing = Arc::clone(&closing);

        let executor = BackgroundExecutor::spawn_with_init(
            EXECUTOR_THREAD_NAME,
            move |sender| {
                SessionWorker::new(
                    backend,
                    settings,
                    outputs,
                    EventSink::new(sender),
                    worker_closing,
                    machine,
                )
            },
            |worker, event| worker.handle(event),
        )
        .map_err(|e| AppError::Executor(format!("failed to spawn camera thread: {e}")))?;

        executor.post(CameraEvent::Open { surface });
        self.running = Some(RunningSession {
            executor,
            closing,
            surface,
        });
        Ok(())
    }

    /// Close the session and wait for the worker to exit
    ///
    /// Anything still queued, including an in-flight capture, is abandoned.
    /// No listener callback fires after this returns.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        info!(surface = %running.surface, "Stopping camera session");
        running.closing.store(true, Ordering::Release);

        match running.executor.shutdown(CameraEvent::Close) {
            Some(worker) => {
                debug!("Camera worker joined");
                self.backend = Some(worker.into_backend());
            }
            None => error!("Camera worker panicked, backend lost"),
        }
    }

    /// Ask the running session for a picture
    pub fn take_picture(
        &self,
        path: impl Into<PathBuf>,
        rotation: ScreenRotation,
    ) -> AppResult<()> {
        let running = self.running.as_ref().ok_or(BackendError::NotOpen)?;
        let request = StillCaptureRequest::new(path, rotation);
        debug!(path = %request.path.display(), ?rotation, "Queueing picture request");

        if running.executor.post(CameraEvent::TakePicture(request)) {
            Ok(())
        } else {
            Err(AppError::Executor("camera thread is not running".into()))
        }
    }

    pub fn camera_state(&self) -> CameraState {
        lock(&self.machine).state()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Surface size of the running session
    pub fn surface(&self) -> Option<FrameSize> {
        self.running.as_ref().map(|running| running.surface)
    }

    /// The backend, while no session holds it
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Describe the configured camera; only while stopped
    pub fn characteristics(&self) -> AppResult<CameraCharacteristics> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| AppError::Executor("camera is in use by a session".into()))?;
        Ok(backend.query_characteristics(&self.settings.selector)?)
    }
}

impl<B: CameraBackend> CaptureHost for CameraManager<B> {
    fn start(&mut self, surface: FrameSize) -> AppResult<()> {
        CameraManager::start(self, surface)
    }

    fn stop(&mut self) {
        CameraManager::stop(self)
    }
}

impl<B: CameraBackend> Drop for CameraManager<B> {
    fn drop(&mut self) {
        if self.running.is_some() {
            debug!("CameraManager dropped, stopping session");
            self.stop();
        }
    }
}
