// SPDX-License-Identifier: GPL-3.0-only

//! Per-session worker
//!
//! Hardware callbacks arrive as [`CameraEvent`] messages on the background
//! executor's queue. [`SessionWorker`] owns the backend and the open
//! [`CaptureSession`] and handles one message at a time:
//!
//! - preview frames are converted and passed to the frame listener, then to
//!   the preview surface
//! - capture results drive the [`CaptureStateMachine`], whose transitions
//!   are committed only once the matching request was accepted
//! - the still image is written to the requested path verbatim
//!
//! Closing sets a shared flag before the `Close` message is queued. From then
//! on every other message is dropped unhandled, so an in-flight capture is
//! abandoned rather than drained.

use super::CameraBackend;
use super::format_converters::{ConversionMode, FrameConverter};
use super::frame_loop::{FrameReadyGate, LoopAction};
use super::preview_size::select_preview_size;
use super::types::{
    AePrecaptureTrigger, AfTrigger, BackendError, CameraSelector, CaptureRequest, CaptureResult,
    CaptureSession, FrameSize, RequestTag, RequestTemplate, StreamConfig, StreamKind, SubmitMode,
};
use crate::app::camera_preview::{FpsMeter, PreviewSurface};
use crate::app::frame_processor::FrameListener;
use crate::pipelines::photo::capture::{
    CameraState, CaptureAction, CaptureStateMachine, StillCaptureRequest, Transition,
    compute_orientation,
};
use crate::errors::PhotoError;
use crate::pipelines::photo::encoding::save_jpeg;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Messages handled by the session worker
#[derive(Debug)]
pub enum CameraEvent {
    /// Open the camera for a surface of this size
    Open { surface: FrameSize },
    /// User asked for a picture
    TakePicture(StillCaptureRequest),
    /// A preview image is ready to acquire
    FrameAvailable,
    /// The still image is ready to acquire
    StillImageAvailable,
    /// Partial or completed result of a submitted request
    CaptureResult(CaptureResult),
    /// The device failed or disconnected
    DeviceError(BackendError),
    /// Close the session and stop the worker
    Close,
}

/// How a backend reports asynchronous events to the session worker
///
/// Cheap to clone. Frame-ready notifications are coalesced: while one is
/// queued and not yet handled, further ones are absorbed.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<CameraEvent>,
    frame_gate: FrameReadyGate,
}

impl EventSink {
    pub fn new(sender: mpsc::UnboundedSender<CameraEvent>) -> Self {
        Self {
            sender,
            frame_gate: FrameReadyGate::new(),
        }
    }

    /// Report a new preview image; returns true if a message was queued
    pub fn frame_available(&self) -> bool {
        if !self.frame_gate.arm() {
            return false;
        }
        self.send(CameraEvent::FrameAvailable)
    }

    pub fn still_image_available(&self) -> bool {
        self.send(CameraEvent::StillImageAvailable)
    }

    pub fn capture_result(&self, result: CaptureResult) -> bool {
        self.send(CameraEvent::CaptureResult(result))
    }

    pub fn device_error(&self, error: BackendError) -> bool {
        self.send(CameraEvent::DeviceError(error))
    }

    /// False once the worker has exited
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    fn send(&self, event: CameraEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Clear the coalescing mark; the next frame notification queues again
    pub(crate) fn take_frame_ready(&self) -> bool {
        self.frame_gate.take()
    }
}

/// Lock the shared capture state
///
/// A panic while holding the lock leaves a usable machine behind, so a
/// poisoned lock is recovered rather than propagated.
pub(crate) fn lock(machine: &Mutex<CaptureStateMachine>) -> MutexGuard<'_, CaptureStateMachine> {
    machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Session settings fixed for the lifetime of a worker
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub selector: CameraSelector,
    /// Cap applied on top of the surface bounds when choosing the preview size
    pub max_preview_size: Option<FrameSize>,
    pub conversion_mode: ConversionMode,
    pub fps_meter: bool,
}

/// Collaborators the worker reports to
#[derive(Clone)]
pub struct SessionOutputs {
    pub listener: Arc<dyn FrameListener>,
    pub surface: Arc<dyn PreviewSurface>,
}

/// An open session and what the worker keeps alongside it
struct OpenSession {
    session: CaptureSession,
    /// The repeating preview request, reused as the base for AF/AE triggers
    preview_request: CaptureRequest,
    /// Request whose still capture is under way
    pending: Option<StillCaptureRequest>,
}

/// Owns the backend and runs one session's callbacks
pub struct SessionWorker<B: CameraBackend> {
    backend: B,
    settings: SessionSettings,
    outputs: SessionOutputs,
    events: EventSink,
    closing: Arc<AtomicBool>,
    machine: Arc<Mutex<CaptureStateMachine>>,
    converter: FrameConverter,
    fps_meter: Option<FpsMeter>,
    open: Option<OpenSession>,
}

impl<B: CameraBackend> SessionWorker<B> {
    pub fn new(
        backend: B,
        settings: SessionSettings,
        outputs: SessionOutputs,
        events: EventSink,
        closing: Arc<AtomicBool>,
        machine: Arc<Mutex<CaptureStateMachine>>,
    ) -> Self {
        let converter = FrameConverter::new(settings.conversion_mode);
        Self {
            backend,
            settings,
            outputs,
            events,
            closing,
            machine,
            converter,
            fps_meter: None,
            open: None,
        }
    }

    /// Hand the backend back once the worker is done
    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Handle one message
    pub fn handle(&mut self, event: CameraEvent) -> LoopAction {
        if self.closing.load(Ordering::Acquire) && !matches!(event, CameraEvent::Close) {
            debug!(?event, "Session closing, dropping event");
            return LoopAction::Continue;
        }

        match event {
            CameraEvent::Open { surface } => self.open_session(surface),
            CameraEvent::TakePicture(request) => self.take_picture(request),
            CameraEvent::FrameAvailable => self.on_frame_available(),
            CameraEvent::StillImageAvailable => self.on_still_image_available(),
            CameraEvent::CaptureResult(result) => self.on_capture_result(result),
            CameraEvent::DeviceError(e) => {
                error!(error = %e, "Camera device error");
                self.close_session();
                self.outputs.listener.on_camera_error(&e);
            }
            CameraEvent::Close => {
                self.close_session();
                return LoopAction::Stop;
            }
        }

        LoopAction::Continue
    }

    fn lock_machine(&self) -> MutexGuard<'_, CaptureStateMachine> {
        lock(&self.machine)
    }

    // ===== Lifecycle =====

    fn open_session(&mut self, surface: FrameSize) {
        if self.open.is_some() {
            debug!("Session already open, reopening");
            self.close_session();
        }

        if let Err(e) = self.try_open(surface) {
            error!(error = %e, surface = %surface, "Failed to open camera session");
            self.outputs.listener.on_camera_error(&e);
        }
    }

    fn try_open(&mut self, surface: FrameSize) -> Result<(), BackendError> {
        let characteristics = self.backend.query_characteristics(&self.settings.selector)?;

        // Preview sizes are listed in sensor orientation
        let bounds = if characteristics.swaps_dimensions() {
            surface.transposed()
        } else {
            surface
        };
        let preview = select_preview_size(
            &characteristics.preview_sizes,
            bounds,
            self.settings.max_preview_size,
        )
        .ok_or_else(|| BackendError::Unsupported("camera reports no preview sizes".into()))?;
        let still = characteristics
            .largest_jpeg_size()
            .ok_or_else(|| BackendError::Unsupported("camera reports no JPEG sizes".into()))?;

        info!(
            camera = %characteristics.id,
            facing = %characteristics.facing,
            preview = %preview,
            still = %still,
            "Opening camera session"
        );

        let streams = StreamConfig { preview, still };
        let session =
            self.backend
                .open_session(&self.settings.selector, streams, self.events.clone())?;

        let preview_request = CaptureRequest::new(RequestTemplate::Preview, RequestTag::Preview)
            .with_target(StreamKind::Preview);
        if let Err(e) =
            self.backend
                .submit_request(&session, &preview_request, SubmitMode::Repeating)
        {
            self.backend.close_session(session);
            return Err(e);
        }

        self.lock_machine().reset();
        self.fps_meter = self.settings.fps_meter.then(|| FpsMeter::new(preview));
        self.open = Some(OpenSession {
            session,
            preview_request,
            pending: None,
        });
        Ok(())
    }

    fn close_session(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };

        if let Some(request) = open.pending {
            debug!(path = %request.path.display(), "Abandoning in-flight capture");
        }
        info!(session = open.session.id, "Closing camera session");
        self.backend.close_session(open.session);
        self.lock_machine().reset();
        self.fps_meter = None;
    }

    // ===== Preview =====

    fn on_frame_available(&mut self) {
        self.events.take_frame_ready();
        let Some(open) = self.open.as_ref() else {
            return;
        };

        // Newest image only; older ones were released by the backend
        let Some(image) = self
            .backend
            .acquire_latest_frame(&open.session, StreamKind::Preview)
        else {
            debug!("Frame notification without an image");
            return;
        };

        let converted = self.converter.convert(&image.frame(), image.sequence);
        drop(image);
        if converted.is_empty() {
            return;
        }

        if let Some(meter) = self.fps_meter.as_mut() {
            meter.set_resolution(converted.size());
            meter.measure();
        }

        let shown = self.outputs.listener.on_frame_ready(converted);
        self.outputs.surface.present(shown);
    }

    // ===== Still capture =====

    fn take_picture(&mut self, request: StillCaptureRequest) {
        if self.open.is_none() {
            warn!(path = %request.path.display(), "Picture requested without an open session");
            self.outputs
                .listener
                .on_still_capture_failed(&request.path, &BackendError::NotOpen.to_string());
            return;
        }

        let machine = Arc::clone(&self.machine);
        let mut machine = lock(&machine);
        let Some(transition) = machine.request_capture() else {
            drop(machine);
            self.outputs
                .listener
                .on_still_capture_failed(&request.path, "a capture is already in progress");
            return;
        };

        match self.perform(transition) {
            Ok(()) => {
                machine.commit(transition);
                drop(machine);
                if let Some(open) = self.open.as_mut() {
                    open.pending = Some(request);
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to trigger focus lock");
                machine.halt();
                drop(machine);
                self.outputs
                    .listener
                    .on_still_capture_failed(&request.path, &e.to_string());
            }
        }
    }

    fn on_capture_result(&mut self, result: CaptureResult) {
        if self.open.is_none() {
            return;
        }

        let machine = Arc::clone(&self.machine);
        let mut machine = lock(&machine);
        let Some(transition) = machine.on_result(&result) else {
            return;
        };

        match self.perform(transition) {
            Ok(()) => machine.commit(transition),
            Err(e) => {
                warn!(
                    error = %e,
                    state = %transition.from,
                    action = ?transition.action,
                    "Capture request failed, holding state"
                );
                machine.halt();
                drop(machine);
                if let Some(request) = self.open.as_mut().and_then(|open| open.pending.take()) {
                    self.outputs
                        .listener
                        .on_still_capture_failed(&request.path, &e.to_string());
                }
            }
        }
    }

    /// Submit whatever a transition needs
    fn perform(&mut self, transition: Transition) -> Result<(), BackendError> {
        let open = self.open.as_ref().ok_or(BackendError::NotOpen)?;
        let session = &open.session;

        match transition.action {
            CaptureAction::None => Ok(()),
            CaptureAction::TriggerFocus => {
                let trigger = CaptureRequest {
                    af_trigger: AfTrigger::Start,
                    ..open.preview_request.tagged(RequestTag::Trigger)
                };
                self.backend
                    .submit_request(session, &trigger, SubmitMode::Single)
            }
            CaptureAction::TriggerPrecapture => {
                debug!("Running precapture sequence");
                let trigger = CaptureRequest {
                    ae_precapture_trigger: AePrecaptureTrigger::Start,
                    ..open.preview_request.tagged(RequestTag::Trigger)
                };
                self.backend
                    .submit_request(session, &trigger, SubmitMode::Single)
            }
            CaptureAction::CaptureStill => {
                let rotation = open
                    .pending
                    .as_ref()
                    .map(|request| request.rotation)
                    .unwrap_or_default();
                let orientation =
                    compute_orientation(rotation, session.characteristics.sensor_orientation);
                let still = CaptureRequest {
                    jpeg_orientation: Some(orientation),
                    ..CaptureRequest::new(RequestTemplate::StillCapture, RequestTag::Still)
                        .with_target(StreamKind::Still)
                };

                debug!(orientation, "Capturing still picture");
                self.backend.stop_repeating(session)?;
                self.backend.abort_captures(session)?;
                self.backend
                    .submit_request(session, &still, SubmitMode::Single)
            }
            CaptureAction::ResumePreview => {
                debug!("Unlocking focus");
                let cancel = CaptureRequest {
                    af_trigger: AfTrigger::Cancel,
                    ..open.preview_request.tagged(RequestTag::Trigger)
                };
                self.backend
                    .submit_request(session, &cancel, SubmitMode::Single)?;
                self.backend
                    .submit_request(session, &open.preview_request, SubmitMode::Repeating)
            }
        }
    }

    fn on_still_image_available(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };

        let image = self
            .backend
            .acquire_latest_frame(&open.session, StreamKind::Still);
        let Some(request) = open.pending.take() else {
            warn!(error = %PhotoError::NoPendingRequest, "Dropping still image");
            return;
        };
        let Some(image) = image else {
            let error = PhotoError::NoImageAvailable;
            warn!(path = %request.path.display(), %error, "Still capture failed");
            self.outputs
                .listener
                .on_still_capture_failed(&request.path, &error.to_string());
            return;
        };

        // save_jpeg consumes the image, releasing it on every path
        match save_jpeg(image, &request.path) {
            Ok(_) => self.outputs.listener.on_still_capture_complete(&request.path),
            Err(e) => {
                error!(error = %e, "Failed to save photo");
                self.outputs
                    .listener
                    .on_still_capture_failed(&request.path, &e.to_string());
            }
        }
    }

    /// Current position of the still capture sequence
    pub fn camera_state(&self) -> CameraState {
        self.lock_machine().state()
    }
}
