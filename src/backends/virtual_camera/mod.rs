// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! A scriptable [`CameraBackend`] with no hardware behind it. Frames are
//! pushed in through a [`VirtualCameraControl`] handle and synthesized in the
//! configured chroma packing and row padding; still captures produce real
//! JPEG bytes. AF/AE behaviour is scripted per trigger request, and
//! submissions can be made to fail, so every branch of the capture sequence
//! can be driven deterministically.
//!
//! # Architecture
//!
//! ```text
//! VirtualCameraControl ──push_frame──▶ ┌──────────────┐
//!        │                             │ Shared state │ ──EventSink──▶ session worker
//!        └──script / fail / inspect──▶ └──────────────┘
//!                                             ▲
//!                          VirtualCamera ─────┘  (CameraBackend calls from the worker)
//! ```

mod synth;

pub use synth::{ChromaPacking, jpeg_bytes, jpeg_image, yuv_image};

use crate::backends::camera::CameraBackend;
use crate::backends::camera::session::EventSink;
use crate::backends::camera::types::{
    AeState, AfState, AfTrigger, AePrecaptureTrigger, BackendError, BackendResult, CameraFacing,
    CameraSelector, CameraCharacteristics, CaptureRequest, CaptureResult, CaptureSession,
    FrameSize, RequestTag, SensorImage, StreamConfig, StreamKind, SubmitMode,
};
use crate::constants::{JPEG_QUALITY, PREVIEW_MAX_IMAGES, STILL_MAX_IMAGES};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Static description of the simulated camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualCameraConfig {
    pub id: String,
    pub facing: CameraFacing,
    pub sensor_orientation: u32,
    pub preview_sizes: Vec<FrameSize>,
    pub jpeg_sizes: Vec<FrameSize>,
    pub packing: ChromaPacking,
    /// Bytes of padding after every row but the last
    pub row_padding: usize,
    /// Colour of synthesized stills
    pub still_rgb: [u8; 3],
}

impl Default for VirtualCameraConfig {
    fn default() -> Self {
        Self {
            id: "virtual-0".to_string(),
            facing: CameraFacing::Back,
            sensor_orientation: 90,
            preview_sizes: vec![
                FrameSize::new(1920, 1080),
                FrameSize::new(1280, 720),
                FrameSize::new(640, 480),
                FrameSize::new(320, 240),
            ],
            jpeg_sizes: vec![FrameSize::new(640, 480), FrameSize::new(1280, 960)],
            packing: ChromaPacking::Planar,
            row_padding: 0,
            still_rgb: [230, 230, 220],
        }
    }
}

/// Something the backend was asked to do, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Open(StreamConfig),
    Submit(CaptureRequest, SubmitMode),
    StopRepeating,
    AbortCaptures,
    Close,
}

/// A burst of metering results, emitted in order for one trigger request
pub type ScriptedBurst = Vec<(Option<AfState>, Option<AeState>)>;

/// Focus settles at once with exposure already converged
fn focus_burst() -> ScriptedBurst {
    vec![(Some(AfState::FocusedLocked), Some(AeState::Converged))]
}

/// Exposure runs its precapture metering, then converges
fn precapture_burst() -> ScriptedBurst {
    vec![
        (Some(AfState::FocusedLocked), Some(AeState::Precapture)),
        (Some(AfState::FocusedLocked), Some(AeState::Converged)),
    ]
}

struct ActiveSession {
    id: u64,
    events: EventSink,
    streams: StreamConfig,
    repeating: Option<CaptureRequest>,
    preview_images: VecDeque<SensorImage>,
    still_images: VecDeque<SensorImage>,
}

#[derive(Default)]
struct Shared {
    session: Option<ActiveSession>,
    next_session_id: u64,
    next_sequence: u64,
    bursts: VecDeque<ScriptedBurst>,
    failures_skip: usize,
    failures_pending: usize,
    access_denied: bool,
    operations: Vec<Operation>,
    last_still: Option<Vec<u8>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Create a virtual camera and the handle that drives it
pub fn virtual_camera(config: VirtualCameraConfig) -> (VirtualCamera, VirtualCameraControl) {
    let shared = Arc::new(Mutex::new(Shared::default()));
    let config = Arc::new(config);
    (
        VirtualCamera {
            config: Arc::clone(&config),
            shared: Arc::clone(&shared),
        },
        VirtualCameraControl { config, shared },
    )
}

/// The backend half
pub struct VirtualCamera {
    config: Arc<VirtualCameraConfig>,
    shared: Arc<Mutex<Shared>>,
}

impl VirtualCamera {
    fn characteristics(&self) -> CameraCharacteristics {
        CameraCharacteristics {
            id: self.config.id.clone(),
            facing: self.config.facing,
            sensor_orientation: self.config.sensor_orientation,
            preview_sizes: self.config.preview_sizes.clone(),
            jpeg_sizes: self.config.jpeg_sizes.clone(),
        }
    }

    fn active<'a>(
        shared: &'a mut Shared,
        session: &CaptureSession,
    ) -> BackendResult<&'a mut ActiveSession> {
        shared
            .session
            .as_mut()
            .filter(|active| active.id == session.id)
            .ok_or(BackendError::NotOpen)
    }
}

impl CameraBackend for VirtualCamera {
    fn query_characteristics(
        &self,
        selector: &CameraSelector,
    ) -> BackendResult<CameraCharacteristics> {
        if selector.facing != self.config.facing {
            return Err(BackendError::Unsupported(format!(
                "no {} camera",
                selector.facing
            )));
        }
        Ok(self.characteristics())
    }

    fn open_session(
        &mut self,
        selector: &CameraSelector,
        streams: StreamConfig,
        events: EventSink,
    ) -> BackendResult<CaptureSession> {
        let characteristics = self.query_characteristics(selector)?;
        let mut shared = lock(&self.shared);

        if shared.access_denied {
            return Err(BackendError::AccessDenied("camera permission revoked".into()));
        }
        if shared.session.is_some() {
            return Err(BackendError::DeviceUnavailable("camera already in use".into()));
        }
        if !characteristics.preview_sizes.contains(&streams.preview) {
            return Err(BackendError::Unsupported(format!(
                "preview size {}",
                streams.preview
            )));
        }
        if !characteristics.jpeg_sizes.contains(&streams.still) {
            return Err(BackendError::Unsupported(format!("JPEG size {}", streams.still)));
        }

        shared.next_session_id += 1;
        let id = shared.next_session_id;
        shared.operations.push(Operation::Open(streams));
        shared.session = Some(ActiveSession {
            id,
            events,
            streams,
            repeating: None,
            preview_images: VecDeque::with_capacity(PREVIEW_MAX_IMAGES),
            still_images: VecDeque::with_capacity(STILL_MAX_IMAGES),
        });

        info!(id, preview = %streams.preview, still = %streams.still, "Virtual camera opened");
        Ok(CaptureSession {
            id,
            characteristics,
            streams,
        })
    }

    fn close_session(&mut self, session: CaptureSession) {
        let mut shared = lock(&self.shared);
        if shared.session.as_ref().is_some_and(|active| active.id == session.id) {
            shared.session = None;
            shared.operations.push(Operation::Close);
            info!(id = session.id, "Virtual camera closed");
        }
    }

    fn submit_request(
        &mut self,
        session: &CaptureSession,
        request: &CaptureRequest,
        mode: SubmitMode,
    ) -> BackendResult<()> {
        let mut shared = lock(&self.shared);
        shared
            .operations
            .push(Operation::Submit(request.clone(), mode));

        if shared.failures_skip > 0 {
            shared.failures_skip -= 1;
        } else if shared.failures_pending > 0 {
            shared.failures_pending -= 1;
            warn!(tag = ?request.tag, "Virtual camera rejecting request");
            return Err(BackendError::SubmissionFailed("injected failure".into()));
        }

        Self::active(&mut shared, session)?;

        if mode == SubmitMode::Repeating {
            if let Some(active) = shared.session.as_mut() {
                active.repeating = Some(request.clone());
            }
            return Ok(());
        }

        match request.tag {
            RequestTag::Trigger => {
                let default_burst = if request.ae_precapture_trigger == AePrecaptureTrigger::Start
                {
                    precapture_burst()
                } else if request.af_trigger == AfTrigger::Start {
                    focus_burst()
                } else {
                    return Ok(());
                };
                let burst = shared.bursts.pop_front().unwrap_or(default_burst);
                let Some(active) = shared.session.as_ref() else {
                    return Err(BackendError::NotOpen);
                };
                let last = burst.len().saturating_sub(1);
                for (i, (af, ae)) in burst.into_iter().enumerate() {
                    let result = if i == last {
                        CaptureResult::completed(RequestTag::Trigger, af, ae)
                    } else {
                        CaptureResult::partial(RequestTag::Trigger, af, ae)
                    };
                    active.events.capture_result(result);
                }
            }
            RequestTag::Still => {
                let size = Self::active(&mut shared, session)?.streams.still;
                let bytes = jpeg_bytes(size, self.config.still_rgb, JPEG_QUALITY)
                    .map_err(|e| BackendError::SubmissionFailed(e.to_string()))?;
                shared.next_sequence += 1;
                let sequence = shared.next_sequence;
                shared.last_still = Some(bytes.clone());

                let active = Self::active(&mut shared, session)?;
                while active.still_images.len() >= STILL_MAX_IMAGES {
                    active.still_images.pop_front();
                }
                active.still_images.push_back(jpeg_image(size, bytes, sequence));
                active.events.still_image_available();
                active
                    .events
                    .capture_result(CaptureResult::completed(RequestTag::Still, None, None));
                debug!(sequence, size = %size, "Virtual still captured");
            }
            RequestTag::Preview => {}
        }

        Ok(())
    }

    fn stop_repeating(&mut self, session: &CaptureSession) -> BackendResult<()> {
        let mut shared = lock(&self.shared);
        shared.operations.push(Operation::StopRepeating);
        Self::active(&mut shared, session)?.repeating = None;
        Ok(())
    }

    fn abort_captures(&mut self, session: &CaptureSession) -> BackendResult<()> {
        let mut shared = lock(&self.shared);
        shared.operations.push(Operation::AbortCaptures);
        Self::active(&mut shared, session)?;
        Ok(())
    }

    fn acquire_latest_frame(
        &mut self,
        session: &CaptureSession,
        stream: StreamKind,
    ) -> Option<SensorImage> {
        let mut shared = lock(&self.shared);
        let active = Self::active(&mut shared, session).ok()?;
        let queue = match stream {
            StreamKind::Preview => &mut active.preview_images,
            StreamKind::Still => &mut active.still_images,
        };
        let newest = queue.pop_back();
        queue.clear();
        newest
    }
}

/// Drives a [`VirtualCamera`] from outside the session worker
#[derive(Clone)]
pub struct VirtualCameraControl {
    config: Arc<VirtualCameraConfig>,
    shared: Arc<Mutex<Shared>>,
}

impl VirtualCameraControl {
    pub fn config(&self) -> &VirtualCameraConfig {
        &self.config
    }

    /// Deliver a constant-colour preview frame
    ///
    /// Returns the frame's sequence number, or `None` when no session is
    /// open or the preview is not streaming.
    pub fn push_frame(&self, yuv: (u8, u8, u8)) -> Option<u64> {
        let mut shared = lock(&self.shared);
        shared.next_sequence += 1;
        let sequence = shared.next_sequence;

        let active = shared.session.as_mut()?;
        active.repeating.as_ref()?;

        let image = yuv_image(
            active.streams.preview,
            yuv,
            self.config.packing,
            self.config.row_padding,
            sequence,
        );
        // The stream holds a bounded number of images; the oldest goes first
        while active.preview_images.len() >= PREVIEW_MAX_IMAGES {
            active.preview_images.pop_front();
        }
        active.preview_images.push_back(image);
        active.events.frame_available();
        Some(sequence)
    }

    /// Queue the results the next AF or AE trigger produces
    ///
    /// Unscripted triggers lock focus with converged exposure, or run a
    /// short precapture metering for an AE trigger.
    pub fn script_burst(&self, burst: ScriptedBurst) {
        lock(&self.shared).bursts.push_back(burst);
    }

    /// Make the next `count` submissions fail
    pub fn fail_next_submissions(&self, count: usize) {
        self.fail_submissions_after(0, count);
    }

    /// Let `skip` submissions through, then fail the following `count`
    pub fn fail_submissions_after(&self, skip: usize, count: usize) {
        let mut shared = lock(&self.shared);
        shared.failures_skip = skip;
        shared.failures_pending = count;
    }

    pub fn set_access_denied(&self, denied: bool) {
        lock(&self.shared).access_denied = denied;
    }

    /// Report the device as gone
    pub fn disconnect(&self) -> bool {
        let shared = lock(&self.shared);
        shared
            .session
            .as_ref()
            .is_some_and(|active| active.events.device_error(BackendError::Disconnected))
    }

    pub fn is_open(&self) -> bool {
        lock(&self.shared).session.is_some()
    }

    pub fn is_streaming(&self) -> bool {
        lock(&self.shared)
            .session
            .as_ref()
            .is_some_and(|active| active.repeating.is_some())
    }

    /// Preview size of the open session
    pub fn preview_size(&self) -> Option<FrameSize> {
        lock(&self.shared)
            .session
            .as_ref()
            .map(|active| active.streams.preview)
    }

    pub fn operations(&self) -> Vec<Operation> {
        lock(&self.shared).operations.clone()
    }

    /// Requests submitted so far, with their mode
    pub fn submitted_requests(&self) -> Vec<(CaptureRequest, SubmitMode)> {
        lock(&self.shared)
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Submit(request, mode) => Some((request.clone(), *mode)),
                _ => None,
            })
            .collect()
    }

    /// Bytes of the most recent still
    pub fn last_still_jpeg(&self) -> Option<Vec<u8>> {
        lock(&self.shared).last_still.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::RequestTemplate;
    use tokio::sync::mpsc;

    fn open(
        camera: &mut VirtualCamera,
    ) -> (CaptureSession, mpsc::UnboundedReceiver<crate::backends::camera::CameraEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let streams = StreamConfig {
            preview: FrameSize::new(320, 240),
            still: FrameSize::new(640, 480),
        };
        let session = camera
            .open_session(&CameraSelector::default(), streams, EventSink::new(tx))
            .unwrap();
        (session, rx)
    }

    #[test]
    fn test_single_session_at_a_time() {
        let (mut camera, control) = virtual_camera(VirtualCameraConfig::default());
        let (session, _rx) = open(&mut camera);

        let (tx, _rx2) = mpsc::unbounded_channel();
        let second = camera.open_session(
            &CameraSelector::default(),
            session.streams,
            EventSink::new(tx),
        );
        assert!(matches!(second, Err(BackendError::DeviceUnavailable(_))));

        camera.close_session(session);
        assert!(!control.is_open());
    }

    #[test]
    fn test_wrong_facing_is_unsupported() {
        let (camera, _control) = virtual_camera(VirtualCameraConfig::default());
        let front = CameraSelector::facing(CameraFacing::Front);
        assert!(matches!(
            camera.query_characteristics(&front),
            Err(BackendError::Unsupported(_))
        ));
    }

    #[test]
    fn test_latest_frame_releases_older_ones() {
        let (mut camera, control) = virtual_camera(VirtualCameraConfig::default());
        let (session, _rx) = open(&mut camera);
        let preview = CaptureRequest::new(RequestTemplate::Preview, RequestTag::Preview)
            .with_target(StreamKind::Preview);
        camera
            .submit_request(&session, &preview, SubmitMode::Repeating)
            .unwrap();

        control.push_frame((10, 128, 128));
        control.push_frame((20, 128, 128));
        let newest = control.push_frame((30, 128, 128)).unwrap();

        let image = camera
            .acquire_latest_frame(&session, StreamKind::Preview)
            .unwrap();
        assert_eq!(image.sequence, newest);
        assert!(camera
            .acquire_latest_frame(&session, StreamKind::Preview)
            .is_none());
    }

    #[test]
    fn test_frames_need_a_streaming_session() {
        let (mut camera, control) = virtual_camera(VirtualCameraConfig::default());
        assert_eq!(control.push_frame((0, 0, 0)), None);

        let (_session, _rx) = open(&mut camera);
        assert_eq!(control.push_frame((0, 0, 0)), None);
    }

    #[test]
    fn test_injected_failure_is_recorded() {
        let (mut camera, control) = virtual_camera(VirtualCameraConfig::default());
        let (session, _rx) = open(&mut camera);
        control.fail_next_submissions(1);

        let request = CaptureRequest::new(RequestTemplate::Preview, RequestTag::Preview);
        assert!(camera
            .submit_request(&session, &request, SubmitMode::Repeating)
            .is_err());
        assert!(camera
            .submit_request(&session, &request, SubmitMode::Repeating)
            .is_ok());
        assert_eq!(control.submitted_requests().len(), 2);
    }
}
