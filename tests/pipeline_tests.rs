// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests: lifecycle controller, camera manager, session worker
//! and the virtual camera together

use scanner_camera::app::{
    FrameListener, FrameReceiver, RunState, ViewLifecycleController, frame_channel,
};
use scanner_camera::backends::camera::session::{SessionOutputs, SessionSettings};
use scanner_camera::backends::camera::{
    AeState, AePrecaptureTrigger, AfState, AfTrigger, BackendError, CameraManager,
    ConversionMode, ConvertedFrame, FrameSize, RequestTag, SubmitMode,
};
use scanner_camera::backends::virtual_camera::{
    ChromaPacking, Operation, VirtualCamera, VirtualCameraConfig, VirtualCameraControl,
    virtual_camera,
};
use scanner_camera::errors::AppError;
use scanner_camera::pipelines::photo::{CameraState, ScreenRotation, compute_orientation};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Frame(u64),
    Complete(PathBuf),
    Failed(PathBuf, String),
    CameraError(BackendError),
}

/// Forwards every callback to the test thread
struct Recorder {
    events: mpsc::Sender<Event>,
    /// When set, each frame blocks the worker until the test releases it
    hold_frames: Option<Mutex<mpsc::Receiver<()>>>,
}

impl FrameListener for Recorder {
    fn on_frame_ready(&self, frame: ConvertedFrame) -> ConvertedFrame {
        let _ = self.events.send(Event::Frame(frame.sequence));
        if let Some(release) = &self.hold_frames {
            let _ = release.lock().unwrap().recv();
        }
        frame
    }

    fn on_still_capture_complete(&self, path: &Path) {
        let _ = self.events.send(Event::Complete(path.to_path_buf()));
    }

    fn on_still_capture_failed(&self, path: &Path, reason: &str) {
        let _ = self
            .events
            .send(Event::Failed(path.to_path_buf(), reason.to_string()));
    }

    fn on_camera_error(&self, error: &BackendError) {
        let _ = self.events.send(Event::CameraError(error.clone()));
    }
}

struct Harness {
    controller: ViewLifecycleController<CameraManager<VirtualCamera>>,
    control: VirtualCameraControl,
    events: mpsc::Receiver<Event>,
    frames: FrameReceiver,
    release: Option<mpsc::Sender<()>>,
    dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::build(VirtualCameraConfig::default(), SessionSettings::default(), false)
    }

    fn build(camera: VirtualCameraConfig, settings: SessionSettings, hold_frames: bool) -> Self {
        let (camera, control) = virtual_camera(camera);
        let (events_tx, events) = mpsc::channel();
        let (release, hold) = if hold_frames {
            let (tx, rx) = mpsc::channel();
            (Some(tx), Some(Mutex::new(rx)))
        } else {
            (None, None)
        };

        let (surface, frames) = frame_channel();
        let outputs = SessionOutputs {
            listener: Arc::new(Recorder {
                events: events_tx,
                hold_frames: hold,
            }),
            surface: Arc::new(surface),
        };

        Self {
            controller: ViewLifecycleController::new(CameraManager::new(
                camera, settings, outputs,
            )),
            control,
            events,
            frames,
            release,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Permission, a 640x480 surface, then enabled; waits for the preview
    fn start(&self) {
        self.controller.set_permission();
        self.controller.surface_changed(FrameSize::new(640, 480));
        self.controller.set_enabled(true);
        assert!(wait_until(|| self.control.is_streaming()), "preview never started");
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn take_picture(&self, path: &Path, rotation: ScreenRotation) {
        self.controller
            .with_host(|manager| manager.take_picture(path, rotation))
            .unwrap();
    }

    fn camera_state(&self) -> CameraState {
        self.controller.with_host(|manager| manager.camera_state())
    }

    fn next_event(&self) -> Event {
        self.events.recv_timeout(WAIT).expect("no listener callback")
    }

    /// Next event that is not a preview frame
    fn next_outcome(&self) -> Event {
        loop {
            match self.next_event() {
                Event::Frame(_) => continue,
                other => return other,
            }
        }
    }

    fn release_frame(&self) {
        if let Some(release) = &self.release {
            release.send(()).unwrap();
        }
    }

    fn stop(&self) {
        self.controller.set_enabled(false);
    }
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < WAIT {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn wait_for_frame(frames: &mut FrameReceiver) -> Arc<ConvertedFrame> {
    let start = Instant::now();
    loop {
        if let Some(frame) = frames.try_latest() {
            return frame;
        }
        assert!(start.elapsed() < WAIT, "no frame reached the display");
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// (tag, af trigger, ae trigger, mode) of every submission
fn submissions(
    control: &VirtualCameraControl,
) -> Vec<(RequestTag, AfTrigger, AePrecaptureTrigger, SubmitMode)> {
    control
        .submitted_requests()
        .into_iter()
        .map(|(request, mode)| {
            (
                request.tag,
                request.af_trigger,
                request.ae_precapture_trigger,
                mode,
            )
        })
        .collect()
}

#[test]
fn test_preview_frame_reaches_listener_and_display() {
    let mut harness = Harness::new();
    harness.start();

    // Sensor mounted at 90°: a portrait 640x480 surface bounds previews to 480x640
    assert_eq!(harness.control.preview_size(), Some(FrameSize::new(320, 240)));

    let sequence = harness.control.push_frame((128, 128, 128)).unwrap();
    assert_eq!(harness.next_event(), Event::Frame(sequence));

    let frame = wait_for_frame(&mut harness.frames);
    assert_eq!(frame.sequence, sequence);
    assert_eq!(frame.size(), FrameSize::new(320, 240));
    assert_eq!(frame.pixel(0, 0), Some([130, 130, 130, 255]));
    assert_eq!(frame.pixel(319, 239), Some([130, 130, 130, 255]));
}

#[test]
fn test_interleaved_padded_frames_convert() {
    let camera = VirtualCameraConfig {
        packing: ChromaPacking::SemiPlanarVu,
        row_padding: 16,
        ..Default::default()
    };
    let mut harness = Harness::build(camera, SessionSettings::default(), false);
    harness.start();

    harness.control.push_frame((128, 128, 128)).unwrap();
    let frame = wait_for_frame(&mut harness.frames);
    assert_eq!(frame.pixels().len(), 320 * 240);
    assert!(frame.pixels().iter().all(|p| *p == [130, 130, 130, 255]));
}

#[test]
fn test_gray_mode_replicates_luma() {
    let settings = SessionSettings {
        conversion_mode: ConversionMode::Gray,
        ..Default::default()
    };
    let mut harness = Harness::build(VirtualCameraConfig::default(), settings, false);
    harness.start();

    harness.control.push_frame((100, 30, 200)).unwrap();
    let frame = wait_for_frame(&mut harness.frames);
    assert_eq!(frame.pixel(10, 10), Some([100, 100, 100, 255]));
}

#[test]
fn test_latest_frame_wins_while_listener_is_busy() {
    let harness = Harness::build(
        VirtualCameraConfig::default(),
        SessionSettings::default(),
        true,
    );
    harness.start();

    let first = harness.control.push_frame((20, 128, 128)).unwrap();
    assert_eq!(harness.next_event(), Event::Frame(first));

    // The worker is blocked inside the listener; these queue up behind it
    let _second = harness.control.push_frame((40, 128, 128)).unwrap();
    let third = harness.control.push_frame((60, 128, 128)).unwrap();

    harness.release_frame();
    assert_eq!(harness.next_event(), Event::Frame(third));
    harness.release_frame();

    assert!(harness.events.recv_timeout(QUIET).is_err());
    harness.stop();
}

#[test]
fn test_capture_with_precapture_writes_still() {
    let harness = Harness::new();
    harness.start();

    // Focus scans, then locks with exposure still searching
    harness.control.script_burst(vec![
        (Some(AfState::ActiveScan), None),
        (Some(AfState::FocusedLocked), Some(AeState::Searching)),
    ]);

    let path = harness.path("scan.jpg");
    harness.take_picture(&path, ScreenRotation::Rotation90);
    assert_eq!(harness.next_outcome(), Event::Complete(path.clone()));

    let written = std::fs::read(&path).unwrap();
    assert_eq!(Some(written), harness.control.last_still_jpeg());

    assert!(wait_until(|| harness.camera_state() == CameraState::Preview
        && harness.control.is_streaming()));

    use AePrecaptureTrigger as Ae;
    use AfTrigger as Af;
    assert_eq!(
        submissions(&harness.control),
        vec![
            (RequestTag::Preview, Af::Idle, Ae::Idle, SubmitMode::Repeating),
            (RequestTag::Trigger, Af::Start, Ae::Idle, SubmitMode::Single),
            (RequestTag::Trigger, Af::Idle, Ae::Start, SubmitMode::Single),
            (RequestTag::Still, Af::Idle, Ae::Idle, SubmitMode::Single),
            (RequestTag::Trigger, Af::Cancel, Ae::Idle, SubmitMode::Single),
            (RequestTag::Preview, Af::Idle, Ae::Idle, SubmitMode::Repeating),
        ]
    );

    let still = harness
        .control
        .submitted_requests()
        .into_iter()
        .find(|(request, _)| request.tag == RequestTag::Still)
        .map(|(request, _)| request)
        .unwrap();
    assert_eq!(
        still.jpeg_orientation,
        Some(compute_orientation(ScreenRotation::Rotation90, 90))
    );

    // Preview stops and in-flight captures are aborted right before the still
    let operations = harness.control.operations();
    let still_at = operations
        .iter()
        .position(|op| matches!(op, Operation::Submit(r, _) if r.tag == RequestTag::Still))
        .unwrap();
    assert_eq!(operations[still_at - 2], Operation::StopRepeating);
    assert_eq!(operations[still_at - 1], Operation::AbortCaptures);
}

#[test]
fn test_missing_metering_states_do_not_block() {
    let harness = Harness::new();
    harness.start();
    harness.control.script_burst(vec![(None, None)]);

    let path = harness.path("plain.jpg");
    harness.take_picture(&path, ScreenRotation::Rotation0);
    assert_eq!(harness.next_outcome(), Event::Complete(path.clone()));
    assert!(path.exists());
}

#[test]
fn test_failed_submission_holds_state_then_retry_succeeds() {
    let harness = Harness::new();
    harness.start();

    harness
        .control
        .script_burst(vec![(Some(AfState::FocusedLocked), Some(AeState::Searching))]);
    // The focus trigger goes through, the precapture trigger is rejected
    harness.control.fail_submissions_after(1, 1);

    let failed = harness.path("failed.jpg");
    harness.take_picture(&failed, ScreenRotation::Rotation0);
    match harness.next_outcome() {
        Event::Failed(path, _) => assert_eq!(path, failed),
        other => panic!("expected a failure, got {other:?}"),
    }
    assert_eq!(harness.camera_state(), CameraState::WaitingLock);
    assert!(!failed.exists());

    let retry = harness.path("retry.jpg");
    harness.take_picture(&retry, ScreenRotation::Rotation0);
    assert_eq!(harness.next_outcome(), Event::Complete(retry.clone()));
    assert!(retry.exists());
    assert!(wait_until(|| harness.camera_state() == CameraState::Preview));
}

#[test]
fn test_busy_capture_is_rejected() {
    let harness = Harness::new();
    harness.start();

    // Focus never settles
    harness
        .control
        .script_burst(vec![(Some(AfState::ActiveScan), Some(AeState::Searching))]);

    let first = harness.path("first.jpg");
    let second = harness.path("second.jpg");
    harness.take_picture(&first, ScreenRotation::Rotation0);
    harness.take_picture(&second, ScreenRotation::Rotation0);

    match harness.next_outcome() {
        Event::Failed(path, _) => assert_eq!(path, second),
        other => panic!("expected the second request to fail, got {other:?}"),
    }
    assert_eq!(harness.camera_state(), CameraState::WaitingLock);
    harness.stop();
}

#[test]
fn test_stop_abandons_capture_without_callbacks() {
    let harness = Harness::new();
    harness.start();
    harness
        .control
        .script_burst(vec![(Some(AfState::PassiveScan), None)]);

    let path = harness.path("abandoned.jpg");
    harness.take_picture(&path, ScreenRotation::Rotation0);
    assert!(wait_until(|| harness.camera_state() == CameraState::WaitingLock));

    harness.stop();
    assert_eq!(harness.controller.state(), RunState::Stopped);
    assert!(!harness.control.is_open());
    assert!(!harness.controller.with_host(|m| m.is_running()));

    // Nothing reaches the listener once stop has returned
    assert!(!harness.control.disconnect());
    assert_eq!(harness.control.push_frame((0, 0, 0)), None);
    assert!(harness.events.recv_timeout(QUIET).is_err());
    assert!(!path.exists());
    assert_eq!(harness.control.operations().last(), Some(&Operation::Close));
}

#[test]
fn test_access_denied_reports_camera_error() {
    let harness = Harness::new();
    harness.control.set_access_denied(true);

    harness.controller.set_permission();
    harness.controller.surface_changed(FrameSize::new(640, 480));
    harness.controller.set_enabled(true);

    assert!(matches!(
        harness.next_event(),
        Event::CameraError(BackendError::AccessDenied(_))
    ));
    // Open failed on the worker, but the view still asked for capture
    assert_eq!(harness.controller.state(), RunState::Started);
    assert!(!harness.control.is_open());
}

#[test]
fn test_disconnect_closes_session() {
    let harness = Harness::new();
    harness.start();

    assert!(harness.control.disconnect());
    assert_eq!(
        harness.next_event(),
        Event::CameraError(BackendError::Disconnected)
    );
    assert!(wait_until(|| !harness.control.is_open()));
}

#[test]
fn test_surface_change_reopens_with_new_size() {
    let harness = Harness::new();
    harness.start();
    assert_eq!(harness.control.preview_size(), Some(FrameSize::new(320, 240)));

    harness.controller.surface_changed(FrameSize::new(1080, 1920));
    assert!(wait_until(|| harness.control.is_streaming()));
    assert_eq!(harness.control.preview_size(), Some(FrameSize::new(1920, 1080)));

    let opens_and_closes: Vec<_> = harness
        .control
        .operations()
        .into_iter()
        .filter(|op| matches!(op, Operation::Open(_) | Operation::Close))
        .map(|op| matches!(op, Operation::Open(_)))
        .collect();
    assert_eq!(opens_and_closes, vec![true, false, true]);
}

#[test]
fn test_take_picture_needs_running_session() {
    let harness = Harness::new();
    let result = harness
        .controller
        .with_host(|manager| manager.take_picture(harness.path("x.jpg"), ScreenRotation::Rotation0));
    assert!(matches!(
        result,
        Err(AppError::Camera(BackendError::NotOpen))
    ));
}
