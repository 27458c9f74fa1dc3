// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │ ViewLifecycleController │  ← enabled / permission / surface
//! └────────────┬────────────┘
//!              │ start / stop / take picture
//!              ▼
//! ┌─────────────────────────┐
//! │      CameraManager      │  ← owns the backend between sessions
//! └────────────┬────────────┘
//!              │ CameraEvent messages
//!              ▼
//! ┌─────────────────────────┐
//! │  SessionWorker (serial) │  ← conversion, AF/AE sequencing, JPEG output
//! └────────────┬────────────┘
//!              │
//!              ▼
//! ┌─────────────────────────┐
//! │   CameraBackend trait   │  ← hardware or virtual camera
//! └─────────────────────────┘
//! ```
//!
//! Hardware callbacks never reach the worker directly: a backend reports them
//! through the [`session::EventSink`] it was handed when the session opened,
//! and the worker handles them one at a time on its own thread.

pub mod format_converters;
pub mod frame_loop;
pub mod manager;
pub mod preview_size;
pub mod session;
pub mod types;

pub use format_converters::{ConversionMode, FrameConverter};
pub use manager::CameraManager;
pub use session::{CameraEvent, EventSink};
pub use types::*;

/// Capability interface every camera backend implements
///
/// Calls are made only from the session worker thread, so implementations
/// need `Send` but not `Sync`. Asynchronous outcomes (frames, still images,
/// capture results, disconnects) go through the [`EventSink`] passed to
/// [`CameraBackend::open_session`].
pub trait CameraBackend: Send + 'static {
    // ===== Discovery =====

    /// Describe the first camera matching `selector`
    fn query_characteristics(&self, selector: &CameraSelector)
    -> BackendResult<CameraCharacteristics>;

    // ===== Lifecycle =====

    /// Open the camera and configure its preview and still streams
    ///
    /// # Errors
    /// * `AccessDenied` - permission missing or revoked
    /// * `DeviceUnavailable` - camera busy or failed to open
    /// * `Unsupported` - no matching camera or stream configuration
    fn open_session(
        &mut self,
        selector: &CameraSelector,
        streams: StreamConfig,
        events: EventSink,
    ) -> BackendResult<CaptureSession>;

    /// Release the device and its streams; drops the event sink
    fn close_session(&mut self, session: CaptureSession);

    // ===== Requests =====

    /// Submit a request once, or make it the repeating request
    ///
    /// Results come back as capture-result events tagged with the request's tag.
    fn submit_request(
        &mut self,
        session: &CaptureSession,
        request: &CaptureRequest,
        mode: SubmitMode,
    ) -> BackendResult<()>;

    /// Stop the repeating request
    fn stop_repeating(&mut self, session: &CaptureSession) -> BackendResult<()>;

    /// Discard every queued and in-flight capture
    fn abort_captures(&mut self, session: &CaptureSession) -> BackendResult<()>;

    // ===== Frames =====

    /// Take the newest buffered image of `stream`, releasing older ones
    fn acquire_latest_frame(
        &mut self,
        session: &CaptureSession,
        stream: StreamKind,
    ) -> Option<SensorImage>;
}
