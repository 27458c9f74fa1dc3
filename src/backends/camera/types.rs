// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Instant;

/// Discrete frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel count, widened so large sensor sizes never overflow
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same size with width and height exchanged
    pub fn transposed(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which way the lens points relative to the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
    External,
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Back => write!(f, "back"),
            CameraFacing::Front => write!(f, "front"),
            CameraFacing::External => write!(f, "external"),
        }
    }
}

/// Chooses which physical camera a backend opens
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CameraSelector {
    pub facing: CameraFacing,
}

impl CameraSelector {
    pub fn facing(facing: CameraFacing) -> Self {
        Self { facing }
    }
}

/// Static properties of a camera, queried before a session is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraCharacteristics {
    /// Backend-specific camera identifier
    pub id: String,
    pub facing: CameraFacing,
    /// Clockwise angle the sensor image must be rotated to appear upright
    pub sensor_orientation: u32,
    /// Sizes the YUV 4:2:0 preview stream can produce, in backend order
    pub preview_sizes: Vec<FrameSize>,
    /// Sizes the JPEG still stream can produce
    pub jpeg_sizes: Vec<FrameSize>,
}

impl CameraCharacteristics {
    /// Largest JPEG size by area, used for still captures
    pub fn largest_jpeg_size(&self) -> Option<FrameSize> {
        self.jpeg_sizes.iter().copied().max_by_key(FrameSize::area)
    }

    /// Check if the sensor mounting swaps width and height relative to the display
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self.sensor_orientation % 360, 90 | 270)
    }
}

/// Output streams a session is configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub preview: FrameSize,
    pub still: FrameSize,
}

/// Stream a request targets or an image is acquired from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// YUV 4:2:0 frames for display and analysis
    Preview,
    /// JPEG images for still capture
    Still,
}

/// Pixel layout of a sensor image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Flexible YUV 4:2:0: one luma plane plus two chroma planes, each with its
    /// own row and pixel stride. Chroma may be planar or interleaved.
    Yuv420,
    /// Compressed JPEG bytes in a single plane
    Jpeg,
}

/// One plane of a [`RawFrame`]: a borrowed byte window plus its strides
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    /// Bytes between the starts of consecutive rows
    pub row_stride: usize,
    /// Bytes between horizontally adjacent samples
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    /// Address of the first byte, used to order chroma windows that share memory
    pub fn start_address(&self) -> usize {
        self.data.as_ptr() as usize
    }
}

/// Borrowed view over sensor memory, valid only while its [`SensorImage`] lives
#[derive(Debug, Clone)]
pub struct RawFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub planes: Vec<Plane<'a>>,
}

/// Location of one plane inside a [`SensorImage`] buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneLayout {
    pub range: Range<usize>,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

/// An image handed out by the hardware
///
/// Owns the sensor buffer for the duration of one callback. Dropping it
/// releases the buffer back to the stream, so it must never be stored past
/// the handler that acquired it.
#[derive(Debug)]
pub struct SensorImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Monotonic sequence number assigned by the stream
    pub sequence: u64,
    pub captured_at: Instant,
    buffer: Box<[u8]>,
    planes: Vec<PlaneLayout>,
}

impl SensorImage {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
        buffer: Box<[u8]>,
        planes: Vec<PlaneLayout>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            sequence,
            captured_at: Instant::now(),
            buffer,
            planes,
        }
    }

    /// Borrow the image as plane views
    ///
    /// A plane whose range falls outside the buffer is exposed as an empty
    /// slice; the converter rejects it instead of reading out of bounds.
    pub fn frame(&self) -> RawFrame<'_> {
        let planes = self
            .planes
            .iter()
            .map(|layout| Plane {
                data: self.buffer.get(layout.range.clone()).unwrap_or(&[]),
                row_stride: layout.row_stride,
                pixel_stride: layout.pixel_stride,
            })
            .collect();

        RawFrame {
            width: self.width,
            height: self.height,
            format: self.format,
            planes,
        }
    }

    /// Bytes of the first plane (the whole JPEG for still images)
    pub fn first_plane(&self) -> &[u8] {
        self.planes
            .first()
            .and_then(|layout| self.buffer.get(layout.range.clone()))
            .unwrap_or(&[])
    }
}

/// Packed RGBA frame produced by the converter
///
/// Four bytes per pixel, rows tightly packed, alpha always 255.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConvertedFrame {
    pub width: u32,
    pub height: u32,
    /// Sequence number of the sensor image this frame came from
    pub sequence: u64,
    pub data: Vec<u8>,
}

impl ConvertedFrame {
    /// Zero-sized frame, returned when a sensor image cannot be converted
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// View the packed bytes as RGBA pixels
    ///
    /// A buffer whose length is not a whole number of pixels yields no pixels.
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::try_cast_slice(self.data.as_slice()).unwrap_or(&[])
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels()
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Autofocus state reported in capture results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfState {
    Inactive,
    PassiveScan,
    PassiveFocused,
    ActiveScan,
    FocusedLocked,
    NotFocusedLocked,
    PassiveUnfocused,
}

impl AfState {
    /// Focus has settled after an AF trigger, successfully or not
    pub fn is_locked(&self) -> bool {
        matches!(self, AfState::FocusedLocked | AfState::NotFocusedLocked)
    }
}

/// Auto exposure state reported in capture results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeState {
    Inactive,
    Searching,
    Converged,
    Locked,
    FlashRequired,
    Precapture,
}

/// Request template a capture request was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTemplate {
    Preview,
    StillCapture,
}

/// Identifies which part of the capture protocol produced a request,
/// echoed back in the matching [`CaptureResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTag {
    /// Repeating preview stream
    Preview,
    /// One-shot AF/AE trigger built from the preview request
    Trigger,
    /// Still capture into the JPEG stream
    Still,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfMode {
    Off,
    Auto,
    #[default]
    ContinuousPicture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AeMode {
    Off,
    On,
    #[default]
    OnAutoFlash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfTrigger {
    #[default]
    Idle,
    Start,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AePrecaptureTrigger {
    #[default]
    Idle,
    Start,
}

/// How a request is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Captured once
    Single,
    /// Replaces the repeating request and is captured for every frame
    Repeating,
}

/// Settings for one capture, built and mutated on the background context only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub targets: Vec<StreamKind>,
    pub tag: RequestTag,
    pub af_mode: AfMode,
    pub ae_mode: AeMode,
    pub af_trigger: AfTrigger,
    pub ae_precapture_trigger: AePrecaptureTrigger,
    /// Clockwise rotation written into the JPEG, still captures only
    pub jpeg_orientation: Option<u32>,
}

impl CaptureRequest {
    pub fn new(template: RequestTemplate, tag: RequestTag) -> Self {
        Self {
            template,
            targets: Vec::new(),
            tag,
            af_mode: AfMode::default(),
            ae_mode: AeMode::default(),
            af_trigger: AfTrigger::default(),
            ae_precapture_trigger: AePrecaptureTrigger::default(),
            jpeg_orientation: None,
        }
    }

    pub fn with_target(mut self, stream: StreamKind) -> Self {
        if !self.targets.contains(&stream) {
            self.targets.push(stream);
        }
        self
    }

    /// Copy of this request carrying a different tag
    pub fn tagged(&self, tag: RequestTag) -> Self {
        Self {
            tag,
            ..self.clone()
        }
    }
}

/// Whether a result carries every metadata field or only some of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Partial,
    Completed,
}

/// Metadata the hardware reports for a submitted request
///
/// AF and AE states are optional: some devices never populate them, which
/// the capture state machine treats as "no constraint".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureResult {
    pub tag: RequestTag,
    pub kind: ResultKind,
    pub af_state: Option<AfState>,
    pub ae_state: Option<AeState>,
}

impl CaptureResult {
    pub fn completed(tag: RequestTag, af_state: Option<AfState>, ae_state: Option<AeState>) -> Self {
        Self {
            tag,
            kind: ResultKind::Completed,
            af_state,
            ae_state,
        }
    }

    pub fn partial(tag: RequestTag, af_state: Option<AfState>, ae_state: Option<AeState>) -> Self {
        Self {
            tag,
            kind: ResultKind::Partial,
            af_state,
            ae_state,
        }
    }

    /// The final result of a still capture request
    pub fn is_still_completion(&self) -> bool {
        self.tag == RequestTag::Still && self.kind == ResultKind::Completed
    }
}

/// Handle to an open capture session
///
/// Exclusively owned by the session worker that opened it; closing it
/// consumes the handle.
#[derive(Debug)]
pub struct CaptureSession {
    pub id: u64,
    pub characteristics: CameraCharacteristics,
    pub streams: StreamConfig,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Permission to use the camera is missing or was revoked
    #[error("Camera access denied: {0}")]
    AccessDenied(String),
    /// Camera is busy, missing or failed to open
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// The requested camera or stream configuration is not supported
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),
    /// Operation needs an open session
    #[error("No open capture session")]
    NotOpen,
    /// The hardware rejected a capture request
    #[error("Capture request rejected: {0}")]
    SubmissionFailed(String),
    /// The device went away while a session was open
    #[error("Camera disconnected")]
    Disconnected,
}
