// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! Every command runs against the virtual camera:
//! - Showing stream sizes and the preview size picked for a surface
//! - Streaming preview frames through conversion and display
//! - Taking a photo through the focus and exposure sequence

use scanner_camera::app::camera_preview::{DisplayMetrics, PreviewSurfaceRenderer};
use scanner_camera::app::{FrameListener, ViewLifecycleController, frame_channel};
use scanner_camera::backends::camera::preview_size::{allowed_bounds, select_preview_size};
use scanner_camera::backends::camera::session::SessionOutputs;
use scanner_camera::backends::camera::{
    BackendError, CameraBackend, CameraFacing, CameraManager, ConvertedFrame, FrameSize,
};
use scanner_camera::backends::virtual_camera::{
    VirtualCamera, VirtualCameraConfig, VirtualCameraControl, virtual_camera,
};
use scanner_camera::config::Config;
use scanner_camera::constants::virtual_timing::{CAPTURE_TIMEOUT, FRAME_INTERVAL};
use scanner_camera::pipelines::photo::{ScreenRotation, save_frame_png};
use scanner_camera::storage::timestamped_photo_path;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};
use tracing::warn;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(value: &str) -> Result<FrameSize, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|e| format!("bad width '{width}': {e}"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|e| format!("bad height '{height}': {e}"))?;

    let size = FrameSize::new(width, height);
    if size.is_empty() {
        return Err(format!("size must be non-zero, got {size}"));
    }
    Ok(size)
}

pub fn parse_facing(value: &str) -> Result<CameraFacing, String> {
    match value.to_ascii_lowercase().as_str() {
        "back" => Ok(CameraFacing::Back),
        "front" => Ok(CameraFacing::Front),
        "external" => Ok(CameraFacing::External),
        other => Err(format!("unknown facing '{other}' (back, front, external)")),
    }
}

pub fn parse_rotation(value: &str) -> Result<ScreenRotation, String> {
    let degrees: u32 = value
        .parse()
        .map_err(|e| format!("bad rotation '{value}': {e}"))?;
    ScreenRotation::from_degrees(degrees)
        .ok_or_else(|| format!("rotation must be 0, 90, 180 or 270, got {degrees}"))
}

/// Load the config, falling back to defaults on any error
pub fn load_config(path: Option<&Path>, facing: Option<CameraFacing>) -> Config {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    if let Some(facing) = facing {
        config.camera_facing = facing;
    }
    config
}

fn camera_for(config: &Config) -> (VirtualCamera, VirtualCameraControl) {
    virtual_camera(VirtualCameraConfig {
        facing: config.camera_facing,
        ..Default::default()
    })
}

/// Bring a manager up the way a view would: permission, surface, then enabled
fn start_capture(
    manager: CameraManager<VirtualCamera>,
    surface: FrameSize,
) -> ViewLifecycleController<CameraManager<VirtualCamera>> {
    let controller = ViewLifecycleController::new(manager);
    controller.set_permission();
    controller.surface_changed(surface);
    controller.set_enabled(true);
    controller
}

/// Wait until the worker has opened the camera and the preview is repeating
fn wait_for_streaming(control: &VirtualCameraControl) -> CliResult {
    let start = Instant::now();
    while !control.is_streaming() {
        if start.elapsed() > CAPTURE_TIMEOUT {
            return Err("camera did not start streaming".into());
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    Ok(())
}

/// Show stream sizes and the preview size a surface would get
pub fn show_sizes(config: &Config, surface: FrameSize) -> CliResult {
    let (camera, _control) = camera_for(config);
    let settings = config.session_settings();
    let characteristics = camera.query_characteristics(&settings.selector)?;

    println!("Camera: {} ({})", characteristics.id, characteristics.facing);
    println!("Sensor orientation: {}°", characteristics.sensor_orientation);
    println!();

    let list = |sizes: &[FrameSize]| {
        sizes
            .iter()
            .map(FrameSize::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("Preview sizes: {}", list(&characteristics.preview_sizes));
    println!("JPEG sizes:    {}", list(&characteristics.jpeg_sizes));
    println!();

    let bounds = if characteristics.swaps_dimensions() {
        surface.transposed()
    } else {
        surface
    };
    let allowed = allowed_bounds(bounds, settings.max_preview_size);
    println!("Surface {surface}: preview bounded by {allowed}");

    match select_preview_size(
        &characteristics.preview_sizes,
        bounds,
        settings.max_preview_size,
    ) {
        Some(size) => println!("Selected preview: {size}"),
        None => println!("Selected preview: none"),
    }
    if let Some(still) = characteristics.largest_jpeg_size() {
        println!("Still size:       {still}");
    }

    Ok(())
}

/// Counts frames as they pass through
#[derive(Default)]
struct FrameCounter {
    processed: AtomicU64,
}

impl FrameListener for FrameCounter {
    fn on_frame_ready(&self, frame: ConvertedFrame) -> ConvertedFrame {
        self.processed.fetch_add(1, Ordering::Relaxed);
        frame
    }
}

/// Push preview frames and report what reached the display
pub fn run_preview(
    config: &Config,
    frames: u32,
    surface: FrameSize,
    png: Option<PathBuf>,
    fps: bool,
) -> CliResult {
    let (camera, control) = camera_for(config);
    let counter = Arc::new(FrameCounter::default());
    let (display, mut receiver) = frame_channel();

    let mut settings = config.session_settings();
    settings.fps_meter |= fps;
    let outputs = SessionOutputs {
        listener: counter.clone(),
        surface: Arc::new(display),
    };

    let controller = start_capture(CameraManager::new(camera, settings, outputs), surface);
    wait_for_streaming(&control)?;
    if let Some(size) = control.preview_size() {
        println!("Streaming {size} for surface {surface}");
    }

    let mut pushed = 0u32;
    let mut displayed = 0u32;
    let mut last = None;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        for i in 0..frames {
            // Sweep luma so consecutive frames differ
            let y = 16 + (i % 220) as u8;
            if control.push_frame((y, 128, 128)).is_some() {
                pushed += 1;
            }
            tokio::time::sleep(FRAME_INTERVAL).await;

            if let Some(frame) = receiver.try_latest() {
                displayed += 1;
                last = Some(frame);
            }
        }
    });

    // Stops the session and joins the worker
    controller.into_host();

    println!(
        "Pushed {pushed}, processed {}, displayed {displayed}",
        counter.processed.load(Ordering::Relaxed)
    );

    if let Some(frame) = &last {
        let mut renderer = PreviewSurfaceRenderer::new(
            DisplayMetrics::new(surface.width, surface.height),
            config.camera_facing,
        );
        renderer.on_surface_changed(surface);
        let rect = renderer.fitted_rect(frame.size());
        let (x, y) = renderer.transform().map_point(0.0, 0.0);
        println!(
            "Last frame {} drawn at ({}, {}) {}x{}, surface origin maps to ({x:.0}, {y:.0})",
            frame.size(),
            rect.left,
            rect.top,
            rect.width(),
            rect.height()
        );
    }

    if let Some(path) = png {
        let frame = last.ok_or("no frame reached the display")?;
        save_frame_png(&frame, &path)?;
        println!("Last frame saved: {}", path.display());
    }

    Ok(())
}

/// Reports the capture outcome back to the command
struct PhotoListener {
    outcome: mpsc::Sender<Result<PathBuf, String>>,
}

impl FrameListener for PhotoListener {
    fn on_still_capture_complete(&self, path: &Path) {
        let _ = self.outcome.send(Ok(path.to_path_buf()));
    }

    fn on_still_capture_failed(&self, path: &Path, reason: &str) {
        let _ = self
            .outcome
            .send(Err(format!("capture to {} failed: {reason}", path.display())));
    }

    fn on_camera_error(&self, error: &BackendError) {
        let _ = self.outcome.send(Err(error.to_string()));
    }
}

/// Take a photo through the full focus and exposure sequence
pub fn take_photo(config: &Config, output: Option<PathBuf>, rotation: ScreenRotation) -> CliResult {
    let path = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            path
        }
        None => timestamped_photo_path(&config.photo_dir())?,
    };

    let (camera, control) = camera_for(config);
    let (outcome, outcomes) = mpsc::channel();
    let (display, _receiver) = frame_channel();
    let outputs = SessionOutputs {
        listener: Arc::new(PhotoListener { outcome }),
        surface: Arc::new(display),
    };

    let surface = FrameSize::new(
        scanner_camera::constants::cli_defaults::SURFACE_WIDTH,
        scanner_camera::constants::cli_defaults::SURFACE_HEIGHT,
    );
    let controller = start_capture(
        CameraManager::new(camera, config.session_settings(), outputs),
        surface,
    );
    wait_for_streaming(&control)?;

    println!("Capturing...");
    controller.with_host(|manager| manager.take_picture(path.clone(), rotation))?;
    let result = outcomes.recv_timeout(CAPTURE_TIMEOUT);
    controller.into_host();

    let saved = result.map_err(|_| "timed out waiting for the photo")??;
    println!("Photo saved: {}", saved.display());
    Ok(())
}
