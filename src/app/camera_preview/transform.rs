// SPDX-License-Identifier: GPL-3.0-only

//! Display transform for preview frames
//!
//! Sensors are mounted sideways relative to a portrait screen, so the
//! converted frame is drawn through an affine transform that rotates it a
//! quarter turn about the surface centre, mirrors it for the front camera and
//! scales it to cover the display.

use crate::backends::camera::types::{CameraFacing, FrameSize};
use tracing::trace;

/// 2-D affine transform
///
/// Maps `(x, y)` to `(sx·x + kx·y + tx, ky·x + sy·y + ty)`. The `pre_*`
/// operations compose on the right, so the most recently added operation is
/// applied to points first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub sx: f32,
    pub kx: f32,
    pub tx: f32,
    pub ky: f32,
    pub sy: f32,
    pub ty: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        sx: 1.0,
        kx: 0.0,
        tx: 0.0,
        ky: 0.0,
        sy: 1.0,
        ty: 0.0,
    };

    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            tx: dx,
            ty: dy,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            sx,
            sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation by `degrees`, clockwise on a y-down surface
    ///
    /// Quarter turns use exact sines so the matrix holds no rounding noise.
    pub fn rotation(degrees: f32) -> Self {
        let (sin, cos) = match degrees.rem_euclid(360.0) {
            d if d == 0.0 => (0.0, 1.0),
            d if d == 90.0 => (1.0, 0.0),
            d if d == 180.0 => (0.0, -1.0),
            d if d == 270.0 => (-1.0, 0.0),
            d => d.to_radians().sin_cos(),
        };
        Self {
            sx: cos,
            kx: -sin,
            tx: 0.0,
            ky: sin,
            sy: cos,
            ty: 0.0,
        }
    }

    /// `self · other`: apply `other` first, then `self`
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            sx: self.sx * other.sx + self.kx * other.ky,
            kx: self.sx * other.kx + self.kx * other.sy,
            tx: self.sx * other.tx + self.kx * other.ty + self.tx,
            ky: self.ky * other.sx + self.sy * other.ky,
            sy: self.ky * other.kx + self.sy * other.sy,
            ty: self.ky * other.tx + self.sy * other.ty + self.ty,
        }
    }

    pub fn pre_translate(&mut self, dx: f32, dy: f32) {
        *self = self.concat(&Self::translation(dx, dy));
    }

    pub fn pre_rotate(&mut self, degrees: f32) {
        *self = self.concat(&Self::rotation(degrees));
    }

    /// Scale about the pivot `(px, py)`
    pub fn pre_scale_about(&mut self, sx: f32, sy: f32, px: f32, py: f32) {
        let about = Self::translation(px, py)
            .concat(&Self::scale(sx, sy))
            .concat(&Self::translation(-px, -py));
        *self = self.concat(&about);
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.sx * x + self.kx * y + self.tx,
            self.ky * x + self.sy * y + self.ty,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Physical size of the display the surface lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
}

impl DisplayMetrics {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }
}

/// Integer destination rectangle on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Compute the preview transform for a surface
///
/// Back (and external) cameras rotate 90°. The front camera is mirrored
/// horizontally about the surface centre and rotated 270°. Both are scaled
/// about the centre by `max(display_w / surface_h, display_h / surface_w)`.
/// A zero-sized surface yields the identity.
pub fn compute_transform(
    surface: FrameSize,
    display: DisplayMetrics,
    facing: CameraFacing,
) -> Transform2D {
    if surface.is_empty() {
        return Transform2D::IDENTITY;
    }

    let hw = surface.width as f32 / 2.0;
    let hh = surface.height as f32 / 2.0;
    let scale = (display.width_px as f32 / surface.height as f32)
        .max(display.height_px as f32 / surface.width as f32);
    let front = facing == CameraFacing::Front;

    let mut matrix = Transform2D::IDENTITY;
    if front {
        matrix.pre_scale_about(-1.0, 1.0, hw, hh);
    }
    matrix.pre_translate(hw, hh);
    matrix.pre_rotate(if front { 270.0 } else { 90.0 });
    matrix.pre_translate(-hw, -hh);
    matrix.pre_scale_about(scale, scale, hw, hh);
    matrix
}

/// Scale that fits a frame inside a surface without cropping
///
/// `min(surface_h / frame_h, surface_w / frame_w)`, or 1 for an empty frame.
pub fn fit_scale(surface: FrameSize, frame: FrameSize) -> f32 {
    if frame.is_empty() {
        return 1.0;
    }
    (surface.height as f32 / frame.height as f32).min(surface.width as f32 / frame.width as f32)
}

/// Where a frame drawn at `scale` lands, centred on the surface
pub fn destination_rect(surface: FrameSize, frame: FrameSize, scale: f32) -> Rect {
    let drawn_w = scale * frame.width as f32;
    let drawn_h = scale * frame.height as f32;
    let left = (surface.width as f32 - drawn_w) / 2.0;
    let top = (surface.height as f32 - drawn_h) / 2.0;

    Rect {
        left: left as i32,
        top: top as i32,
        right: (left + drawn_w) as i32,
        bottom: (top + drawn_h) as i32,
    }
}

/// Keeps the preview transform in step with the surface and active camera
///
/// Holds nothing but its inputs and the last matrix; every size change or
/// layout pass recomputes it.
#[derive(Debug, Clone)]
pub struct PreviewSurfaceRenderer {
    display: DisplayMetrics,
    facing: CameraFacing,
    surface: FrameSize,
    matrix: Transform2D,
}

impl PreviewSurfaceRenderer {
    pub fn new(display: DisplayMetrics, facing: CameraFacing) -> Self {
        Self {
            display,
            facing,
            surface: FrameSize::default(),
            matrix: Transform2D::IDENTITY,
        }
    }

    /// Surface was created or resized
    pub fn on_surface_changed(&mut self, surface: FrameSize) -> Transform2D {
        self.surface = surface;
        self.update_matrix()
    }

    /// Layout pass; recomputes with the current inputs
    pub fn on_layout(&mut self) -> Transform2D {
        self.update_matrix()
    }

    pub fn set_facing(&mut self, facing: CameraFacing) -> Transform2D {
        self.facing = facing;
        self.update_matrix()
    }

    pub fn transform(&self) -> Transform2D {
        self.matrix
    }

    pub fn surface(&self) -> FrameSize {
        self.surface
    }

    /// Destination of `frame` when it is scaled to fit the surface
    pub fn fitted_rect(&self, frame: FrameSize) -> Rect {
        destination_rect(self.surface, frame, fit_scale(self.surface, frame))
    }

    fn update_matrix(&mut self) -> Transform2D {
        self.matrix = compute_transform(self.surface, self.display, self.facing);
        trace!(surface = %self.surface, facing = %self.facing, matrix = ?self.matrix, "Preview transform updated");
        self.matrix
    }
}
