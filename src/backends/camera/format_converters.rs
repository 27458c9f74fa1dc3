// SPDX-License-Identifier: GPL-3.0-only
//! YUV 4:2:0 sensor frame to packed RGBA conversion
//!
//! Sensor buffers arrive as one luma plane plus two chroma planes, each with
//! its own row stride. Chroma comes in two shapes:
//!
//! - **Interleaved** (chroma pixel stride 2): both chroma planes are windows
//!   into one `UVUV…` or `VUVU…` buffer, offset by one byte. Which one is U is
//!   decided from the window start addresses, not from the plane order.
//! - **Planar** (chroma pixel stride 1): three independent planes. Rows are
//!   packed into a contiguous I420 scratch buffer before conversion.
//!
//! Colour math uses the BT.601 fixed-point coefficients (studio-swing luma,
//! 20-bit precision) with nearest-neighbour chroma upsampling.

use super::types::{ConvertedFrame, PixelFormat, Plane, RawFrame};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

const SHIFT: i32 = 20;
const HALF: i32 = 1 << (SHIFT - 1);
const CY: i32 = 1_220_542;
const CUB: i32 = 2_116_026;
const CUG: i32 = -409_993;
const CVG: i32 = -852_492;
const CVR: i32 = 1_673_527;

/// Errors that make a sensor frame unconvertible
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("Unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),
    #[error("Expected 3 planes, got {0}")]
    MissingPlanes(usize),
    #[error("Unsupported pixel stride {pixel_stride} on plane {plane}")]
    UnsupportedPixelStride { plane: usize, pixel_stride: usize },
    #[error("Plane {plane} row stride {row_stride} is smaller than its row of {row_bytes} bytes")]
    StrideTooSmall {
        plane: usize,
        row_stride: usize,
        row_bytes: usize,
    },
    #[error("Plane {plane} strides overflow the address space")]
    StrideOverflow { plane: usize },
    #[error("Plane {plane} holds {actual} bytes, {required} required")]
    PlaneTooShort {
        plane: usize,
        required: usize,
        actual: usize,
    },
}

/// Byte order of interleaved chroma
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaLayout {
    /// Interleaved, U first (`UVUV…`)
    Nv12,
    /// Interleaved, V first (`VUVU…`)
    Nv21,
    /// Separate U and V planes
    I420,
}

/// What the converter packs into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Full colour YUV to RGBA
    #[default]
    Rgba,
    /// Luma only, replicated into R, G and B
    Gray,
}

/// Determine how the chroma planes of a YUV 4:2:0 frame are laid out
///
/// Interleaved chroma is classified by comparing where the two chroma windows
/// start in memory: if the second listed plane begins after the first the
/// shared buffer is read as NV12, otherwise as NV21. Plane order as reported
/// by the hardware is not trusted. This is a heuristic carried over from
/// devices that mislabel their planes, not a guarantee of the buffer format.
///
/// Luma must be tightly sampled and both chroma planes must report the same
/// pixel stride, either 1 or 2.
pub fn detect_chroma_layout(frame: &RawFrame<'_>) -> Result<ChromaLayout, ConversionError> {
    if frame.planes.len() < 3 {
        return Err(ConversionError::MissingPlanes(frame.planes.len()));
    }
    check_luma_stride(&frame.planes[0])?;

    let pixel_stride = frame.planes[1].pixel_stride;
    if frame.planes[2].pixel_stride != pixel_stride {
        return Err(ConversionError::UnsupportedPixelStride {
            plane: 2,
            pixel_stride: frame.planes[2].pixel_stride,
        });
    }

    match pixel_stride {
        1 => Ok(ChromaLayout::I420),
        2 => {
            let first = frame.planes[1].start_address();
            let second = frame.planes[2].start_address();
            if second > first {
                Ok(ChromaLayout::Nv12)
            } else {
                Ok(ChromaLayout::Nv21)
            }
        }
        other => Err(ConversionError::UnsupportedPixelStride {
            plane: 1,
            pixel_stride: other,
        }),
    }
}

fn check_luma_stride(luma: &Plane<'_>) -> Result<(), ConversionError> {
    match luma.pixel_stride {
        1 => Ok(()),
        other => Err(ConversionError::UnsupportedPixelStride {
            plane: 0,
            pixel_stride: other,
        }),
    }
}

/// Convert one YUV sample to an opaque RGBA pixel
#[inline]
pub fn yuv_to_rgba(y: u8, u: u8, v: u8) -> [u8; 4] {
    let y1 = (y as i32 - 16).max(0) * CY;
    let u = u as i32 - 128;
    let v = v as i32 - 128;

    let r = (y1 + HALF + CVR * v) >> SHIFT;
    let g = (y1 + HALF + CVG * v + CUG * u) >> SHIFT;
    let b = (y1 + HALF + CUB * u) >> SHIFT;

    [clamp_u8(r), clamp_u8(g), clamp_u8(b), 255]
}

#[inline]
fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Chroma dimensions for 4:2:0 subsampling, rounding odd sizes up
fn chroma_dimensions(width: usize, height: usize) -> (usize, usize) {
    (width.div_ceil(2), height.div_ceil(2))
}

/// Check a plane can be read as `rows` rows of `cols` samples
fn validate_plane(
    index: usize,
    plane: &Plane<'_>,
    cols: usize,
    rows: usize,
) -> Result<(), ConversionError> {
    let row_bytes = (cols - 1)
        .checked_mul(plane.pixel_stride)
        .and_then(|n| n.checked_add(1))
        .ok_or(ConversionError::StrideOverflow { plane: index })?;
    if plane.row_stride < row_bytes {
        return Err(ConversionError::StrideTooSmall {
            plane: index,
            row_stride: plane.row_stride,
            row_bytes,
        });
    }

    // The last row does not have to carry its padding
    let required = (rows - 1)
        .checked_mul(plane.row_stride)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or(ConversionError::StrideOverflow { plane: index })?;
    if plane.data.len() < required {
        return Err(ConversionError::PlaneTooShort {
            plane: index,
            required,
            actual: plane.data.len(),
        });
    }

    Ok(())
}

/// Append `rows` rows of `cols` bytes from a pixel-stride-1 plane
///
/// When the row stride equals the row width the whole plane is copied in one
/// operation; otherwise rows are copied one by one, skipping the padding.
fn append_plane(dst: &mut Vec<u8>, plane: &Plane<'_>, cols: usize, rows: usize) {
    if plane.row_stride == cols {
        dst.extend_from_slice(&plane.data[..cols * rows]);
        return;
    }

    for row in 0..rows {
        let start = row * plane.row_stride;
        dst.extend_from_slice(&plane.data[start..start + cols]);
    }
}

/// Converts sensor frames to packed RGBA
///
/// Holds a scratch buffer that is reused across frames for the planar path,
/// so steady-state conversion allocates only the output frame.
#[derive(Debug, Default)]
pub struct FrameConverter {
    mode: ConversionMode,
    scratch: Vec<u8>,
}

impl FrameConverter {
    pub fn new(mode: ConversionMode) -> Self {
        Self {
            mode,
            scratch: Vec::new(),
        }
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    /// Convert a frame, degrading to an empty frame on malformed input
    ///
    /// One bad frame must never halt the preview stream, so errors are logged
    /// and swallowed here. Use [`FrameConverter::try_convert`] to observe them.
    pub fn convert(&mut self, frame: &RawFrame<'_>, sequence: u64) -> ConvertedFrame {
        match self.try_convert(frame, sequence) {
            Ok(converted) => converted,
            Err(e) => {
                warn!(
                    error = %e,
                    width = frame.width,
                    height = frame.height,
                    sequence,
                    "Dropping unconvertible frame"
                );
                ConvertedFrame::empty(sequence)
            }
        }
    }

    /// Convert a frame, reporting why it could not be converted
    pub fn try_convert(
        &mut self,
        frame: &RawFrame<'_>,
        sequence: u64,
    ) -> Result<ConvertedFrame, ConversionError> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(ConvertedFrame::empty(sequence));
        }
        if frame.format != PixelFormat::Yuv420 {
            return Err(ConversionError::UnsupportedFormat(frame.format));
        }

        let width = frame.width as usize;
        let height = frame.height as usize;

        let data = match self.mode {
            ConversionMode::Gray => {
                let luma = frame
                    .planes
                    .first()
                    .ok_or(ConversionError::MissingPlanes(0))?;
                check_luma_stride(luma)?;
                validate_plane(0, luma, width, height)?;
                luma_to_rgba(luma, width, height)
            }
            ConversionMode::Rgba => {
                let layout = detect_chroma_layout(frame)?;
                trace!(?layout, width, height, sequence, "Converting frame");
                match layout {
                    ChromaLayout::Nv12 | ChromaLayout::Nv21 => {
                        self.convert_interleaved(frame, layout, width, height)?
                    }
                    ChromaLayout::I420 => self.convert_planar(frame, width, height)?,
                }
            }
        };

        Ok(ConvertedFrame {
            width: frame.width,
            height: frame.height,
            sequence,
            data,
        })
    }

    /// Single pass over luma and the interleaved chroma pairs
    fn convert_interleaved(
        &mut self,
        frame: &RawFrame<'_>,
        layout: ChromaLayout,
        width: usize,
        height: usize,
    ) -> Result<Vec<u8>, ConversionError> {
        let (chroma_w, chroma_h) = chroma_dimensions(width, height);
        let luma = &frame.planes[0];
        validate_plane(0, luma, width, height)?;
        validate_plane(1, &frame.planes[1], chroma_w, chroma_h)?;
        validate_plane(2, &frame.planes[2], chroma_w, chroma_h)?;

        // `lead` starts the shared buffer, `trail` is the same buffer one byte on.
        // Reading the second byte of each pair from `trail` keeps every access
        // inside a slice the hardware actually handed out.
        let (lead, trail) = match layout {
            ChromaLayout::Nv12 => (&frame.planes[1], &frame.planes[2]),
            _ => (&frame.planes[2], &frame.planes[1]),
        };

        let mut rgba = vec![0u8; width * height * 4];
        for (row, out_row) in rgba.chunks_exact_mut(width * 4).enumerate() {
            let luma_row = &luma.data[row * luma.row_stride..];
            let chroma_offset = (row / 2) * lead.row_stride;
            let lead_row = &lead.data[chroma_offset..];
            let trail_row = &trail.data[(row / 2) * trail.row_stride..];

            for (col, out) in out_row.chunks_exact_mut(4).enumerate() {
                let i = (col / 2) * lead.pixel_stride;
                let (u, v) = match layout {
                    ChromaLayout::Nv12 => (lead_row[i], trail_row[i]),
                    _ => (trail_row[i], lead_row[i]),
                };
                out.copy_from_slice(&yuv_to_rgba(luma_row[col], u, v));
            }
        }

        Ok(rgba)
    }

    /// Pack the three planes into contiguous I420, then convert
    fn convert_planar(
        &mut self,
        frame: &RawFrame<'_>,
        width: usize,
        height: usize,
    ) -> Result<Vec<u8>, ConversionError> {
        let (chroma_w, chroma_h) = chroma_dimensions(width, height);
        validate_plane(0, &frame.planes[0], width, height)?;
        validate_plane(1, &frame.planes[1], chroma_w, chroma_h)?;
        validate_plane(2, &frame.planes[2], chroma_w, chroma_h)?;

        self.scratch.clear();
        self.scratch.reserve(width * height + 2 * chroma_w * chroma_h);
        append_plane(&mut self.scratch, &frame.planes[0], width, height);
        append_plane(&mut self.scratch, &frame.planes[1], chroma_w, chroma_h);
        append_plane(&mut self.scratch, &frame.planes[2], chroma_w, chroma_h);

        Ok(i420_to_rgba(&self.scratch, width, height))
    }
}

/// Convert a contiguous I420 buffer (Y, then U, then V) to RGBA
///
/// The buffer must hold `width * height` luma bytes followed by two
/// `ceil(width / 2) * ceil(height / 2)` chroma planes.
pub fn i420_to_rgba(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let (chroma_w, chroma_h) = chroma_dimensions(width, height);
    let (y_plane, rest) = data.split_at(width * height);
    let (u_plane, v_plane) = rest.split_at(chroma_w * chroma_h);

    let mut rgba = vec![0u8; width * height * 4];
    for (row, out_row) in rgba.chunks_exact_mut(width * 4).enumerate() {
        let y_row = &y_plane[row * width..(row + 1) * width];
        let chroma_start = (row / 2) * chroma_w;
        let u_row = &u_plane[chroma_start..chroma_start + chroma_w];
        let v_row = &v_plane[chroma_start..chroma_start + chroma_w];

        for (col, out) in out_row.chunks_exact_mut(4).enumerate() {
            out.copy_from_slice(&yuv_to_rgba(y_row[col], u_row[col / 2], v_row[col / 2]));
        }
    }

    rgba
}

/// Replicate a strided luma plane into opaque grey RGBA
fn luma_to_rgba(luma: &Plane<'_>, width: usize, height: usize) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(width * height * 4);
    for row in 0..height {
        let start = row * luma.row_stride;
        for &y in &luma.data[start..start + width] {
            rgba.extend_from_slice(&[y, y, y, 255]);
        }
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Planar frame with the given padding after every row but the last
    struct PlanarBuffers {
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
        y_stride: usize,
        c_stride: usize,
    }

    fn planar(width: usize, height: usize, padding: usize, yuv: (u8, u8, u8)) -> PlanarBuffers {
        let (cw, ch) = chroma_dimensions(width, height);
        let y_stride = width + padding;
        let c_stride = cw + padding;
        let plane = |cols: usize, rows: usize, stride: usize, value: u8| {
            let mut buf = vec![0xEEu8; (rows - 1) * stride + cols];
            for row in 0..rows {
                buf[row * stride..row * stride + cols].fill(value);
            }
            buf
        };
        PlanarBuffers {
            y: plane(width, height, y_stride, yuv.0),
            u: plane(cw, ch, c_stride, yuv.1),
            v: plane(cw, ch, c_stride, yuv.2),
            y_stride,
            c_stride,
        }
    }

    fn planar_frame(width: u32, height: u32, buffers: &PlanarBuffers) -> RawFrame<'_> {
        RawFrame {
            width,
            height,
            format: PixelFormat::Yuv420,
            planes: vec![
                Plane::new(&buffers.y, buffers.y_stride, 1),
                Plane::new(&buffers.u, buffers.c_stride, 1),
                Plane::new(&buffers.v, buffers.c_stride, 1),
            ],
        }
    }

    #[test]
    fn test_yuv_to_rgba_reference_values() {
        assert_eq!(yuv_to_rgba(128, 128, 128), [130, 130, 130, 255]);
        assert_eq!(yuv_to_rgba(16, 128, 128), [0, 0, 0, 255]);
        assert_eq!(yuv_to_rgba(235, 128, 128), [255, 255, 255, 255]);
        // Strong V pushes red up and green down
        let reddish = yuv_to_rgba(81, 90, 240);
        assert!(reddish[0] > 200);
        assert!(reddish[1] < 60);
    }

    #[test]
    fn test_constant_planar_frame_converts_to_constant_rgba() {
        let buffers = planar(8, 6, 0, (128, 128, 128));
        let frame = planar_frame(8, 6, &buffers);

        let converted = FrameConverter::default().convert(&frame, 1);

        assert_eq!(converted.size().width, 8);
        assert_eq!(converted.pixels().len(), 48);
        assert!(converted.pixels().iter().all(|p| *p == [130, 130, 130, 255]));
    }

    #[test]
    fn test_planar_padding_is_stripped() {
        let padded = planar(6, 4, 10, (200, 60, 190));
        let tight = planar(6, 4, 0, (200, 60, 190));

        let mut converter = FrameConverter::default();
        let from_padded = converter.convert(&planar_frame(6, 4, &padded), 1);
        let from_tight = converter.convert(&planar_frame(6, 4, &tight), 2);

        assert!(!from_padded.is_empty());
        assert_eq!(from_padded.data, from_tight.data);
        let expected = yuv_to_rgba(200, 60, 190);
        assert!(from_padded.pixels().iter().all(|p| *p == expected));
    }

    #[test]
    fn test_planar_keeps_spatial_order() {
        // Luma gradient across columns, padded rows
        let width = 4;
        let height = 2;
        let stride = 7;
        let mut y = vec![0u8; stride + width];
        for row in 0..height {
            for col in 0..width {
                y[row * stride + col] = 16 + (col as u8) * 50 + (row as u8) * 10;
            }
        }
        let u = vec![128u8; 2];
        let v = vec![128u8; 2];
        let frame = RawFrame {
            width: width as u32,
            height: height as u32,
            format: PixelFormat::Yuv420,
            planes: vec![Plane::new(&y, stride, 1), Plane::new(&u, 2, 1), Plane::new(&v, 2, 1)],
        };

        let converted = FrameConverter::default().convert(&frame, 0);

        for row in 0..height as u32 {
            for col in 0..width as u32 {
                let luma = 16 + (col as u8) * 50 + (row as u8) * 10;
                assert_eq!(converted.pixel(col, row), Some(yuv_to_rgba(luma, 128, 128)));
            }
        }
    }

    #[test]
    fn test_interleaved_plane_order_detection() {
        let y = vec![0u8; 4];
        let shared = vec![0u8; 2];

        let nv12 = RawFrame {
            width: 2,
            height: 2,
            format: PixelFormat::Yuv420,
            planes: vec![
                Plane::new(&y, 2, 1),
                Plane::new(&shared[0..1], 2, 2),
                Plane::new(&shared[1..2], 2, 2),
            ],
        };
        assert_eq!(detect_chroma_layout(&nv12), Ok(ChromaLayout::Nv12));

        let nv21 = RawFrame {
            planes: vec![
                Plane::new(&y, 2, 1),
                Plane::new(&shared[1..2], 2, 2),
                Plane::new(&shared[0..1], 2, 2),
            ],
            ..nv12.clone()
        };
        assert_eq!(detect_chroma_layout(&nv21), Ok(ChromaLayout::Nv21));
    }

    #[test]
    fn test_interleaved_colour_follows_detected_order() {
        let (u, v) = (70u8, 210u8);
        let y = vec![120u8; 4 * 4];

        // UVUV buffer: plane 1 is the U window, plane 2 starts one byte later
        let uv: Vec<u8> = [u, v].repeat(4);
        let nv12 = RawFrame {
            width: 4,
            height: 4,
            format: PixelFormat::Yuv420,
            planes: vec![
                Plane::new(&y, 4, 1),
                Plane::new(&uv[0..uv.len() - 1], 4, 2),
                Plane::new(&uv[1..], 4, 2),
            ],
        };

        // VUVU buffer: the V window comes first in memory but is listed second
        let vu: Vec<u8> = [v, u].repeat(4);
        let nv21 = RawFrame {
            planes: vec![
                Plane::new(&y, 4, 1),
                Plane::new(&vu[1..], 4, 2),
                Plane::new(&vu[0..vu.len() - 1], 4, 2),
            ],
            ..nv12.clone()
        };

        let mut converter = FrameConverter::default();
        let expected = yuv_to_rgba(120, u, v);
        let a = converter.convert(&nv12, 0);
        let b = converter.convert(&nv21, 1);
        assert_eq!(a.pixels().len(), 16);
        assert!(a.pixels().iter().all(|p| *p == expected));
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_zero_sized_frame_is_empty() {
        let frame = RawFrame {
            width: 0,
            height: 480,
            format: PixelFormat::Yuv420,
            planes: vec![],
        };

        let converted = FrameConverter::default().try_convert(&frame, 9);
        assert_eq!(converted, Ok(ConvertedFrame::empty(9)));
    }

    #[test]
    fn test_truncated_plane_yields_empty_frame() {
        let buffers = planar(8, 8, 4, (100, 128, 128));
        let short_u = &buffers.u[..buffers.u.len() - 1];
        let frame = RawFrame {
            width: 8,
            height: 8,
            format: PixelFormat::Yuv420,
            planes: vec![
                Plane::new(&buffers.y, buffers.y_stride, 1),
                Plane::new(short_u, buffers.c_stride, 1),
                Plane::new(&buffers.v, buffers.c_stride, 1),
            ],
        };

        let mut converter = FrameConverter::default();
        assert!(matches!(
            converter.try_convert(&frame, 0),
            Err(ConversionError::PlaneTooShort { plane: 1, .. })
        ));
        assert!(converter.convert(&frame, 0).is_empty());
    }

    #[test]
    fn test_mismatched_chroma_pixel_strides_yield_empty_frame() {
        let y = vec![100u8; 8];
        let shared = vec![128u8; 4];
        let frame = RawFrame {
            width: 4,
            height: 2,
            format: PixelFormat::Yuv420,
            planes: vec![
                Plane::new(&y, 4, 1),
                Plane::new(&shared[0..3], 4, 2),
                Plane::new(&shared[2..4], 4, 1),
            ],
        };

        let mut converter = FrameConverter::default();
        assert_eq!(
            converter.try_convert(&frame, 0),
            Err(ConversionError::UnsupportedPixelStride {
                plane: 2,
                pixel_stride: 1
            })
        );
        assert!(converter.convert(&frame, 0).is_empty());
    }

    #[test]
    fn test_strided_luma_is_rejected() {
        let y = vec![100u8; 16];
        let c = vec![128u8; 2];
        let frame = RawFrame {
            width: 4,
            height: 2,
            format: PixelFormat::Yuv420,
            planes: vec![Plane::new(&y, 8, 2), Plane::new(&c, 2, 1), Plane::new(&c, 2, 1)],
        };

        assert!(FrameConverter::default().convert(&frame, 0).is_empty());
        assert!(
            FrameConverter::new(ConversionMode::Gray)
                .convert(&frame, 0)
                .is_empty()
        );
    }

    #[test]
    fn test_huge_row_stride_yields_empty_frame() {
        let buffers = planar(4, 4, 0, (100, 128, 128));
        let frame = RawFrame {
            width: 4,
            height: 4,
            format: PixelFormat::Yuv420,
            planes: vec![
                Plane::new(&buffers.y, usize::MAX / 2, 1),
                Plane::new(&buffers.u, buffers.c_stride, 1),
                Plane::new(&buffers.v, buffers.c_stride, 1),
            ],
        };

        let mut converter = FrameConverter::default();
        assert_eq!(
            converter.try_convert(&frame, 0),
            Err(ConversionError::StrideOverflow { plane: 0 })
        );
        assert!(converter.convert(&frame, 0).is_empty());
        assert!(
            FrameConverter::new(ConversionMode::Gray)
                .convert(&frame, 0)
                .is_empty()
        );
    }

    #[test]
    fn test_stride_smaller_than_row_is_rejected() {
        let y = vec![0u8; 64];
        let c = vec![128u8; 16];
        let frame = RawFrame {
            width: 8,
            height: 8,
            format: PixelFormat::Yuv420,
            planes: vec![Plane::new(&y, 4, 1), Plane::new(&c, 4, 1), Plane::new(&c, 4, 1)],
        };

        assert!(matches!(
            FrameConverter::default().try_convert(&frame, 0),
            Err(ConversionError::StrideTooSmall { plane: 0, .. })
        ));
    }

    #[test]
    fn test_gray_mode_uses_luma_only() {
        let buffers = planar(4, 2, 3, (90, 0, 255));
        let frame = planar_frame(4, 2, &buffers);

        let converted = FrameConverter::new(ConversionMode::Gray).convert(&frame, 0);

        assert!(converted.pixels().iter().all(|p| *p == [90, 90, 90, 255]));
    }

    #[test]
    fn test_i420_odd_dimensions() {
        // 3x3 luma needs 2x2 chroma
        let mut data = vec![50u8; 9];
        data.extend_from_slice(&[128; 4]);
        data.extend_from_slice(&[128; 4]);

        let rgba = i420_to_rgba(&data, 3, 3);
        assert_eq!(rgba.len(), 36);
        assert_eq!(&rgba[32..36], &yuv_to_rgba(50, 128, 128));
    }
}
