// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic sensor images

use crate::backends::camera::types::{FrameSize, PixelFormat, PlaneLayout, SensorImage};
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};

/// How chroma is laid out in synthesized YUV buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChromaPacking {
    /// Three separate planes, chroma pixel stride 1
    #[default]
    Planar,
    /// One interleaved `UVUV…` buffer (NV12)
    SemiPlanarUv,
    /// One interleaved `VUVU…` buffer (NV21)
    SemiPlanarVu,
}

/// Fill `rows` rows of `row_bytes` at `stride`, omitting the last row's padding
fn strided_len(rows: usize, row_bytes: usize, stride: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (rows - 1) * stride + row_bytes
    }
}

/// Build a constant-colour YUV 4:2:0 image
///
/// Every row but the last carries `padding` extra bytes, as hardware buffers
/// aligned to a stride do.
pub fn yuv_image(
    size: FrameSize,
    yuv: (u8, u8, u8),
    packing: ChromaPacking,
    padding: usize,
    sequence: u64,
) -> SensorImage {
    let width = size.width as usize;
    let height = size.height as usize;
    let chroma_w = width.div_ceil(2);
    let chroma_h = height.div_ceil(2);
    let (y, u, v) = yuv;

    let y_stride = width + padding;
    let y_len = strided_len(height, width, y_stride);
    let mut buffer = vec![0u8; y_len];
    for row in 0..height {
        buffer[row * y_stride..row * y_stride + width].fill(y);
    }

    let luma = PlaneLayout {
        range: 0..y_len,
        row_stride: y_stride,
        pixel_stride: 1,
    };

    let chroma = match packing {
        ChromaPacking::Planar => {
            let c_stride = chroma_w + padding;
            let c_len = strided_len(chroma_h, chroma_w, c_stride);
            let u_start = buffer.len();
            for value in [u, v] {
                let start = buffer.len();
                buffer.resize(start + c_len, 0);
                for row in 0..chroma_h {
                    let offset = start + row * c_stride;
                    buffer[offset..offset + chroma_w].fill(value);
                }
            }
            let v_start = u_start + c_len;
            [
                PlaneLayout {
                    range: u_start..u_start + c_len,
                    row_stride: c_stride,
                    pixel_stride: 1,
                },
                PlaneLayout {
                    range: v_start..v_start + c_len,
                    row_stride: c_stride,
                    pixel_stride: 1,
                },
            ]
        }
        ChromaPacking::SemiPlanarUv | ChromaPacking::SemiPlanarVu => {
            let (first, second) = match packing {
                ChromaPacking::SemiPlanarUv => (u, v),
                _ => (v, u),
            };
            let c_stride = 2 * chroma_w + padding;
            let c_len = strided_len(chroma_h, 2 * chroma_w, c_stride);
            let start = buffer.len();
            buffer.resize(start + c_len, 0);
            for row in 0..chroma_h {
                let offset = start + row * c_stride;
                for pair in buffer[offset..offset + 2 * chroma_w].chunks_exact_mut(2) {
                    pair[0] = first;
                    pair[1] = second;
                }
            }

            // Two windows onto the same bytes, one byte apart
            let leading = start..start + c_len.saturating_sub(1);
            let trailing = start + 1..start + c_len;
            let (u_range, v_range) = match packing {
                ChromaPacking::SemiPlanarUv => (leading, trailing),
                _ => (trailing, leading),
            };
            [
                PlaneLayout {
                    range: u_range,
                    row_stride: c_stride,
                    pixel_stride: 2,
                },
                PlaneLayout {
                    range: v_range,
                    row_stride: c_stride,
                    pixel_stride: 2,
                },
            ]
        }
    };

    let [u_plane, v_plane] = chroma;
    SensorImage::new(
        size.width,
        size.height,
        PixelFormat::Yuv420,
        sequence,
        buffer.into_boxed_slice(),
        vec![luma, u_plane, v_plane],
    )
}

/// Encode a constant-colour JPEG
pub fn jpeg_bytes(size: FrameSize, rgb: [u8; 3], quality: u8) -> image::ImageResult<Vec<u8>> {
    let pixels: Vec<u8> = rgb
        .iter()
        .copied()
        .cycle()
        .take(size.area() as usize * 3)
        .collect();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode(
        &pixels,
        size.width,
        size.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Wrap JPEG bytes as a single-plane still image
pub fn jpeg_image(size: FrameSize, bytes: Vec<u8>, sequence: u64) -> SensorImage {
    let len = bytes.len();
    SensorImage::new(
        size.width,
        size.height,
        PixelFormat::Jpeg,
        sequence,
        bytes.into_boxed_slice(),
        vec![PlaneLayout {
            range: 0..len,
            row_stride: 0,
            pixel_stride: 0,
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::format_converters::{
        ChromaLayout, FrameConverter, detect_chroma_layout, yuv_to_rgba,
    };

    #[test]
    fn test_packings_convert_to_same_colour() {
        let size = FrameSize::new(7, 5);
        let expected = yuv_to_rgba(150, 90, 170);
        let mut converter = FrameConverter::default();

        for (packing, layout) in [
            (ChromaPacking::Planar, ChromaLayout::I420),
            (ChromaPacking::SemiPlanarUv, ChromaLayout::Nv12),
            (ChromaPacking::SemiPlanarVu, ChromaLayout::Nv21),
        ] {
            for padding in [0, 3] {
                let image = yuv_image(size, (150, 90, 170), packing, padding, 1);
                let frame = image.frame();
                assert_eq!(detect_chroma_layout(&frame), Ok(layout));

                let converted = converter.try_convert(&frame, 1).unwrap();
                assert_eq!(converted.pixels().len(), 35, "{packing:?} padding {padding}");
                assert!(
                    converted.pixels().iter().all(|p| *p == expected),
                    "{packing:?} padding {padding}"
                );
            }
        }
    }

    #[test]
    fn test_jpeg_is_decodable() {
        let bytes = jpeg_bytes(FrameSize::new(16, 8), [200, 200, 200], 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }
}
