// SPDX-License-Identifier: GPL-3.0-only

//! Photo persistence
//!
//! Still captures are stored exactly as the sensor's JPEG encoder produced
//! them: the bytes of the JPEG plane are copied to disk verbatim, never
//! decoded or re-encoded. Converted preview frames can be dumped as PNG for
//! inspection.

use crate::backends::camera::types::{ConvertedFrame, PixelFormat, SensorImage};
use crate::errors::PhotoError;
use image::{ImageFormat, RgbaImage};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Write the JPEG plane of a still image to `path`
///
/// Takes the image by value so its sensor buffer is released whether or not
/// the write succeeds. A failed write may leave a truncated file behind.
///
/// Returns the number of bytes written.
pub fn save_jpeg(image: SensorImage, path: &Path) -> Result<u64, PhotoError> {
    if image.format != PixelFormat::Jpeg {
        return Err(PhotoError::NotJpeg(format!("{:?}", image.format)));
    }

    let bytes = image.first_plane();
    debug!(
        path = %path.display(),
        size = bytes.len(),
        sequence = image.sequence,
        "Writing still image"
    );

    let save_failed = |source| PhotoError::SaveFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(save_failed)?;
    file.write_all(bytes).map_err(save_failed)?;
    file.flush().map_err(save_failed)?;

    info!(path = %path.display(), bytes = bytes.len(), "Photo saved");
    Ok(bytes.len() as u64)
}

/// Dump a converted RGBA frame as PNG
pub fn save_frame_png(frame: &ConvertedFrame, path: &Path) -> Result<(), PhotoError> {
    let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or(PhotoError::FrameSizeMismatch {
            width: frame.width,
            height: frame.height,
            len: frame.data.len(),
        })?;

    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| PhotoError::SaveFailed {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    debug!(path = %path.display(), width = frame.width, height = frame.height, "Frame saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PlaneLayout;

    fn jpeg_image(bytes: &[u8]) -> SensorImage {
        SensorImage::new(
            4,
            4,
            PixelFormat::Jpeg,
            7,
            bytes.to_vec().into_boxed_slice(),
            vec![PlaneLayout {
                range: 0..bytes.len(),
                row_stride: 0,
                pixel_stride: 0,
            }],
        )
    }

    #[test]
    fn test_jpeg_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        let payload = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x12, 0x34, 0xFF, 0xD9];

        let written = save_jpeg(jpeg_image(&payload), &path).unwrap();

        assert_eq!(written, payload.len() as u64);
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("scan.jpg");

        let result = save_jpeg(jpeg_image(&[0xFF, 0xD8]), &path);

        assert!(matches!(result, Err(PhotoError::SaveFailed { .. })));
    }

    #[test]
    fn test_yuv_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let image = SensorImage::new(2, 2, PixelFormat::Yuv420, 0, vec![0; 6].into(), vec![]);

        let result = save_jpeg(image, &dir.path().join("scan.jpg"));

        assert!(matches!(result, Err(PhotoError::NotJpeg(_))));
        assert!(!dir.path().join("scan.jpg").exists());
    }

    #[test]
    fn test_frame_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = ConvertedFrame {
            width: 2,
            height: 1,
            sequence: 0,
            data: vec![10, 20, 30, 255, 40, 50, 60, 255],
        };

        save_frame_png(&frame, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.into_raw(), frame.data);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let frame = ConvertedFrame {
            width: 2,
            height: 2,
            sequence: 0,
            data: vec![0; 8],
        };

        let result = save_frame_png(&frame, &dir.path().join("frame.png"));

        assert!(matches!(
            result,
            Err(PhotoError::FrameSizeMismatch { len: 8, .. })
        ));
    }
}
