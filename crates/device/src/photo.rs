//! Photo artifact processing.
//!
//! The robot's camera is mounted rotated 90° counter-clockwise, so every
//! frame is corrected with a 90° clockwise rotation before use. Each capture
//! produces an immutable [`Photo`]: an archival JPEG on disk keyed by the
//! capture timestamp, and an inline base64 data URL for the reasoning
//! engine. The archived bytes and the inline bytes are identical.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use roverctl_core::error::DeviceError;
use roverctl_core::item::ImageRef;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const JPEG_QUALITY: u8 = 95;

/// An immutable snapshot from the robot's camera.
#[derive(Debug, Clone)]
pub struct Photo {
    /// Inline representation: `data:image/jpeg;base64,...`
    pub data_url: String,

    /// Where the archival copy was written.
    pub archived_path: PathBuf,
}

impl Photo {
    pub fn image_ref(&self) -> ImageRef {
        ImageRef::new(self.data_url.clone())
    }
}

/// Rotate, archive, and encode raw camera bytes.
///
/// The archive directory is created on demand; file names are
/// `robot_photo_<YYYYMMDD_HHMMSS>.jpg`.
pub fn process(raw: &[u8], photos_dir: &Path) -> Result<Photo, DeviceError> {
    let decoded = image::load_from_memory(raw)
        .map_err(|e| DeviceError::Camera(format!("could not decode camera frame: {e}")))?;

    // 90° clockwise mount correction
    let rotated = decoded.rotate90().to_rgb8();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut encoded), JPEG_QUALITY)
        .encode_image(&rotated)
        .map_err(|e| DeviceError::Camera(format!("could not re-encode frame: {e}")))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    std::fs::create_dir_all(photos_dir)
        .map_err(|e| DeviceError::Camera(format!("could not create photo dir: {e}")))?;
    let archived_path = photos_dir.join(format!("robot_photo_{timestamp}.jpg"));
    std::fs::write(&archived_path, &encoded)
        .map_err(|e| DeviceError::Camera(format!("could not archive photo: {e}")))?;
    tracing::info!(path = %archived_path.display(), bytes = encoded.len(), "Photo archived");

    let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(&encoded));

    Ok(Photo {
        data_url,
        archived_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A small valid JPEG, 4 wide by 2 tall.
    fn sample_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_fn(4, 2, |x, _| image::Rgb([(x * 60) as u8, 0, 128]));
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut buf), 100)
            .encode_image(&img)
            .unwrap();
        buf
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let photo = process(&sample_jpeg(), dir.path()).unwrap();

        let archived = std::fs::read(&photo.archived_path).unwrap();
        let img = image::load_from_memory(&archived).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 4);
    }

    #[test]
    fn archive_and_inline_copies_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let photo = process(&sample_jpeg(), dir.path()).unwrap();

        let archived = std::fs::read(&photo.archived_path).unwrap();
        let inline = photo
            .data_url
            .strip_prefix("data:image/jpeg;base64,")
            .expect("data URL prefix");
        let inline_bytes = BASE64.decode(inline).unwrap();
        assert_eq!(archived, inline_bytes);
    }

    #[test]
    fn archive_file_name_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let photo = process(&sample_jpeg(), dir.path()).unwrap();

        let name = photo.archived_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("robot_photo_"));
        assert!(name.ends_with(".jpg"));
        // robot_photo_YYYYMMDD_HHMMSS.jpg
        assert_eq!(name.len(), "robot_photo_".len() + 15 + ".jpg".len());
    }

    #[test]
    fn garbage_bytes_fail_hard() {
        let dir = tempfile::tempdir().unwrap();
        let err = process(b"not a jpeg", dir.path()).unwrap_err();
        assert!(matches!(err, DeviceError::Camera(_)));
    }

    #[test]
    fn photo_dir_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let photo = process(&sample_jpeg(), &nested).unwrap();
        assert!(photo.archived_path.starts_with(&nested));
        assert!(photo.archived_path.exists());
    }
}
