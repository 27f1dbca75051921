use std::fmt;
use std::path::Path;

use super::PixelBuffer;

/// Error returned when an image file cannot be decoded.
///
/// Carries the offending path and the decoder's own message, so callers can
/// report a single human-readable diagnostic.
#[derive(Debug, Clone)]
pub struct DecodeError {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not decode image {:?}: {}", self.path, self.reason)
    }
}

impl std::error::Error for DecodeError {}

/// Decodes an image at `path` into an RGBA8 buffer.
///
/// Format support follows the `image` crate defaults (PNG, BMP, JPEG, GIF...).
/// Any pixel format in the file is converted to RGBA8.
pub fn decode_file(path: &Path) -> Result<PixelBuffer, DecodeError> {
    let err = |reason: String| DecodeError {
        path: path.display().to_string(),
        reason,
    };

    let img = image::open(path).map_err(|e| err(e.to_string()))?;
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();

    PixelBuffer::from_rgba8(width, height, rgba.into_raw())
        .ok_or_else(|| err("decoded buffer has inconsistent dimensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let e = decode_file(Path::new("does/not/exist.png")).unwrap_err();
        assert!(e.path.contains("exist.png"));
    }

    #[test]
    fn decodes_png_written_by_image_crate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");

        let img = image::RgbaImage::from_fn(64, 64, |x, y| {
            image::Rgba([x as u8, y as u8, 7, 255])
        });
        img.save(&path).unwrap();

        let buf = decode_file(&path).unwrap();
        assert_eq!(buf.width(), 64);
        assert_eq!(buf.height(), 64);
        assert_eq!(buf.pixel(3, 5), Some([3, 5, 7, 255]));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(decode_file(&path).is_err());
    }
}
