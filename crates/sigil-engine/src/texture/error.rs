use std::fmt;

use crate::pixels::DecodeError;
use crate::text::RasterizeError;

/// Error produced by texture loads.
///
/// All variants are local and non-fatal to the resource: a failed load leaves
/// the resource unloaded and the caller decides whether to abort. The engine
/// never retries.
#[derive(Debug, Clone)]
pub enum TextureError {
    /// The source image could not be decoded.
    Decode(DecodeError),
    /// Text rasterization failed before any upload was attempted.
    Rasterize(RasterizeError),
    /// The backend rejected the pixel upload.
    Upload(String),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Decode(e) => write!(f, "{}", e),
            TextureError::Rasterize(e) => write!(f, "text rasterization failed: {}", e),
            TextureError::Upload(msg) => write!(f, "texture upload failed: {}", msg),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Decode(e) => Some(e),
            TextureError::Rasterize(e) => Some(e),
            TextureError::Upload(_) => None,
        }
    }
}

impl From<DecodeError> for TextureError {
    fn from(e: DecodeError) -> Self {
        TextureError::Decode(e)
    }
}

impl From<RasterizeError> for TextureError {
    fn from(e: RasterizeError) -> Self {
        TextureError::Rasterize(e)
    }
}
