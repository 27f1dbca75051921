//! CPU-side pixel buffers.
//!
//! Everything here runs before any GPU involvement: decoding image files,
//! building buffers procedurally, and applying the color-key transparency
//! rule. Buffers are RGBA8 with straight (non-premultiplied) alpha; the
//! texture store premultiplies on upload.

mod buffer;
mod decode;

pub use buffer::{ColorKey, PixelBuffer};
pub use decode::DecodeError;
