use std::path::Path;

use crate::paint::Color;

use super::decode::{decode_file, DecodeError};

/// A designated pixel color treated as fully transparent during load.
///
/// Matching is an exact RGB comparison; alpha is ignored on the source pixel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ColorKey {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorKey {
    /// The cyan key used by the original SDL tutorials this engine grew out of.
    pub const LEGACY_CYAN: ColorKey = ColorKey { r: 0, g: 255, b: 255 };

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// RGBA8 straight-alpha pixel buffer.
///
/// Row-major, tightly packed, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Builds a buffer by evaluating `f` at every pixel coordinate.
    ///
    /// `f` returns straight RGBA bytes.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Wraps an existing RGBA8 byte vector.
    ///
    /// Returns `None` if `data` is not exactly `width * height * 4` bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Decodes an image file (PNG, BMP, JPEG, ...) into a buffer.
    pub fn decode_file(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        decode_file(path.as_ref())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Straight RGBA bytes at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Sets the straight RGBA bytes at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Fills a sub-rectangle with a straight color. Clamped to the buffer.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgba: [u8; 4]) {
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        for py in y..y1 {
            for px in x..x1 {
                self.set_pixel(px, py, rgba);
            }
        }
    }

    /// Zeroes the alpha of every pixel whose RGB exactly matches `key`.
    pub fn apply_color_key(&mut self, key: ColorKey) {
        for px in self.data.chunks_exact_mut(4) {
            if px[0] == key.r && px[1] == key.g && px[2] == key.b {
                px[3] = 0;
            }
        }
    }

    /// Converts to premultiplied-alpha bytes for GPU upload.
    ///
    /// Rounds to nearest; an alpha of 0 produces fully zero pixels, which is
    /// what the color-key rule relies on.
    pub fn to_premultiplied(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
            px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
            px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
        }
        out
    }

    /// Fills the whole buffer with a solid paint color.
    pub fn fill(&mut self, color: Color) {
        // Paint colors are premultiplied; store straight bytes here.
        let a = color.a.clamp(0.0, 1.0);
        let unmul = |c: f32| {
            if a <= f32::EPSILON {
                0
            } else {
                ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8
            }
        };
        let rgba = [
            unmul(color.r),
            unmul(color.g),
            unmul(color.b),
            (a * 255.0).round() as u8,
        ];
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn from_fn_evaluates_every_pixel() {
        let buf = PixelBuffer::from_fn(2, 2, |x, y| [x as u8, y as u8, 0, 255]);
        assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(buf.pixel(1, 0), Some([1, 0, 0, 255]));
        assert_eq!(buf.pixel(0, 1), Some([0, 1, 0, 255]));
        assert_eq!(buf.pixel(1, 1), Some([1, 1, 0, 255]));
    }

    #[test]
    fn from_rgba8_rejects_wrong_length() {
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let buf = PixelBuffer::new(4, 4);
        assert!(buf.pixel(4, 0).is_none());
        assert!(buf.pixel(0, 4).is_none());
    }

    // ── color key ─────────────────────────────────────────────────────────

    #[test]
    fn color_key_zeroes_matching_alpha() {
        let mut buf = PixelBuffer::from_fn(2, 1, |x, _| {
            if x == 0 { [0, 255, 255, 255] } else { [10, 20, 30, 255] }
        });
        buf.apply_color_key(ColorKey::LEGACY_CYAN);
        assert_eq!(buf.pixel(0, 0), Some([0, 255, 255, 0]));
        assert_eq!(buf.pixel(1, 0), Some([10, 20, 30, 255]));
    }

    #[test]
    fn color_key_requires_exact_match() {
        let mut buf = PixelBuffer::from_fn(1, 1, |_, _| [0, 255, 254, 255]);
        buf.apply_color_key(ColorKey::LEGACY_CYAN);
        assert_eq!(buf.pixel(0, 0).unwrap()[3], 255);
    }

    // ── premultiply ───────────────────────────────────────────────────────

    #[test]
    fn premultiply_zero_alpha_zeroes_rgb() {
        let buf = PixelBuffer::from_fn(1, 1, |_, _| [200, 100, 50, 0]);
        assert_eq!(buf.to_premultiplied(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn premultiply_full_alpha_is_identity() {
        let buf = PixelBuffer::from_fn(1, 1, |_, _| [200, 100, 50, 255]);
        assert_eq!(buf.to_premultiplied(), vec![200, 100, 50, 255]);
    }
}
