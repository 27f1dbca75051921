use std::fmt;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

use crate::pixels::PixelBuffer;

use super::{FontId, FontSystem};

/// Error returned when a text string cannot be rasterized.
#[derive(Debug, Clone)]
pub enum RasterizeError {
    /// The `FontId` does not refer to a loaded font.
    UnknownFont(FontId),
    /// Layout produced no drawable glyphs (empty or whitespace-only text).
    EmptyOutput,
}

impl fmt::Display for RasterizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterizeError::UnknownFont(id) => write!(f, "unknown font id {:?}", id),
            RasterizeError::EmptyOutput => write!(f, "text produced no drawable glyphs"),
        }
    }
}

impl std::error::Error for RasterizeError {}

impl FontSystem {
    /// Rasterizes a single line of text into an RGBA buffer.
    ///
    /// Every pixel's RGB is the foreground `color`; alpha is the glyph
    /// coverage reported by fontdue. The buffer is tightly sized to the laid
    /// out glyph extents.
    pub fn rasterize_line(
        &self,
        id: FontId,
        text: &str,
        px_size: f32,
        color: [u8; 3],
    ) -> Result<PixelBuffer, RasterizeError> {
        let font = self.get(id).ok_or(RasterizeError::UnknownFont(id))?;

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(std::slice::from_ref(font), &TextStyle::new(text, px_size, 0));

        // Glyph extents; x can dip below zero for glyphs with negative xmin.
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        let mut drawable = 0usize;

        for g in layout.glyphs() {
            if !g.char_data.rasterize() || g.width == 0 || g.height == 0 {
                continue;
            }
            drawable += 1;
            min_x = min_x.min(g.x);
            max_x = max_x.max(g.x + g.width as f32);
            max_y = max_y.max(g.y + g.height as f32);
        }

        if drawable == 0 {
            return Err(RasterizeError::EmptyOutput);
        }

        let min_x = min_x.min(0.0);
        let width = (max_x - min_x).ceil().max(1.0) as u32;
        let height = max_y.ceil().max(1.0) as u32;

        let mut buf = PixelBuffer::new(width, height);

        for g in layout.glyphs() {
            if !g.char_data.rasterize() || g.width == 0 || g.height == 0 {
                continue;
            }
            let (metrics, coverage) = font.rasterize_config(g.key);
            let gx = (g.x - min_x).round() as i64;
            let gy = g.y.round() as i64;

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let a = coverage[row * metrics.width + col];
                    if a == 0 {
                        continue;
                    }
                    let px = gx + col as i64;
                    let py = gy + row as i64;
                    if px < 0 || py < 0 {
                        continue;
                    }
                    let (px, py) = (px as u32, py as u32);
                    // max() keeps overlapping glyph edges from cancelling out.
                    let prev = buf.pixel(px, py).map(|p| p[3]).unwrap_or(0);
                    buf.set_pixel(px, py, [color[0], color[1], color[2], a.max(prev)]);
                }
            }
        }

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_font_id_is_an_error() {
        let fonts = FontSystem::new();
        let err = fonts.rasterize_line(FontId(0), "hi", 16.0, [255, 255, 255]);
        assert!(matches!(err, Err(RasterizeError::UnknownFont(_))));
    }
}
