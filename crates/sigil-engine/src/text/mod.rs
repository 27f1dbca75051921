//! Text rasterization.
//!
//! Fonts are parsed and owned by [`FontSystem`]; single lines of text are
//! rasterized to CPU pixel buffers which the texture layer uploads like any
//! other image. There is no glyph atlas here — text textures in this engine
//! are whole rendered strings, matching the sprite-oriented draw model.

mod font_system;
mod raster;

pub use font_system::{FontId, FontLoadError, FontSystem};
pub use raster::RasterizeError;
