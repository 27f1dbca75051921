//! Color model shared between the scene and renderers.
//!
//! Scope:
//! - color representation (linear premultiplied alpha)
//!
//! Geometry types remain in `coords`; CPU pixel data lives in `pixels`.

mod color;

pub use color::Color;
