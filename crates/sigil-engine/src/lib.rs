//! Sigil engine crate.
//!
//! A small 2D sprite engine: CPU-side image decoding and color keying, GPU
//! texture resources with deterministic release, a renderer-agnostic draw
//! stream, and wgpu renderers for sprites and solid rectangles.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod pixels;
pub mod text;
pub mod texture;
pub mod render;
pub mod scene;
