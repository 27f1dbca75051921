//! GPU texture resources.
//!
//! [`Texture2d`] is the resource type the rest of the engine revolves around:
//! it owns one uploaded texture handle plus its recorded dimensions, and is
//! either *loaded* (handle present, dimensions non-zero) or *unloaded*
//! (no handle, 0x0). Loads go through a [`TextureBackend`], which is the seam
//! between CPU pixel data and whatever actually stores GPU memory — the wgpu
//! store in `render`, or a counting fake in tests.
//!
//! Responsibilities:
//! - load from files, pixel buffers, or rasterized text
//! - per-resource draw parameters (color/alpha modulation, blend mode)
//! - deterministic release: explicit via [`Texture2d::release`], deferred via
//!   the backend's release queue when a loaded resource is dropped

mod backend;
mod error;
mod texture2d;

pub use backend::{ReleaseQueue, TextureBackend, TextureId};
pub use error::TextureError;
pub use texture2d::{LoadOptions, SpriteParams, Texture2d};
