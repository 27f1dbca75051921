//! GPU rendering subsystem.
//!
//! Renderers consume `scene` draw streams and issue GPU commands via wgpu.
//! Each renderer is responsible for its own GPU resources (pipelines, buffers).
//! Texture memory lives in [`GpuTextureStore`], which implements the
//! `texture::TextureBackend` seam.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shaders convert to NDC using a viewport uniform.

mod ctx;
mod store;
pub mod shapes;

pub use ctx::{RenderCtx, RenderTarget};
pub use store::GpuTextureStore;
