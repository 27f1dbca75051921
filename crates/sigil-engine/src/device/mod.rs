//! GPU device layer: wgpu instance/device/queue ownership, surface
//! configuration, and per-frame acquisition.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
