//! Window lifecycle and the winit event loop driver.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
