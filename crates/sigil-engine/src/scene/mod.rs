//! Scene (draw stream) types.
//!
//! Responsibilities:
//! - store renderer-agnostic draw commands
//! - provide deterministic ordering (z-index + insertion order)
//! - scope draws to viewport sub-rectangles via the clip stack
//!
//! Shape-specific payloads and push helpers live per shape under
//! `scene::shapes`.

mod cmd;
mod key;
mod list;
mod z_index;

pub mod shapes;

pub use cmd::DrawCmd;
pub use key::SortKey;
pub use list::{DrawItem, DrawList};
pub use shapes::rect::RectCmd;
pub use shapes::sprite::{BlendMode, Flip, SpriteCmd};
pub use z_index::ZIndex;
