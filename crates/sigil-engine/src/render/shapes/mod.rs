mod common;
mod rect;
mod sprite;

pub use rect::RectRenderer;
pub use sprite::SpriteRenderer;
