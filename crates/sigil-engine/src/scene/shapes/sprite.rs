use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::scene::{DrawCmd, DrawList, ZIndex};
use crate::texture::TextureId;

/// Compositing function used when drawing a sprite over existing pixels.
///
/// The set mirrors the classic SDL renderer blend modes. `Alpha` is the
/// default for anything with transparency (color-keyed or text textures).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BlendMode {
    /// Overwrite destination pixels, ignoring alpha.
    None,
    /// Premultiplied-alpha blending.
    #[default]
    Alpha,
    /// Add source to destination.
    Additive,
    /// Multiply destination by source color.
    Modulate,
}

/// Mirroring applied to a sprite's destination quad.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    /// `(x, y)` scale signs for the destination quad.
    #[inline]
    pub fn signs(self) -> (f32, f32) {
        match self {
            Flip::None => (1.0, 1.0),
            Flip::Horizontal => (-1.0, 1.0),
            Flip::Vertical => (1.0, -1.0),
            Flip::Both => (-1.0, -1.0),
        }
    }
}

/// Sprite draw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteCmd {
    pub texture: TextureId,
    /// Destination rectangle in logical pixels.
    pub dest: Rect,
    /// Source sub-rectangle in texture pixels. `None` draws the whole texture.
    pub src: Option<Rect>,
    /// Rotation in degrees, clockwise (+Y down coordinate system).
    pub angle_deg: f32,
    /// Rotation pivot in logical pixels. `None` = center of `dest`.
    pub pivot: Option<Vec2>,
    pub flip: Flip,
    /// Premultiplied modulation color; sampled texels are multiplied by this.
    pub tint: Color,
    pub blend: BlendMode,
}

impl DrawList {
    /// Records a sprite draw command.
    #[inline]
    pub fn push_sprite(&mut self, z: ZIndex, cmd: SpriteCmd) {
        self.push(z, DrawCmd::Sprite(cmd));
    }
}
