/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are expected to be multiplied by `a` (premultiplied alpha).
///
/// Premultiplication keeps blending correct under linear filtering and matches
/// the blend states the sprite renderer configures.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn transparent() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }
    }

    #[inline]
    pub const fn white() -> Self {
        Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
    }

    /// Creates a premultiplied color from straight RGBA `f32` components in `[0, 1]`.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r * a,
            g: g * a,
            b: b * a,
            a,
        }
    }

    /// Creates a premultiplied color from straight RGBA bytes (`0`–`255`).
    ///
    /// This is the constructor for colors coming from the SDL-style byte API
    /// (color modulation, clear colors, text foreground).
    #[inline]
    pub fn from_rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_straight(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Opaque color from straight RGB bytes.
    #[inline]
    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba_u8(r, g, b, 255)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_u8_premultiplies() {
        let c = Color::from_rgba_u8(255, 0, 0, 128);
        let a = 128.0 / 255.0;
        assert!((c.r - a).abs() < 1e-6);
        assert_eq!(c.g, 0.0);
        assert!((c.a - a).abs() < 1e-6);
    }

    #[test]
    fn zero_alpha_zeroes_rgb() {
        let c = Color::from_rgba_u8(200, 100, 50, 0);
        assert_eq!(c, Color::transparent());
    }
}
