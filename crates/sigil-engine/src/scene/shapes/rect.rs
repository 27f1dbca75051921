use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::scene::{DrawCmd, DrawList, ZIndex};

/// Solid rectangle draw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RectCmd {
    pub rect: Rect,
    pub color: Color,
}

impl RectCmd {
    #[inline]
    pub fn new(rect: Rect, color: Color) -> Self {
        Self { rect, color }
    }
}

impl DrawList {
    /// Records a solid rectangle draw command.
    #[inline]
    pub fn push_solid_rect(&mut self, z: ZIndex, rect: Rect, color: Color) {
        self.push(z, DrawCmd::Rect(RectCmd::new(rect, color)));
    }

    /// Records the four edges of `rect` as 1px solid strips (an outline).
    pub fn push_outline_rect(&mut self, z: ZIndex, rect: Rect, color: Color) {
        let r = rect.normalized();
        let (x, y) = (r.origin.x, r.origin.y);
        let (w, h) = (r.size.x, r.size.y);
        self.push_solid_rect(z, Rect::new(x, y, w, 1.0), color);
        self.push_solid_rect(z, Rect::new(x, y + h - 1.0, w, 1.0), color);
        self.push_solid_rect(z, Rect::new(x, y, 1.0, h), color);
        self.push_solid_rect(z, Rect::new(x + w - 1.0, y, 1.0, h), color);
    }

    /// Records a straight line from `a` to `b` as a strip of square dots.
    ///
    /// Dots are `thickness`-sized solid rects centered on the segment, spaced
    /// one thickness apart so the strip reads as a continuous line at any
    /// angle. Both endpoints always get a dot.
    pub fn push_line(&mut self, z: ZIndex, a: Vec2, b: Vec2, thickness: f32, color: Color) {
        let delta = b - a;
        let len = (delta.x * delta.x + delta.y * delta.y).sqrt();
        let t = thickness.max(1.0);
        let steps = (len / t).ceil().max(1.0) as u32;

        for i in 0..=steps {
            let p = a + delta * (i as f32 / steps as f32);
            self.push_solid_rect(z, Rect::new(p.x - t / 2.0, p.y - t / 2.0, t, t), color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(list: &DrawList) -> Vec<Rect> {
        list.items()
            .iter()
            .map(|item| match &item.cmd {
                DrawCmd::Rect(r) => r.rect,
                other => panic!("expected rect command, got {:?}", other),
            })
            .collect()
    }

    // ── outline ───────────────────────────────────────────────────────────

    #[test]
    fn outline_is_four_edge_strips() {
        let mut list = DrawList::new();
        list.push_outline_rect(
            ZIndex::default(),
            Rect::new(10.0, 20.0, 100.0, 50.0),
            Color::white(),
        );

        let rs = rects(&list);
        assert_eq!(rs.len(), 4);
        assert_eq!(rs[0], Rect::new(10.0, 20.0, 100.0, 1.0)); // top
        assert_eq!(rs[1], Rect::new(10.0, 69.0, 100.0, 1.0)); // bottom
        assert_eq!(rs[2], Rect::new(10.0, 20.0, 1.0, 50.0)); // left
        assert_eq!(rs[3], Rect::new(109.0, 20.0, 1.0, 50.0)); // right
    }

    // ── line strip ────────────────────────────────────────────────────────

    #[test]
    fn line_strip_covers_both_endpoints() {
        let mut list = DrawList::new();
        list.push_line(
            ZIndex::default(),
            Vec2::new(0.0, 100.0),
            Vec2::new(100.0, 0.0),
            2.0,
            Color::white(),
        );

        let rs = rects(&list);
        assert!(rs.len() > 2);
        assert!(rs.first().unwrap().contains(Vec2::new(0.0, 100.0)));
        assert!(rs.last().unwrap().contains(Vec2::new(99.9, 0.1)));
    }

    #[test]
    fn line_dots_lie_on_the_segment() {
        let mut list = DrawList::new();
        list.push_line(
            ZIndex::default(),
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 50.0),
            2.0,
            Color::white(),
        );

        for r in rects(&list) {
            let c = r.center();
            assert!((c.x - c.y).abs() < 1e-3, "dot off the diagonal: {:?}", c);
        }
    }

    #[test]
    fn degenerate_line_is_a_single_dot() {
        let mut list = DrawList::new();
        let p = Vec2::new(5.0, 5.0);
        list.push_line(ZIndex::default(), p, p, 2.0, Color::white());

        // One step still emits both "endpoints", at the same spot.
        let rs = rects(&list);
        assert!(rs.iter().all(|r| r.contains(p)));
    }
}
