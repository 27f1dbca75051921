use crate::coords::Rect;

use super::{DrawCmd, SortKey, ZIndex};

/// A single draw item: sort key + command + clip rect.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub key: SortKey,
    pub cmd: DrawCmd,
    /// Scissor rect in logical pixels. `None` = no clipping (draw everywhere).
    pub clip_rect: Option<Rect>,
}

/// Recorded draw stream for a frame.
///
/// `push()` is O(1); paint-order iteration reuses an internal index buffer so
/// a warmed list allocates nothing per frame.
///
/// # Viewports
///
/// [`push_viewport`] / [`pop_viewport`] scope draw commands to a sub-rectangle
/// of the output. Nested viewports are intersected with their parent, and the
/// renderer turns the effective rect into a hardware scissor.
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
    next_order: u32,

    sorted_indices: Vec<usize>,
    sorted_dirty: bool,

    /// Stack of active viewport rects (logical pixels).
    /// The top is the current effective clip, already intersected with all parents.
    viewport_stack: Vec<Rect>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded items and the viewport stack. Keeps capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
        self.next_order = 0;
        self.sorted_dirty = true;
        self.sorted_indices.clear();
        self.viewport_stack.clear();
    }

    /// Returns items in insertion order.
    #[inline]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pushes a draw command with the given z-index.
    ///
    /// The item inherits the current viewport rect from the stack.
    #[inline]
    pub fn push(&mut self, z: ZIndex, cmd: DrawCmd) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);

        self.items.push(DrawItem {
            key: SortKey::new(z, order),
            cmd,
            clip_rect: self.viewport_stack.last().copied(),
        });

        self.sorted_dirty = true;
    }

    /// Begins a viewport region. Draw commands pushed until [`pop_viewport`]
    /// are restricted to `rect` (intersected with any parent viewport).
    ///
    /// Calls must be balanced with [`pop_viewport`].
    #[inline]
    pub fn push_viewport(&mut self, rect: Rect) {
        let effective = match self.viewport_stack.last() {
            None => rect,
            // No overlap with the parent collapses to a zero-area rect so the
            // renderer skips those draw calls.
            Some(&parent) => parent.intersect(rect).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0)),
        };
        self.viewport_stack.push(effective);
    }

    /// Ends the most recent viewport region started by [`push_viewport`].
    ///
    /// # Panics
    /// Panics (debug only) if called without a matching `push_viewport`.
    #[inline]
    pub fn pop_viewport(&mut self) {
        debug_assert!(
            !self.viewport_stack.is_empty(),
            "pop_viewport called without matching push_viewport"
        );
        self.viewport_stack.pop();
    }

    /// Iterates items in paint order (back-to-front) without cloning commands.
    pub fn iter_in_paint_order(&mut self) -> impl Iterator<Item = &DrawItem> {
        if self.sorted_dirty {
            self.rebuild_sorted_indices();
        }

        self.sorted_indices.iter().map(|&i| &self.items[i])
    }

    fn rebuild_sorted_indices(&mut self) {
        self.sorted_indices.clear();
        self.sorted_indices.extend(0..self.items.len());

        // Stable ordering is ensured by SortKey including insertion order.
        self.sorted_indices
            .sort_by(|&a, &b| self.items[a].key.cmp(&self.items[b].key));

        self.sorted_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;

    fn solid(list: &mut DrawList, z: i32, x: f32) {
        list.push_solid_rect(ZIndex::new(z), Rect::new(x, 0.0, 1.0, 1.0), Color::white());
    }

    fn xs_in_paint_order(list: &mut DrawList) -> Vec<f32> {
        list.iter_in_paint_order()
            .map(|item| match &item.cmd {
                DrawCmd::Rect(r) => r.rect.origin.x,
                _ => panic!("unexpected command"),
            })
            .collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn paint_order_sorts_by_z_then_insertion() {
        let mut list = DrawList::new();
        solid(&mut list, 1, 0.0);
        solid(&mut list, 0, 1.0);
        solid(&mut list, 1, 2.0);

        assert_eq!(xs_in_paint_order(&mut list), vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn clear_resets_ordering_state() {
        let mut list = DrawList::new();
        solid(&mut list, 5, 0.0);
        list.clear();
        assert!(list.is_empty());

        solid(&mut list, 0, 3.0);
        assert_eq!(xs_in_paint_order(&mut list), vec![3.0]);
    }

    // ── viewports ─────────────────────────────────────────────────────────

    #[test]
    fn items_inherit_current_viewport() {
        let mut list = DrawList::new();
        let vp = Rect::new(0.0, 0.0, 300.0, 300.0);

        list.push_viewport(vp);
        solid(&mut list, 0, 0.0);
        list.pop_viewport();
        solid(&mut list, 0, 1.0);

        assert_eq!(list.items()[0].clip_rect, Some(vp));
        assert_eq!(list.items()[1].clip_rect, None);
    }

    #[test]
    fn nested_viewports_intersect() {
        let mut list = DrawList::new();
        list.push_viewport(Rect::new(0.0, 0.0, 100.0, 100.0));
        list.push_viewport(Rect::new(50.0, 50.0, 100.0, 100.0));
        solid(&mut list, 0, 0.0);

        assert_eq!(
            list.items()[0].clip_rect,
            Some(Rect::new(50.0, 50.0, 50.0, 50.0))
        );
    }

    #[test]
    fn disjoint_nested_viewport_collapses_to_zero_area() {
        let mut list = DrawList::new();
        list.push_viewport(Rect::new(0.0, 0.0, 10.0, 10.0));
        list.push_viewport(Rect::new(50.0, 50.0, 10.0, 10.0));
        solid(&mut list, 0, 0.0);

        let clip = list.items()[0].clip_rect.unwrap();
        assert!(clip.is_empty());
    }
}
