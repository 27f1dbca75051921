//! Shared GPU types and utilities used by all shape renderers.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Viewport};
use crate::scene::BlendMode;

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// wgpu blend state for a scene blend mode. Sources are premultiplied.
pub(super) fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        // Overwrite: no blending at all.
        BlendMode::None => None,
        BlendMode::Alpha => Some(premul_alpha_blend()),
        BlendMode::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
        BlendMode::Modulate => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::Zero,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
    }
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── scissor rect ──────────────────────────────────────────────────────────

/// Converts a logical-pixel clip rect to physical scissor rect arguments.
///
/// Returns `None` if the clip rect is zero-area (renderer should skip the
/// draw call). `clip = None` means "no scissor" → the full viewport rect.
pub(super) fn logical_clip_to_scissor(
    clip: Option<Rect>,
    viewport: Viewport,
    scale: f32,
) -> Option<(u32, u32, u32, u32)> {
    let phys_vw = (viewport.width * scale).max(1.0) as u32;
    let phys_vh = (viewport.height * scale).max(1.0) as u32;

    let (x, y, w, h) = match clip {
        None => (0, 0, phys_vw, phys_vh),
        Some(r) => {
            let x = ((r.origin.x * scale).max(0.0) as u32).min(phys_vw);
            let y = ((r.origin.y * scale).max(0.0) as u32).min(phys_vh);
            let x2 = (((r.origin.x + r.size.x) * scale).max(0.0) as u32).min(phys_vw);
            let y2 = (((r.origin.y + r.size.y) * scale).max(0.0) as u32).min(phys_vh);
            (x, y, x2.saturating_sub(x), y2.saturating_sub(y))
        }
    };

    if w == 0 || h == 0 { None } else { Some((x, y, w, h)) }
}

/// `wgpu` minimum binding size for the viewport uniform buffer.
pub(super) fn viewport_ubo_min_binding_size() -> std::num::NonZeroU64 {
    // ViewportUniform is 16 bytes; never zero.
    std::num::NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64)
        .expect("ViewportUniform has non-zero size")
}

#[cfg(test)]
mod tests {
    use super::*;

    const VP: Viewport = Viewport {
        width: 600.0,
        height: 600.0,
    };

    #[test]
    fn no_clip_covers_full_viewport() {
        assert_eq!(logical_clip_to_scissor(None, VP, 1.0), Some((0, 0, 600, 600)));
    }

    #[test]
    fn clip_is_scaled_to_physical_pixels() {
        let clip = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(
            logical_clip_to_scissor(Some(clip), VP, 2.0),
            Some((20, 40, 200, 100))
        );
    }

    #[test]
    fn clip_is_clamped_to_viewport() {
        let clip = Rect::new(500.0, 0.0, 400.0, 50.0);
        assert_eq!(
            logical_clip_to_scissor(Some(clip), VP, 1.0),
            Some((500, 0, 100, 50))
        );
    }

    #[test]
    fn zero_area_clip_skips_draw() {
        let clip = Rect::new(0.0, 0.0, 0.0, 100.0);
        assert_eq!(logical_clip_to_scissor(Some(clip), VP, 1.0), None);
    }
}
