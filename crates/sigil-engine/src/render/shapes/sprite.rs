use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{Rect, Vec2};
use crate::render::{GpuTextureStore, RenderCtx, RenderTarget};
use crate::scene::{BlendMode, DrawCmd, DrawList, Flip, SpriteCmd};
use crate::texture::{TextureBackend, TextureId};

use super::common::{
    blend_state, logical_clip_to_scissor, viewport_ubo_min_binding_size, QuadVertex,
    ViewportUniform, QUAD_INDICES, QUAD_VERTICES,
};

// ── destination transform ─────────────────────────────────────────────────

/// Per-sprite affine mapping unit-quad corners to logical pixels.
///
/// `world = col0 * p.x + col1 * p.y + translate` for `p` in [0,1]².
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct SpriteXform {
    pub col0: Vec2,
    pub col1: Vec2,
    pub translate: Vec2,
}

/// Builds the destination transform for a sprite draw.
///
/// Order of operations matches the SDL render-copy model: the destination
/// quad is mirrored about its own center first, then rotated by `angle_deg`
/// (clockwise, +Y down) about `pivot` (default: quad center).
pub(crate) fn sprite_transform(
    dest: Rect,
    angle_deg: f32,
    pivot: Option<Vec2>,
    flip: Flip,
) -> SpriteXform {
    let center = dest.center();
    let pivot = pivot.unwrap_or(center);
    let (fx, fy) = flip.signs();
    let (sin, cos) = angle_deg.to_radians().sin_cos();

    let map = |p: Vec2| -> Vec2 {
        let world = Vec2::new(
            dest.origin.x + p.x * dest.size.x,
            dest.origin.y + p.y * dest.size.y,
        );
        let flipped = Vec2::new(
            center.x + (world.x - center.x) * fx,
            center.y + (world.y - center.y) * fy,
        );
        let d = flipped - pivot;
        pivot + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
    };

    // The mapping is affine, so three points determine it exactly.
    let translate = map(Vec2::zero());
    SpriteXform {
        col0: map(Vec2::new(1.0, 0.0)) - translate,
        col1: map(Vec2::new(0.0, 1.0)) - translate,
        translate,
    }
}

// ── instance data ─────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SpriteInstance {
    col0: [f32; 2],
    col1: [f32; 2],
    translate: [f32; 2],
    src_rect: [f32; 4], // normalized x, y, w, h
    tint: [f32; 4],     // premultiplied
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        1 => Float32x2, // col0
        2 => Float32x2, // col1
        3 => Float32x2, // translate
        4 => Float32x4, // src_rect
        5 => Float32x4  // tint
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Run key: consecutive instances sharing these can go in one draw call.
#[derive(Copy, Clone, PartialEq)]
struct RunKey {
    texture: TextureId,
    blend: BlendMode,
    clip: Option<Rect>,
}

const BLEND_MODE_COUNT: usize = 4;

fn blend_index(mode: BlendMode) -> usize {
    match mode {
        BlendMode::None => 0,
        BlendMode::Alpha => 1,
        BlendMode::Additive => 2,
        BlendMode::Modulate => 3,
    }
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Renderer for `DrawCmd::Sprite`.
///
/// One pipeline per blend mode over a shared shader; textures bind through
/// per-texture bind groups cached in the [`GpuTextureStore`]. Draws are
/// grouped into instanced calls per consecutive (texture, blend, clip) run.
#[derive(Default)]
pub struct SpriteRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: [Option<wgpu::RenderPipeline>; BLEND_MODE_COUNT],

    viewport_bgl: Option<wgpu::BindGroupLayout>,
    texture_bgl: Option<wgpu::BindGroupLayout>,
    viewport_bind_group: Option<wgpu::BindGroup>,
    viewport_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,

    /// Bumped whenever `texture_bgl` is recreated; invalidates bind groups
    /// cached in the texture store.
    layout_generation: u64,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl SpriteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders all `DrawCmd::Sprite` entries in `draw_list`.
    ///
    /// Also drains the store's release queue, so dropped `Texture2d` handles
    /// are reclaimed once per frame.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        draw_list: &mut DrawList,
        store: &mut GpuTextureStore,
    ) {
        store.flush_released();

        self.ensure_pipelines(ctx);
        self.ensure_sampler(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx);

        // ── build instance list in paint order ─────────────────────────────
        let mut instances: Vec<(SpriteInstance, RunKey)> = Vec::new();

        for item in draw_list.iter_in_paint_order() {
            let DrawCmd::Sprite(cmd) = &item.cmd else { continue };

            let Some((tw, th)) = store.size(cmd.texture) else {
                log::warn!("sprite references stale texture {:?}; skipping", cmd.texture);
                continue;
            };

            let Some(instance) = build_instance(cmd, tw, th) else { continue };
            instances.push((
                instance,
                RunKey {
                    texture: cmd.texture,
                    blend: cmd.blend,
                    clip: item.clip_rect,
                },
            ));
        }

        if instances.is_empty() {
            return;
        }

        // ── prepare bind groups outside the pass ───────────────────────────
        let (Some(texture_bgl), Some(sampler)) = (self.texture_bgl.as_ref(), self.sampler.as_ref())
        else {
            return;
        };
        for (_, key) in &instances {
            store.ensure_bind_group(key.texture, texture_bgl, sampler, self.layout_generation);
        }

        self.write_viewport_uniform(ctx);
        self.ensure_instance_capacity(ctx, instances.len());

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        let raw: Vec<SpriteInstance> = instances.iter().map(|(inst, _)| *inst).collect();
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&raw));

        let Some(viewport_bind_group) = self.viewport_bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sigil sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, viewport_bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        // One instanced draw per consecutive run with equal key.
        let mut i = 0u32;
        while i < instances.len() as u32 {
            let key = instances[i as usize].1;
            let mut j = i + 1;
            while j < instances.len() as u32 && instances[j as usize].1 == key {
                j += 1;
            }

            let pipeline = self.pipelines[blend_index(key.blend)].as_ref();
            let bind_group = store.bind_group(key.texture);
            let scissor = logical_clip_to_scissor(key.clip, ctx.viewport, ctx.scale_factor);

            if let (Some(pipeline), Some(bind_group), Some((sx, sy, sw, sh))) =
                (pipeline, bind_group, scissor)
            {
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(1, bind_group, &[]);
                rpass.set_scissor_rect(sx, sy, sw, sh);
                rpass.draw_indexed(0..6, 0, i..j);
            }

            i = j;
        }
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipelines[0].is_some() {
            return;
        }

        let shader_src = include_str!("shaders/sprite.wgsl");
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sigil sprite shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let viewport_bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sigil sprite viewport bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(viewport_ubo_min_binding_size()),
                    },
                    count: None,
                }],
            });

        let texture_bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sigil sprite texture bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sigil sprite pipeline layout"),
                bind_group_layouts: &[&viewport_bgl, &texture_bgl],
                immediate_size: 0,
            });

        for mode in [
            BlendMode::None,
            BlendMode::Alpha,
            BlendMode::Additive,
            BlendMode::Modulate,
        ] {
            let pipeline = ctx
                .device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("sigil sprite pipeline"),
                    layout: Some(&pipeline_layout),

                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[QuadVertex::layout(), SpriteInstance::layout()],
                    },

                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: ctx.surface_format,
                            blend: blend_state(mode),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),

                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },

                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                });

            self.pipelines[blend_index(mode)] = Some(pipeline);
        }

        self.pipeline_format = Some(ctx.surface_format);
        self.viewport_bgl = Some(viewport_bgl);
        self.texture_bgl = Some(texture_bgl);
        self.layout_generation = self.layout_generation.wrapping_add(1);

        self.viewport_bind_group = None;
        self.viewport_ubo = None;
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sigil sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.viewport_bind_group.is_some() && self.viewport_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.viewport_bgl.as_ref() else { return };

        let viewport_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sigil sprite viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sigil sprite viewport bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        self.viewport_ubo = Some(viewport_ubo);
        self.viewport_bind_group = Some(bind_group);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sigil sprite quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sigil sprite quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn write_viewport_uniform(&mut self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.viewport_ubo.as_ref() else { return };
        let u = ViewportUniform {
            viewport: [ctx.viewport.width.max(1.0), ctx.viewport.height.max(1.0)],
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required_instances: usize) {
        if required_instances <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required_instances.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;

        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sigil sprite instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

/// Turns a sprite command into instance data. `None` for degenerate quads.
fn build_instance(cmd: &SpriteCmd, tex_w: u32, tex_h: u32) -> Option<SpriteInstance> {
    let dest = cmd.dest.normalized();
    if dest.is_empty() || !dest.is_finite() {
        return None;
    }

    let src_rect = match cmd.src {
        None => [0.0, 0.0, 1.0, 1.0],
        Some(src) => {
            let (tw, th) = (tex_w as f32, tex_h as f32);
            [
                src.origin.x / tw,
                src.origin.y / th,
                src.size.x / tw,
                src.size.y / th,
            ]
        }
    };

    let xform = sprite_transform(dest, cmd.angle_deg, cmd.pivot, cmd.flip);

    Some(SpriteInstance {
        col0: [xform.col0.x, xform.col0.y],
        col1: [xform.col1.x, xform.col1.y],
        translate: [xform.translate.x, xform.translate.y],
        src_rect,
        tint: [cmd.tint.r, cmd.tint.g, cmd.tint.b, cmd.tint.a],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec2_eq(a: Vec2, b: Vec2) {
        assert!(
            (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4,
            "expected {:?}, got {:?}",
            b,
            a
        );
    }

    // ── sprite_transform ──────────────────────────────────────────────────

    #[test]
    fn identity_transform_maps_dest_directly() {
        let x = sprite_transform(Rect::new(10.0, 10.0, 64.0, 64.0), 0.0, None, Flip::None);
        assert_vec2_eq(x.translate, Vec2::new(10.0, 10.0));
        assert_vec2_eq(x.col0, Vec2::new(64.0, 0.0));
        assert_vec2_eq(x.col1, Vec2::new(0.0, 64.0));
    }

    #[test]
    fn horizontal_flip_mirrors_about_dest_center() {
        let x = sprite_transform(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, None, Flip::Horizontal);
        // Top-left corner lands where the top-right corner was.
        assert_vec2_eq(x.translate, Vec2::new(10.0, 0.0));
        assert_vec2_eq(x.col0, Vec2::new(-10.0, 0.0));
        assert_vec2_eq(x.col1, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn quarter_turn_about_center_permutes_corners() {
        let x = sprite_transform(Rect::new(0.0, 0.0, 10.0, 10.0), 90.0, None, Flip::None);
        // (0,0) rotates clockwise about (5,5) to (10,0).
        assert_vec2_eq(x.translate, Vec2::new(10.0, 0.0));
        // (1,0) corner -> (10,10); (0,1) corner -> (0,0).
        assert_vec2_eq(x.translate + x.col0, Vec2::new(10.0, 10.0));
        assert_vec2_eq(x.translate + x.col1, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn rotation_about_explicit_pivot_keeps_pivot_fixed() {
        let pivot = Vec2::new(0.0, 0.0);
        let x = sprite_transform(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            180.0,
            Some(pivot),
            Flip::None,
        );
        // The origin corner is the pivot and must not move.
        assert_vec2_eq(x.translate, pivot);
        // The far corner swings to the opposite quadrant.
        assert_vec2_eq(x.translate + x.col0 + x.col1, Vec2::new(-10.0, -10.0));
    }

    // ── build_instance ────────────────────────────────────────────────────

    fn cmd(dest: Rect, src: Option<Rect>) -> SpriteCmd {
        SpriteCmd {
            texture: crate::texture::TextureId(0),
            dest,
            src,
            angle_deg: 0.0,
            pivot: None,
            flip: Flip::None,
            tint: crate::paint::Color::white(),
            blend: BlendMode::Alpha,
        }
    }

    #[test]
    fn full_texture_uses_unit_uv_rect() {
        let inst = build_instance(&cmd(Rect::new(0.0, 0.0, 8.0, 8.0), None), 8, 8).unwrap();
        assert_eq!(inst.src_rect, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn src_clip_is_normalized_by_texture_size() {
        let src = Rect::new(100.0, 0.0, 100.0, 100.0);
        let inst =
            build_instance(&cmd(Rect::new(0.0, 0.0, 100.0, 100.0), Some(src)), 200, 200).unwrap();
        assert_eq!(inst.src_rect, [0.5, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn degenerate_dest_is_skipped() {
        assert!(build_instance(&cmd(Rect::new(0.0, 0.0, 0.0, 10.0), None), 8, 8).is_none());
    }
}
