use std::collections::HashMap;

use crate::texture::{ReleaseQueue, TextureBackend, TextureError, TextureId};

struct TextureEntry {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,

    // Sprite-pipeline bind group, cached per texture. Invalidated when the
    // sprite renderer rebuilds its layout (generation mismatch).
    bind_group: Option<(u64, wgpu::BindGroup)>,
}

/// wgpu-backed texture storage.
///
/// Owns every uploaded `wgpu::Texture`; resources refer to them by
/// [`TextureId`]. `wgpu::Device`/`Queue` handles are internally ref-counted,
/// so the store holds its own clones — the window/GPU context must still
/// outlive the store (dropping the device under live textures is a
/// precondition violation, not a recoverable state).
pub struct GpuTextureStore {
    device: wgpu::Device,
    queue: wgpu::Queue,
    entries: HashMap<u32, TextureEntry>,
    next_id: u32,
    release_queue: ReleaseQueue,
}

impl GpuTextureStore {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            entries: HashMap::new(),
            next_id: 0,
            release_queue: ReleaseQueue::new(),
        }
    }

    /// Dimensions of a stored texture, or `None` for a stale id.
    pub fn size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.entries.get(&id.raw()).map(|e| (e.width, e.height))
    }

    /// Builds (or reuses) the sprite bind group for `id` against `layout`.
    ///
    /// `generation` identifies the layout; cached groups from older
    /// generations are rebuilt. Must be called outside a render pass.
    pub(crate) fn ensure_bind_group(
        &mut self,
        id: TextureId,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        generation: u64,
    ) {
        let Some(entry) = self.entries.get_mut(&id.raw()) else {
            return;
        };
        if matches!(&entry.bind_group, Some((g, _)) if *g == generation) {
            return;
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sigil sprite texture bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&entry.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        entry.bind_group = Some((generation, bind_group));
    }

    /// Cached bind group for `id`, if [`ensure_bind_group`] has built one.
    pub(crate) fn bind_group(&self, id: TextureId) -> Option<&wgpu::BindGroup> {
        self.entries
            .get(&id.raw())
            .and_then(|e| e.bind_group.as_ref())
            .map(|(_, bg)| bg)
    }
}

impl TextureBackend for GpuTextureStore {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        premultiplied_rgba: &[u8],
        label: Option<&str>,
    ) -> Result<TextureId, TextureError> {
        // Reclaim dropped resources before growing the map.
        self.flush_released();

        if width == 0 || height == 0 {
            return Err(TextureError::Upload(format!(
                "zero-sized texture ({width}x{height})"
            )));
        }
        let expected = (width as usize) * (height as usize) * 4;
        if premultiplied_rgba.len() != expected {
            return Err(TextureError::Upload(format!(
                "pixel data is {} bytes, expected {} for {width}x{height}",
                premultiplied_rgba.len(),
                expected
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            premultiplied_rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = TextureId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.insert(
            id.raw(),
            TextureEntry {
                _texture: texture,
                view,
                width,
                height,
                bind_group: None,
            },
        );

        log::debug!("created texture {:?} ({}x{})", id, width, height);
        Ok(id)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.entries.remove(&id.raw()).is_some() {
            log::debug!("destroyed texture {:?}", id);
        }
    }

    fn release_queue(&self) -> ReleaseQueue {
        self.release_queue.clone()
    }

    fn texture_count(&self) -> usize {
        self.entries.len()
    }
}
