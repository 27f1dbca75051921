use std::path::Path;

use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::pixels::{ColorKey, PixelBuffer};
use crate::scene::{BlendMode, DrawList, Flip, SpriteCmd, ZIndex};
use crate::text::{FontId, FontSystem};

use super::{ReleaseQueue, TextureBackend, TextureError, TextureId};

/// Options for file loads.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Pixels matching this RGB are made fully transparent before upload.
    pub color_key: Option<ColorKey>,
}

impl LoadOptions {
    /// Color-keyed load using the legacy cyan key.
    pub fn legacy_color_key() -> Self {
        Self {
            color_key: Some(ColorKey::LEGACY_CYAN),
        }
    }
}

/// Per-draw parameters for [`Texture2d::render`].
#[derive(Debug, Clone, Default)]
pub struct SpriteParams {
    /// Source sub-rectangle in texture pixels. `None` draws the whole texture.
    pub clip: Option<Rect>,
    /// Rotation in degrees, clockwise.
    pub angle_deg: f32,
    /// Rotation pivot. `None` = center of the destination rectangle.
    pub pivot: Option<Vec2>,
    pub flip: Flip,
}

#[derive(Debug)]
struct Loaded {
    id: TextureId,
    width: u32,
    height: u32,
    /// Clone of the owning backend's queue, used if we are dropped while loaded.
    queue: ReleaseQueue,
}

/// A 2D texture resource.
///
/// Owns at most one backend texture handle plus its recorded dimensions.
/// Unloaded means no handle and `width() == height() == 0`; the two facts
/// change together, never independently.
///
/// Loading always releases the previous handle first, so a failed load leaves
/// the resource unloaded rather than half-updated. Dropping a loaded resource
/// defers its handle to the backend's release queue.
#[derive(Debug)]
pub struct Texture2d {
    loaded: Option<Loaded>,

    // Draw parameters applied to every render of this resource.
    color_mod: [u8; 3],
    alpha_mod: u8,
    blend: BlendMode,
}

impl Texture2d {
    /// Creates an unloaded resource.
    pub fn new() -> Self {
        Self {
            loaded: None,
            color_mod: [255, 255, 255],
            alpha_mod: 255,
            blend: BlendMode::default(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Recorded pixel width; 0 when unloaded.
    pub fn width(&self) -> u32 {
        self.loaded.as_ref().map_or(0, |l| l.width)
    }

    /// Recorded pixel height; 0 when unloaded.
    pub fn height(&self) -> u32 {
        self.loaded.as_ref().map_or(0, |l| l.height)
    }

    /// Backend handle, if loaded. Mostly useful for diagnostics.
    pub fn id(&self) -> Option<TextureId> {
        self.loaded.as_ref().map(|l| l.id)
    }

    /// Decodes the image at `path`, applies the configured color key, and
    /// uploads it.
    ///
    /// Any previously loaded handle is released first; on failure the
    /// resource is left unloaded and the error is also reported on the log.
    pub fn load_from_file<B: TextureBackend>(
        &mut self,
        backend: &mut B,
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<(), TextureError> {
        let path = path.as_ref();
        self.release(backend);

        let mut pixels = match PixelBuffer::decode_file(path) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("texture load failed: {}", e);
                return Err(e.into());
            }
        };

        if let Some(key) = options.color_key {
            pixels.apply_color_key(key);
        }

        self.upload(backend, &pixels, Some(&path.display().to_string()))
    }

    /// Uploads an already-built pixel buffer.
    ///
    /// Releases any previous handle first.
    pub fn load_from_pixels<B: TextureBackend>(
        &mut self,
        backend: &mut B,
        pixels: &PixelBuffer,
    ) -> Result<(), TextureError> {
        self.release(backend);
        self.upload(backend, pixels, None)
    }

    /// Rasterizes `text` with `font` and uploads the result.
    ///
    /// The texture gets the rasterized string's exact dimensions. Fails if the
    /// font is unknown, the text has no drawable glyphs, or the upload fails;
    /// in every case the resource ends up unloaded.
    pub fn load_from_text<B: TextureBackend>(
        &mut self,
        backend: &mut B,
        fonts: &FontSystem,
        font: FontId,
        text: &str,
        px_size: f32,
        color: [u8; 3],
    ) -> Result<(), TextureError> {
        self.release(backend);

        let pixels = match fonts.rasterize_line(font, text, px_size, color) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("text texture load failed: {}", e);
                return Err(e.into());
            }
        };

        self.upload(backend, &pixels, Some(text))
    }

    fn upload<B: TextureBackend>(
        &mut self,
        backend: &mut B,
        pixels: &PixelBuffer,
        label: Option<&str>,
    ) -> Result<(), TextureError> {
        let premul = pixels.to_premultiplied();
        let id = match backend.create_texture(pixels.width(), pixels.height(), &premul, label) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("texture upload failed: {}", e);
                return Err(e);
            }
        };

        self.loaded = Some(Loaded {
            id,
            width: pixels.width(),
            height: pixels.height(),
            queue: backend.release_queue(),
        });
        Ok(())
    }

    /// Releases the backend handle, returning to the unloaded state.
    ///
    /// Idempotent; releasing an unloaded resource is a no-op.
    pub fn release<B: TextureBackend>(&mut self, backend: &mut B) {
        if let Some(loaded) = self.loaded.take() {
            backend.destroy_texture(loaded.id);
        }
    }

    /// Scales each subsequently sampled color channel by `(r, g, b) / 255`.
    pub fn set_color_mod(&mut self, r: u8, g: u8, b: u8) {
        self.color_mod = [r, g, b];
    }

    /// Scales the per-pixel alpha used during compositing by `a / 255`.
    pub fn set_alpha(&mut self, a: u8) {
        self.alpha_mod = a;
    }

    /// Selects how subsequent renders composite with the framebuffer.
    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    /// Records a draw of this texture at `(x, y)`.
    ///
    /// The destination rectangle takes its size from `params.clip` when given,
    /// otherwise from the full texture. Rendering an unloaded resource is a
    /// safe no-op with a diagnostic.
    pub fn render(&self, list: &mut DrawList, z: ZIndex, x: f32, y: f32, params: &SpriteParams) {
        let Some(loaded) = self.loaded.as_ref() else {
            log::warn!("render called on an unloaded texture; skipping");
            return;
        };

        let (w, h) = match params.clip {
            Some(clip) => (clip.size.x, clip.size.y),
            None => (loaded.width as f32, loaded.height as f32),
        };

        list.push_sprite(
            z,
            SpriteCmd {
                texture: loaded.id,
                dest: Rect::new(x, y, w, h),
                src: params.clip,
                angle_deg: params.angle_deg,
                pivot: params.pivot,
                flip: params.flip,
                tint: self.tint(),
                blend: self.blend,
            },
        );
    }

    /// Like [`render`](Self::render) but stretched to an explicit destination
    /// rectangle instead of the texture's own size.
    pub fn render_to(&self, list: &mut DrawList, z: ZIndex, dest: Rect, params: &SpriteParams) {
        let Some(loaded) = self.loaded.as_ref() else {
            log::warn!("render_to called on an unloaded texture; skipping");
            return;
        };

        list.push_sprite(
            z,
            SpriteCmd {
                texture: loaded.id,
                dest,
                src: params.clip,
                angle_deg: params.angle_deg,
                pivot: params.pivot,
                flip: params.flip,
                tint: self.tint(),
                blend: self.blend,
            },
        );
    }

    fn tint(&self) -> Color {
        Color::from_rgba_u8(
            self.color_mod[0],
            self.color_mod[1],
            self.color_mod[2],
            self.alpha_mod,
        )
    }
}

impl Default for Texture2d {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Texture2d {
    fn drop(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            loaded.queue.defer(loaded.id);
            log::debug!("texture {:?} deferred to release queue on drop", loaded.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::scene::DrawCmd;

    #[derive(Debug, Clone, Eq, PartialEq)]
    enum Event {
        Created(TextureId),
        Destroyed(TextureId),
    }

    /// Handle-counting fake backend.
    #[derive(Default)]
    struct CountingBackend {
        live: HashMap<u32, (u32, u32)>,
        last_upload: Vec<u8>,
        events: Vec<Event>,
        next_id: u32,
        queue: ReleaseQueue,
        fail_next_create: bool,
    }

    impl TextureBackend for CountingBackend {
        fn create_texture(
            &mut self,
            width: u32,
            height: u32,
            premultiplied_rgba: &[u8],
            _label: Option<&str>,
        ) -> Result<TextureId, TextureError> {
            if self.fail_next_create {
                self.fail_next_create = false;
                return Err(TextureError::Upload("simulated device loss".to_string()));
            }
            let id = TextureId(self.next_id);
            self.next_id += 1;
            self.live.insert(id.raw(), (width, height));
            self.last_upload = premultiplied_rgba.to_vec();
            self.events.push(Event::Created(id));
            Ok(id)
        }

        fn destroy_texture(&mut self, id: TextureId) {
            if self.live.remove(&id.raw()).is_some() {
                self.events.push(Event::Destroyed(id));
            }
        }

        fn release_queue(&self) -> ReleaseQueue {
            self.queue.clone()
        }

        fn texture_count(&self) -> usize {
            self.live.len()
        }
    }

    fn checkerboard(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 { [255, 255, 255, 255] } else { [0, 0, 0, 255] }
        })
    }

    fn write_png(dir: &tempfile::TempDir, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        image::RgbaImage::from_fn(w, h, |_, _| image::Rgba([9, 9, 9, 255]))
            .save(&path)
            .unwrap();
        path
    }

    // ── state transitions ─────────────────────────────────────────────────

    #[test]
    fn new_resource_is_unloaded() {
        let tex = Texture2d::new();
        assert!(!tex.is_loaded());
        assert_eq!((tex.width(), tex.height()), (0, 0));
    }

    #[test]
    fn load_from_pixels_records_dimensions() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();

        tex.load_from_pixels(&mut backend, &checkerboard(8, 4)).unwrap();
        assert_eq!((tex.width(), tex.height()), (8, 4));
        assert_eq!(backend.texture_count(), 1);
        tex.release(&mut backend);
    }

    #[test]
    fn release_resets_dimensions_and_is_idempotent() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_pixels(&mut backend, &checkerboard(8, 8)).unwrap();

        tex.release(&mut backend);
        assert_eq!((tex.width(), tex.height()), (0, 0));
        assert_eq!(backend.texture_count(), 0);

        tex.release(&mut backend); // second release is a no-op
        assert_eq!(backend.texture_count(), 0);
    }

    #[test]
    fn render_after_release_is_a_safe_noop() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_pixels(&mut backend, &checkerboard(8, 8)).unwrap();
        tex.release(&mut backend);

        let mut list = DrawList::new();
        tex.render(&mut list, ZIndex::default(), 0.0, 0.0, &SpriteParams::default());
        assert!(list.is_empty());
    }

    #[test]
    fn load_release_load_behaves_like_fresh_load() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();

        tex.load_from_pixels(&mut backend, &checkerboard(8, 8)).unwrap();
        tex.release(&mut backend);
        tex.load_from_pixels(&mut backend, &checkerboard(16, 2)).unwrap();

        assert_eq!((tex.width(), tex.height()), (16, 2));
        assert_eq!(backend.texture_count(), 1);
        tex.release(&mut backend);
    }

    // ── double load / leak prevention ─────────────────────────────────────

    #[test]
    fn second_load_destroys_first_handle_before_creating_second() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();

        tex.load_from_pixels(&mut backend, &checkerboard(4, 4)).unwrap();
        let first = tex.id().unwrap();
        tex.load_from_pixels(&mut backend, &checkerboard(6, 6)).unwrap();
        let second = tex.id().unwrap();

        assert_ne!(first, second);
        assert_eq!(backend.texture_count(), 1);
        assert_eq!(
            backend.events,
            vec![
                Event::Created(first),
                Event::Destroyed(first),
                Event::Created(second),
            ]
        );
        tex.release(&mut backend);
    }

    #[test]
    fn drop_defers_handle_and_flush_destroys_it() {
        let mut backend = CountingBackend::default();

        {
            let mut tex = Texture2d::new();
            tex.load_from_pixels(&mut backend, &checkerboard(4, 4)).unwrap();
            assert_eq!(backend.texture_count(), 1);
        } // tex dropped while loaded

        assert!(!backend.release_queue().is_empty());
        backend.flush_released();
        assert_eq!(backend.texture_count(), 0);
        assert!(backend.release_queue().is_empty());
    }

    // ── file loads ────────────────────────────────────────────────────────

    #[test]
    fn load_from_file_records_image_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "a.png", 64, 64);

        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_file(&mut backend, &path, &LoadOptions::default()).unwrap();

        assert_eq!((tex.width(), tex.height()), (64, 64));
        tex.release(&mut backend);
    }

    #[test]
    fn load_from_missing_file_fails_and_leaves_unloaded() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();

        let result = tex.load_from_file(&mut backend, "missing.png", &LoadOptions::default());
        assert!(matches!(result, Err(TextureError::Decode(_))));
        assert!(!tex.is_loaded());
        assert_eq!((tex.width(), tex.height()), (0, 0));
        assert_eq!(backend.texture_count(), 0);
    }

    #[test]
    fn failed_load_releases_previous_handle() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_pixels(&mut backend, &checkerboard(4, 4)).unwrap();

        let result = tex.load_from_file(&mut backend, "missing.png", &LoadOptions::default());
        assert!(result.is_err());
        assert!(!tex.is_loaded());
        assert_eq!(backend.texture_count(), 0);
    }

    #[test]
    fn upload_failure_leaves_resource_unloaded() {
        let mut backend = CountingBackend::default();
        backend.fail_next_create = true;

        let mut tex = Texture2d::new();
        let result = tex.load_from_pixels(&mut backend, &checkerboard(4, 4));
        assert!(matches!(result, Err(TextureError::Upload(_))));
        assert!(!tex.is_loaded());
    }

    #[test]
    fn color_key_makes_matching_pixels_transparent_in_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyed.png");
        image::RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([0, 255, 255, 255]) // key color
            } else {
                image::Rgba([10, 20, 30, 255])
            }
        })
        .save(&path)
        .unwrap();

        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_file(&mut backend, &path, &LoadOptions::legacy_color_key())
            .unwrap();

        // First pixel keyed out (premultiplied to zero), second untouched.
        assert_eq!(backend.last_upload, vec![0, 0, 0, 0, 10, 20, 30, 255]);
        tex.release(&mut backend);
    }

    // ── draw command generation ───────────────────────────────────────────

    fn single_sprite(list: &mut DrawList) -> SpriteCmd {
        let items = list.items();
        assert_eq!(items.len(), 1);
        match &items[0].cmd {
            DrawCmd::Sprite(cmd) => cmd.clone(),
            other => panic!("expected sprite command, got {:?}", other),
        }
    }

    #[test]
    fn render_full_texture_uses_texture_dimensions() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_pixels(&mut backend, &checkerboard(64, 64)).unwrap();

        let mut list = DrawList::new();
        tex.render(&mut list, ZIndex::default(), 10.0, 10.0, &SpriteParams::default());

        let cmd = single_sprite(&mut list);
        assert_eq!(cmd.dest, Rect::new(10.0, 10.0, 64.0, 64.0));
        assert_eq!(cmd.src, None);
        assert_eq!(cmd.angle_deg, 0.0);
        assert_eq!(cmd.flip, Flip::None);
        tex.release(&mut backend);
    }

    #[test]
    fn render_with_clip_sizes_dest_from_clip() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_pixels(&mut backend, &checkerboard(200, 200)).unwrap();

        let clip = Rect::new(100.0, 0.0, 100.0, 100.0);
        let mut list = DrawList::new();
        tex.render(
            &mut list,
            ZIndex::default(),
            500.0,
            0.0,
            &SpriteParams { clip: Some(clip), ..Default::default() },
        );

        let cmd = single_sprite(&mut list);
        assert_eq!(cmd.dest, Rect::new(500.0, 0.0, 100.0, 100.0));
        assert_eq!(cmd.src, Some(clip));
        tex.release(&mut backend);
    }

    #[test]
    fn alpha_zero_produces_fully_transparent_tint() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_pixels(&mut backend, &checkerboard(8, 8)).unwrap();
        tex.set_alpha(0);

        let mut list = DrawList::new();
        tex.render(&mut list, ZIndex::default(), 0.0, 0.0, &SpriteParams::default());

        assert_eq!(single_sprite(&mut list).tint, Color::transparent());
        tex.release(&mut backend);
    }

    #[test]
    fn color_mod_and_blend_mode_flow_into_the_command() {
        let mut backend = CountingBackend::default();
        let mut tex = Texture2d::new();
        tex.load_from_pixels(&mut backend, &checkerboard(8, 8)).unwrap();
        tex.set_color_mod(255, 0, 0);
        tex.set_blend_mode(BlendMode::Additive);

        let mut list = DrawList::new();
        tex.render(&mut list, ZIndex::default(), 0.0, 0.0, &SpriteParams::default());

        let cmd = single_sprite(&mut list);
        assert_eq!(cmd.tint, Color::from_rgb_u8(255, 0, 0));
        assert_eq!(cmd.blend, BlendMode::Additive);
        tex.release(&mut backend);
    }
}
