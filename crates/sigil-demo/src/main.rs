//! Keyboard-driven texture demo.
//!
//! Each key selects a scene exercising one part of the engine:
//! arrows — per-key stretched plates, `P` the loaded image, `R` a plain copy,
//! `G` geometry, `V` viewports, `C` color keying, `S` sprite sheet clips,
//! `M` color modulation, `A` alpha fade. Escape exits.
//!
//! Pass an image path on the command line to view it in the `P` scene.

mod art;

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use sigil_engine::coords::{Rect, Vec2};
use sigil_engine::core::{App, AppControl, FrameCtx};
use sigil_engine::device::GpuInit;
use sigil_engine::logging::{init_logging, LoggingConfig};
use sigil_engine::paint::Color;
use sigil_engine::render::shapes::{RectRenderer, SpriteRenderer};
use sigil_engine::render::GpuTextureStore;
use sigil_engine::scene::{BlendMode, DrawList, ZIndex};
use sigil_engine::text::{FontId, FontSystem};
use sigil_engine::texture::{LoadOptions, SpriteParams, Texture2d};
use sigil_engine::window::{Runtime, RuntimeConfig};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Scene {
    Stretch(u8), // 0 up, 1 down, 2 left, 3 right, 4 neutral
    Image,
    PlainCopy,
    Geometry,
    Viewports,
    ColorKey,
    SpriteSheet,
    ColorMod,
    AlphaFade,
}

struct Assets {
    plates: [Texture2d; 5],
    image: Texture2d,
    checker: Texture2d,
    background: Texture2d,
    figure: Texture2d,
    sheet: Texture2d,
    bars: Texture2d,
    fade_back: Texture2d,
    fade_front: Texture2d,
    caption: Texture2d,
}

/// GPU-bound state, created lazily on the first frame.
struct Gfx {
    store: GpuTextureStore,
    sprites: SpriteRenderer,
    rects: RectRenderer,
    assets: Assets,
}

struct DemoApp {
    image_path: Option<String>,
    scene: Scene,
    list: DrawList,
    gfx: Option<Gfx>,

    // Animation state for the modulation and fade scenes.
    mod_red: f32,
    fade_alpha: f32,
    fade_rising: bool,
}

impl DemoApp {
    fn new(image_path: Option<String>) -> Self {
        Self {
            image_path,
            scene: Scene::Stretch(4),
            list: DrawList::new(),
            gfx: None,
            mod_red: 255.0,
            fade_alpha: 255.0,
            fade_rising: false,
        }
    }

    fn build_gfx(&self, ctx: &FrameCtx<'_, '_>) -> Result<Gfx> {
        let mut store =
            GpuTextureStore::new(ctx.gpu.device().clone(), ctx.gpu.queue().clone());

        let load = |store: &mut GpuTextureStore,
                    pixels: &sigil_engine::pixels::PixelBuffer|
         -> Result<Texture2d> {
            let mut tex = Texture2d::new();
            tex.load_from_pixels(store, pixels)?;
            Ok(tex)
        };

        let plates = [
            load(&mut store, &art::direction_plate(0))?,
            load(&mut store, &art::direction_plate(1))?,
            load(&mut store, &art::direction_plate(2))?,
            load(&mut store, &art::direction_plate(3))?,
            load(&mut store, &art::direction_plate(4))?,
        ];

        // The viewed image: a file if one was given, procedural otherwise.
        let mut image = Texture2d::new();
        let mut from_file = false;
        if let Some(path) = &self.image_path {
            from_file = image
                .load_from_file(&mut store, path, &LoadOptions::legacy_color_key())
                .is_ok();
        }
        if !from_file {
            image.load_from_pixels(&mut store, &art::checkerboard())?;
        }

        let assets = Assets {
            plates,
            image,
            checker: load(&mut store, &art::checkerboard())?,
            background: load(&mut store, &art::background())?,
            figure: load(&mut store, &art::keyed_figure())?,
            sheet: load(&mut store, &art::sprite_sheet())?,
            bars: load(&mut store, &art::color_bars())?,
            fade_back: load(&mut store, &art::fade_backdrop())?,
            fade_front: load(&mut store, &art::fade_overlay())?,
            caption: load_caption(&mut store),
        };

        Ok(Gfx {
            store,
            sprites: SpriteRenderer::new(),
            rects: RectRenderer::new(),
            assets,
        })
    }

    fn advance_animation(&mut self, dt: f32) {
        // Red channel ramps down and wraps, like holding the decrement key.
        self.mod_red -= 60.0 * dt;
        if self.mod_red < 0.0 {
            self.mod_red = 255.0;
        }

        // Alpha bounces between fully transparent and opaque.
        let step = 120.0 * dt;
        if self.fade_rising {
            self.fade_alpha += step;
            if self.fade_alpha >= 255.0 {
                self.fade_alpha = 255.0;
                self.fade_rising = false;
            }
        } else {
            self.fade_alpha -= step;
            if self.fade_alpha <= 0.0 {
                self.fade_alpha = 0.0;
                self.fade_rising = true;
            }
        }
    }

    fn record_scene(&mut self, width: f32, height: f32) {
        self.list.clear();
        let full = Rect::new(0.0, 0.0, width, height);
        let z = ZIndex::new(0);
        let params = SpriteParams::default();

        let Some(gfx) = self.gfx.as_mut() else { return };
        let assets = &mut gfx.assets;

        match self.scene {
            Scene::Stretch(dir) => {
                assets.plates[(dir as usize).min(4)].render_to(&mut self.list, z, full, &params);
            }

            Scene::Image => {
                assets.image.render_to(&mut self.list, z, full, &params);
            }

            Scene::PlainCopy => {
                // Unscaled copy at its natural size, centered.
                let (w, h) = (assets.checker.width() as f32, assets.checker.height() as f32);
                let x = (width - w) / 2.0;
                let y = (height - h) / 2.0;
                assets.checker.render(&mut self.list, z, x, y, &params);
            }

            Scene::Geometry => record_geometry(&mut self.list, z, width, height),

            Scene::Viewports => {
                // Same image squeezed into three sub-regions.
                let regions = [
                    Rect::new(0.0, 0.0, width / 2.0, height / 2.0),
                    Rect::new(width / 2.0, 0.0, width / 2.0, height / 2.0),
                    Rect::new(0.0, height / 2.0, width, height / 2.0),
                ];
                for region in regions {
                    self.list.push_viewport(region);
                    assets.image.render_to(&mut self.list, z, region, &params);
                    self.list.pop_viewport();
                }
            }

            Scene::ColorKey => {
                assets.background.render_to(&mut self.list, z, full, &params);
                let scale = 3.0;
                let dest = Rect::new(
                    width / 2.0 - assets.figure.width() as f32 * scale / 2.0,
                    height * 0.75 - assets.figure.height() as f32 * scale,
                    assets.figure.width() as f32 * scale,
                    assets.figure.height() as f32 * scale,
                );
                assets.figure.render_to(&mut self.list, ZIndex::new(1), dest, &params);
            }

            Scene::SpriteSheet => {
                let cell = 100.0;
                let clips = [
                    Rect::new(0.0, 0.0, cell, cell),
                    Rect::new(cell, 0.0, cell, cell),
                    Rect::new(0.0, cell, cell, cell),
                    Rect::new(cell, cell, cell, cell),
                ];
                let corners = [
                    Vec2::new(0.0, 0.0),
                    Vec2::new(width - cell, 0.0),
                    Vec2::new(0.0, height - cell),
                    Vec2::new(width - cell, height - cell),
                ];
                for (clip, corner) in clips.into_iter().zip(corners) {
                    assets.sheet.render_to(
                        &mut self.list,
                        z,
                        Rect::from_origin_size(corner, Vec2::new(cell, cell)),
                        &SpriteParams {
                            clip: Some(clip),
                            ..Default::default()
                        },
                    );
                }
            }

            Scene::ColorMod => {
                assets.bars.set_color_mod(self.mod_red as u8, 255, 255);
                let (w, h) = (assets.bars.width() as f32, assets.bars.height() as f32);
                assets
                    .bars
                    .render(&mut self.list, z, (width - w) / 2.0, (height - h) / 2.0, &params);
            }

            Scene::AlphaFade => {
                assets.fade_back.render_to(&mut self.list, z, full, &params);
                assets.fade_front.set_alpha(self.fade_alpha as u8);
                assets.fade_front.set_blend_mode(BlendMode::Alpha);
                assets
                    .fade_front
                    .render_to(&mut self.list, ZIndex::new(1), full, &params);
            }
        }

        // Caption overlay on every scene, when a font was found.
        if assets.caption.is_loaded() {
            assets
                .caption
                .render(&mut self.list, ZIndex::new(10), 8.0, 8.0, &params);
        }
    }
}

impl App for DemoApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed {
            return AppControl::Continue;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return AppControl::Continue;
        };

        self.scene = match code {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::ArrowUp => Scene::Stretch(0),
            KeyCode::ArrowDown => Scene::Stretch(1),
            KeyCode::ArrowLeft => Scene::Stretch(2),
            KeyCode::ArrowRight => Scene::Stretch(3),
            KeyCode::KeyP => Scene::Image,
            KeyCode::KeyR => Scene::PlainCopy,
            KeyCode::KeyG => Scene::Geometry,
            KeyCode::KeyV => Scene::Viewports,
            KeyCode::KeyC => Scene::ColorKey,
            KeyCode::KeyS => Scene::SpriteSheet,
            KeyCode::KeyM => Scene::ColorMod,
            KeyCode::KeyA => Scene::AlphaFade,
            _ => self.scene,
        };
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.gfx.is_none() {
            match self.build_gfx(ctx) {
                Ok(gfx) => self.gfx = Some(gfx),
                Err(e) => {
                    log::error!("failed to build demo textures: {e:#}");
                    return AppControl::Exit;
                }
            }
        }

        self.advance_animation(ctx.time.dt);

        let (width, height) = ctx.window.logical_size();
        self.record_scene(width, height);

        let Some(gfx) = self.gfx.as_mut() else {
            return AppControl::Continue;
        };
        let (list, rects, sprites, store) = (
            &mut self.list,
            &mut gfx.rects,
            &mut gfx.sprites,
            &mut gfx.store,
        );

        ctx.render(clear_color(self.scene), |rctx, target| {
            rects.render(rctx, target, list);
            sprites.render(rctx, target, list, store);
        })
    }
}

/// Backdrop for a scene. White everywhere: the geometry and sprite-sheet
/// scenes draw unfilled regions and rely on a light background.
fn clear_color(scene: Scene) -> Color {
    match scene {
        Scene::Stretch(_)
        | Scene::Image
        | Scene::PlainCopy
        | Scene::Geometry
        | Scene::Viewports
        | Scene::ColorKey
        | Scene::SpriteSheet
        | Scene::ColorMod
        | Scene::AlphaFade => Color::white(),
    }
}

/// Records the geometry scene: filled rect, outlined rect, a diagonal line
/// from the bottom-left to the top-right corner, and a dotted vertical line.
fn record_geometry(list: &mut DrawList, z: ZIndex, width: f32, height: f32) {
    // Filled red rect in the middle.
    list.push_solid_rect(
        z,
        Rect::new(width / 4.0, height / 4.0, width / 2.0, height / 2.0),
        Color::from_rgb_u8(255, 0, 0),
    );
    // Green outline around it.
    list.push_outline_rect(
        z,
        Rect::new(width / 6.0, height / 6.0, width * 2.0 / 3.0, height * 2.0 / 3.0),
        Color::from_rgb_u8(0, 255, 0),
    );
    // Blue diagonal, bottom-left to top-right.
    list.push_line(
        z,
        Vec2::new(0.0, height),
        Vec2::new(width, 0.0),
        2.0,
        Color::from_rgb_u8(0, 0, 255),
    );
    // Dotted vertical yellow line.
    let mut y = 0.0;
    while y < height {
        list.push_solid_rect(
            z,
            Rect::new(width / 2.0, y, 1.0, 1.0),
            Color::from_rgb_u8(255, 255, 0),
        );
        y += 4.0;
    }
}

/// Tries to rasterize the caption from a commonly installed TTF. The result
/// stays unloaded when no font is found, and the overlay is simply skipped.
fn load_caption(store: &mut GpuTextureStore) -> Texture2d {
    const CANDIDATES: [&str; 3] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ];

    let mut caption = Texture2d::new();

    for path in CANDIDATES {
        let Ok(bytes) = std::fs::read(path) else { continue };

        let mut fonts = FontSystem::new();
        let font: FontId = match fonts.load_font(&bytes) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("unusable font {path}: {e}");
                continue;
            }
        };

        let ok = caption
            .load_from_text(
                store,
                &fonts,
                font,
                "arrows/P/R/G/V/C/S/M/A to switch, Esc quits",
                18.0,
                [0, 0, 0],
            )
            .is_ok();
        if ok {
            break;
        }
    }

    caption
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let image_path = std::env::args().nth(1);
    if let Some(path) = &image_path {
        log::info!("viewing image: {path}");
    }

    Runtime::run(
        RuntimeConfig {
            title: "sigil demo".to_string(),
            initial_size: winit::dpi::LogicalSize::new(640.0, 480.0),
        },
        GpuInit::default(),
        DemoApp::new(image_path),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_engine::scene::DrawCmd;

    fn rects_of_color(list: &DrawList, color: Color) -> Vec<Rect> {
        list.items()
            .iter()
            .filter_map(|item| match &item.cmd {
                DrawCmd::Rect(cmd) if cmd.color == color => Some(cmd.rect),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn geometry_diagonal_runs_corner_to_corner() {
        let (width, height) = (640.0, 480.0);
        let mut list = DrawList::new();
        record_geometry(&mut list, ZIndex::new(0), width, height);

        let blue = rects_of_color(&list, Color::from_rgb_u8(0, 0, 255));
        assert!(blue.len() > 2, "diagonal should be a strip, not one rect");

        assert!(blue.iter().any(|r| r.contains(Vec2::new(0.5, height - 0.5))));
        assert!(blue.iter().any(|r| r.contains(Vec2::new(width - 0.5, 0.5))));

        for r in &blue {
            let c = r.center();
            assert!(
                (c.x / width + c.y / height - 1.0).abs() < 0.01,
                "dot center {c:?} is off the bottom-left to top-right diagonal"
            );
        }
    }

    #[test]
    fn scenes_clear_to_white() {
        assert_eq!(clear_color(Scene::Geometry), Color::white());
        assert_eq!(clear_color(Scene::SpriteSheet), Color::white());
        assert_eq!(clear_color(Scene::Stretch(4)), Color::white());
    }
}
