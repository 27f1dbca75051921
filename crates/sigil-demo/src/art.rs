//! Procedurally generated demo art, so the binary runs without asset files.

use sigil_engine::pixels::{ColorKey, PixelBuffer};

pub const BG_WIDTH: u32 = 640;
pub const BG_HEIGHT: u32 = 480;

/// Full-window directional plate: tinted background with a white chevron
/// pointing the given way. `dir`: 0 up, 1 down, 2 left, 3 right, 4 neutral.
pub fn direction_plate(dir: u8) -> PixelBuffer {
    let (w, h) = (320u32, 240u32);
    let base: [u8; 4] = match dir {
        0 => [40, 90, 170, 255],
        1 => [170, 90, 40, 255],
        2 => [60, 150, 70, 255],
        3 => [150, 60, 150, 255],
        _ => [90, 90, 90, 255],
    };

    PixelBuffer::from_fn(w, h, |x, y| {
        // Center the chevron, 1/3 of the plate across.
        let cx = (x as i32) - (w as i32) / 2;
        let cy = (y as i32) - (h as i32) / 2;
        let (a, b) = match dir {
            0 => (cy, cx),
            1 => (-cy, cx),
            2 => (cx, cy),
            3 => (-cx, cy),
            _ => return if (cx.abs().max(cy.abs())) < 40 { [235, 235, 235, 255] } else { base },
        };
        let in_chevron = a > -40 && a < 20 && b.abs() < 60 && (a + 40) > b.abs() - 20;
        if in_chevron {
            [235, 235, 235, 255]
        } else {
            base
        }
    })
}

/// Checkerboard used by the plain copy scene.
pub fn checkerboard() -> PixelBuffer {
    PixelBuffer::from_fn(256, 256, |x, y| {
        if ((x / 32) + (y / 32)) % 2 == 0 {
            [200, 200, 200, 255]
        } else {
            [60, 60, 60, 255]
        }
    })
}

/// Landscape background: sky gradient over a ground band.
pub fn background() -> PixelBuffer {
    PixelBuffer::from_fn(BG_WIDTH, BG_HEIGHT, |_, y| {
        let horizon = BG_HEIGHT * 3 / 4;
        if y < horizon {
            let t = y as f32 / horizon as f32;
            [
                (100.0 + 80.0 * t) as u8,
                (160.0 + 60.0 * t) as u8,
                240,
                255,
            ]
        } else {
            [70, 140, 60, 255]
        }
    })
}

/// Stick figure on a cyan field. The field is keyed out before upload, the
/// same way a keyed file load would do it.
pub fn keyed_figure() -> PixelBuffer {
    let (w, h) = (40u32, 52u32);
    let key = ColorKey::LEGACY_CYAN;
    let mut buf = PixelBuffer::from_fn(w, h, |_, _| [key.r, key.g, key.b, 255]);

    let body: [u8; 4] = [40, 40, 40, 255];
    let skin: [u8; 4] = [230, 180, 140, 255];

    buf.fill_rect(14, 2, 12, 12, skin); // head
    buf.fill_rect(16, 14, 8, 18, body); // torso
    buf.fill_rect(6, 16, 10, 4, body); // left arm
    buf.fill_rect(24, 16, 10, 4, body); // right arm
    buf.fill_rect(14, 32, 4, 18, body); // left leg
    buf.fill_rect(22, 32, 4, 18, body); // right leg

    buf.apply_color_key(key);
    buf
}

/// 2x2 sprite sheet of 100x100 colored discs.
pub fn sprite_sheet() -> PixelBuffer {
    let colors: [[u8; 4]; 4] = [
        [220, 60, 60, 255],
        [60, 200, 60, 255],
        [240, 220, 60, 255],
        [70, 90, 220, 255],
    ];

    PixelBuffer::from_fn(200, 200, |x, y| {
        let (cell_x, cell_y) = (x / 100, y / 100);
        let color = colors[(cell_y * 2 + cell_x) as usize];

        let dx = (x % 100) as i32 - 50;
        let dy = (y % 100) as i32 - 50;
        if dx * dx + dy * dy <= 45 * 45 {
            color
        } else {
            [0, 0, 0, 0]
        }
    })
}

/// Vertical red/green/blue bars for the color modulation scene.
pub fn color_bars() -> PixelBuffer {
    PixelBuffer::from_fn(240, 160, |x, _| match x / 80 {
        0 => [255, 40, 40, 255],
        1 => [40, 255, 40, 255],
        _ => [40, 40, 255, 255],
    })
}

/// Opaque backdrop for the alpha fade scene.
pub fn fade_backdrop() -> PixelBuffer {
    PixelBuffer::from_fn(320, 240, |x, y| {
        if ((x / 20) + (y / 20)) % 2 == 0 {
            [180, 120, 40, 255]
        } else {
            [120, 70, 20, 255]
        }
    })
}

/// Foreground plate whose alpha is animated over the backdrop.
pub fn fade_overlay() -> PixelBuffer {
    PixelBuffer::from_fn(320, 240, |x, y| {
        if ((x / 20) + (y / 20)) % 2 == 0 {
            [40, 120, 180, 255]
        } else {
            [20, 70, 120, 255]
        }
    })
}
