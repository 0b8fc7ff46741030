//! Builtin mode-cursor images for the `nein` profile.
//!
//! The original cursor set ships as embedded plan 9 bitmaps; these are
//! procedurally drawn stand-ins so the engine can upload a complete set at
//! startup without carrying binary assets. A seat layer with its own theme
//! may upload replacements afterwards.

use crate::seat::CursorKind;

pub const CURSOR_SIZE: u32 = 16;

const WHITE: u32 = 0xffff_ffff;
const BLACK: u32 = 0xff00_0000;

pub struct CursorImage {
    pub pixels: Vec<u32>,
    pub width: u32,
    pub height: u32,
    pub hotspot_x: i32,
    pub hotspot_y: i32,
}

impl CursorImage {
    fn new(hotspot_x: i32, hotspot_y: i32) -> Self {
        Self {
            pixels: vec![0; (CURSOR_SIZE * CURSOR_SIZE) as usize],
            width: CURSOR_SIZE,
            height: CURSOR_SIZE,
            hotspot_x,
            hotspot_y,
        }
    }

    fn set(&mut self, x: i32, y: i32, color: u32) {
        let size = CURSOR_SIZE as i32;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            self.pixels[(y * size + x) as usize] = color;
        }
    }
}

/// The full image set for the compositor cursor plane, hotspots included.
pub fn theme_images() -> Vec<(CursorKind, CursorImage)> {
    vec![
        (CursorKind::Default, arrow()),
        (CursorKind::Box, boxed()),
        (CursorKind::Cross, cross()),
        (CursorKind::Sight, sight()),
        (CursorKind::Up, up()),
        (CursorKind::Down, down()),
    ]
}

/// Wedge pointing at the top-left hotspot.
fn arrow() -> CursorImage {
    let mut image = CursorImage::new(0, 0);
    for y in 0..12 {
        for x in 0..=y.min(7) {
            image.set(x, y, WHITE);
        }
        image.set(y.min(7) + 1, y, BLACK);
    }
    image
}

/// Hollow square, hotspot centered.
fn boxed() -> CursorImage {
    let mut image = CursorImage::new(8, 8);
    for i in 2..14 {
        image.set(i, 2, WHITE);
        image.set(i, 13, WHITE);
        image.set(2, i, WHITE);
        image.set(13, i, WHITE);
    }
    image
}

/// Crosshair through the hotspot.
fn cross() -> CursorImage {
    let mut image = CursorImage::new(8, 8);
    for i in 1..15 {
        image.set(i, 8, WHITE);
        image.set(8, i, WHITE);
    }
    image.set(8, 8, BLACK);
    image
}

/// Ring with a center dot.
fn sight() -> CursorImage {
    let mut image = CursorImage::new(8, 8);
    for y in 0..16 {
        for x in 0..16 {
            let dx = x - 8;
            let dy = y - 8;
            let d = dx * dx + dy * dy;
            if (27..=45).contains(&d) {
                image.set(x, y, WHITE);
            }
        }
    }
    image.set(8, 8, WHITE);
    image
}

/// Triangle pointing up, hotspot at the apex.
fn up() -> CursorImage {
    let mut image = CursorImage::new(8, 0);
    for y in 1..12 {
        let half = y / 2;
        for x in (8 - half)..=(8 + half) {
            image.set(x, y, WHITE);
        }
    }
    image
}

/// Triangle pointing down, hotspot at the apex.
fn down() -> CursorImage {
    let mut image = CursorImage::new(8, 15);
    for y in 1..12 {
        let half = y / 2;
        for x in (8 - half)..=(8 + half) {
            image.set(x, 15 - y, WHITE);
        }
    }
    image
}
