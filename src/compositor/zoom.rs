//! Pixel-accurate zoom composite.
//!
//! When zoom is active, per-view damage no longer maps to screen pixels,
//! so the whole screen is rebuilt in a mappable buffer: background at
//! native scale, then every view scaled about the screen center with
//! bilinearly filtered blits and solid scaled border rings. The result is
//! copied to the scanout target in one region copy.

use log::debug;
use tiny_skia::{FilterQuality, PixmapPaint, Transform};

use crate::render::software::{argb_from_pixmap, pixmap_from_argb};
use crate::render::{BufferFlags, BufferRef, Format};
use crate::screen::Screen;
use crate::util::{Id, Rect, Region};

use super::Compositor;

impl Compositor {
    /// Composites one screen at the current zoom level into a fresh
    /// mappable buffer. Returns `None` when allocation or mapping fails;
    /// the frame is skipped.
    pub(super) fn render_zoomed(&mut self, id: Id<Screen>) -> Option<BufferRef> {
        let zoom = self.zoom;
        let screen = self.screens.get(id)?;
        let geometry = screen.geometry;
        let width = geometry.width;
        let height = geometry.height;
        let cx = geometry.x + width as i32 / 2;
        let cy = geometry.y + height as i32 / 2;

        let buffer = self
            .shm
            .create_buffer(
                width,
                height,
                Format::Xrgb8888,
                BufferFlags {
                    map: true,
                    scanout: false,
                },
            )
            .ok()?;
        self.shm.set_target_buffer(&buffer).ok()?;

        let full = Region::from_rect(Rect::new(0, 0, width, height));
        match &self.wallpaper {
            Some(wallpaper) => {
                let wallpaper = wallpaper.clone();
                self.shm.copy_region(&wallpaper, 0, 0, &full);
            }
            None => self.shm.fill_region(self.background_color, &full),
        }
        self.shm.flush();

        let mut pixmap = {
            let words = buffer.map().ok()?;
            pixmap_from_argb(&words, width, height)?
        };

        for i in (0..self.stack.len()).rev() {
            let vid = self.stack[i];
            let Some(view) = self.views.get(vid) else {
                continue;
            };
            if !view.visible {
                continue;
            }

            // Prefer the render buffer; fall back to the client buffer when
            // the proxy is not CPU-readable.
            let src = match &view.buffer {
                Some(buffer) if self.shm.capabilities(buffer).read => Some(buffer.clone()),
                _ => self
                    .surfaces
                    .get(view.surface)
                    .and_then(|s| s.buffer.clone()),
            };
            let Some(src) = src else {
                continue;
            };

            let geom = view.geometry;
            let zoomed_x = (geom.x - cx) as f32 * zoom + width as f32 / 2.0;
            let zoomed_y = (geom.y - cy) as f32 * zoom + height as f32 / 2.0;
            let zoomed_w = geom.width as f32 * zoom;
            let zoomed_h = geom.height as f32 * zoom;

            let border_out = view.border.outer_width as f32 * zoom;
            let border_in = view.border.inner_width as f32 * zoom;
            let total_border = border_out + border_in;

            // Frustum cull against the destination buffer.
            if zoomed_x + zoomed_w + total_border < 0.0
                || zoomed_x - total_border >= width as f32
                || zoomed_y + zoomed_h + total_border < 0.0
                || zoomed_y - total_border >= height as f32
            {
                continue;
            }

            if view.border.outer_width > 0 && border_out >= 1.0 {
                fill_ring(
                    &mut pixmap,
                    zoomed_x - total_border,
                    zoomed_y - total_border,
                    zoomed_w + 2.0 * total_border,
                    zoomed_h + 2.0 * total_border,
                    border_out,
                    view.border.outer_color,
                );
            }

            if view.border.inner_width > 0 && border_in >= 1.0 {
                fill_ring(
                    &mut pixmap,
                    zoomed_x - border_in,
                    zoomed_y - border_in,
                    zoomed_w + 2.0 * border_in,
                    zoomed_h + 2.0 * border_in,
                    border_in,
                    view.border.inner_color,
                );
            }

            let src_pixmap = {
                let Ok(words) = src.map() else {
                    continue;
                };
                match pixmap_from_argb(&words, src.width, src.height) {
                    Some(p) => p,
                    None => continue,
                }
            };

            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            pixmap.draw_pixmap(
                0,
                0,
                src_pixmap.as_ref(),
                &paint,
                Transform::from_scale(zoom, zoom).post_translate(zoomed_x, zoomed_y),
                None,
            );
        }

        match buffer.map_mut() {
            Ok(mut words) => argb_from_pixmap(&pixmap, &mut words),
            Err(err) => {
                debug!("zoom composite writeback failed: {}", err);
                return None;
            }
        }

        Some(buffer)
    }
}

/// Fills a hollow rectangle of thickness `t` as four solid rectangles.
fn fill_ring(pixmap: &mut tiny_skia::Pixmap, x: f32, y: f32, w: f32, h: f32, t: f32, color: u32) {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(
        (color >> 16) as u8,
        (color >> 8) as u8,
        color as u8,
        0xff,
    );
    paint.anti_alias = false;

    let mut fill = |rx: f32, ry: f32, rw: f32, rh: f32| {
        if let Some(rect) = tiny_skia::Rect::from_xywh(rx, ry, rw, rh) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    };

    fill(x, y, w, t);
    fill(x, y + h - t, w, t);
    fill(x, y + t, t, h - 2.0 * t);
    fill(x + w - t, y + t, t, h - 2.0 * t);
}
