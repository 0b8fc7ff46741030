//! Per-screen repaint pass.
//!
//! The region temporaries here live in [`super::PaintScratch`] and are
//! taken out for the duration of a computation, so a stable screen set
//! repaints without allocating.

use log::debug;

use crate::screen::Screen;
use crate::util::{Id, Rect, Region};

use super::{Compositor, View};

impl Compositor {
    /// Repaints one screen if it is scheduled and not awaiting a flip, then
    /// swaps buffers. Damage for flip-blocked screens is still recorded in
    /// the target so nothing is lost while waiting.
    pub(super) fn update_screen(&mut self, id: Id<Screen>) {
        let Some(screen) = self.screens.get(id) else {
            return;
        };
        let (mask, target, geometry) = (screen.mask, screen.target, screen.geometry);

        if self.scheduled_updates & mask == 0 {
            return;
        }

        // Record this batch's damage with the target; it accumulates across
        // frames that have not been presented yet.
        let mut screen_damage = std::mem::take(&mut self.scratch.screen_damage);
        let mut total_damage = std::mem::take(&mut self.scratch.total_damage);
        screen_damage.copy_from(&self.damage);
        screen_damage.intersect_rect(geometry);
        screen_damage.translate(-geometry.x, -geometry.y);
        self.scanout
            .target_damage(target, &screen_damage, &mut total_damage);
        self.scratch.screen_damage = screen_damage;

        // Don't repaint the screen while it waits for a page flip.
        if self.pending_flips & mask != 0 {
            self.scratch.total_damage = total_damage;
            return;
        }

        if self.zoom != 1.0 {
            self.scratch.total_damage = total_damage;
            let Some(zoomed) = self.render_zoomed(id) else {
                return;
            };
            let mut full = std::mem::take(&mut self.scratch.screen_damage);
            full.reset_rect(Rect::new(0, 0, geometry.width, geometry.height));
            if self.scanout.set_target_surface(target).is_err() {
                self.scratch.screen_damage = full;
                return;
            }
            self.scanout.copy_region(&zoomed, 0, 0, &full);
            self.scanout.flush();
            self.scratch.screen_damage = full;
        } else {
            // Total damage is screen-local; lift it back to global
            // coordinates for the view walk.
            total_damage.translate(geometry.x, geometry.y);
            let mut base_damage = std::mem::take(&mut self.scratch.base_damage);
            base_damage.copy_from(&total_damage);
            base_damage.subtract(&self.opaque);
            self.repaint(id, &total_damage, &mut base_damage);
            self.scratch.base_damage = base_damage;
            self.scratch.total_damage = total_damage;
        }

        self.swap_screen(id);
    }

    fn repaint(&mut self, id: Id<Screen>, damage: &Region, base_damage: &mut Region) {
        let Some(screen) = self.screens.get(id) else {
            return;
        };
        let (mask, target, geometry) = (screen.mask, screen.target, screen.geometry);

        debug!(
            "Rendering to target {{ x: {}, y: {}, w: {}, h: {} }}",
            geometry.x, geometry.y, geometry.width, geometry.height
        );

        if self.scanout.set_target_surface(target).is_err() {
            return;
        }

        // Base layer under all views: wallpaper if present, else the
        // background color, restricted to damage not covered by opaque
        // content.
        if !base_damage.is_empty() {
            base_damage.translate(-geometry.x, -geometry.y);
            match &self.wallpaper {
                Some(wallpaper) => {
                    let wallpaper = wallpaper.clone();
                    self.scanout.copy_region(&wallpaper, 0, 0, base_damage);
                }
                None => self.scanout.fill_region(self.background_color, base_damage),
            }
        }

        // Back-to-front so translucent content stacks correctly.
        for i in (0..self.stack.len()).rev() {
            let vid = self.stack[i];
            let visible_here = self
                .views
                .get(vid)
                .map(|v| v.visible && v.screens & mask != 0)
                .unwrap_or(false);
            if visible_here {
                self.repaint_view(geometry, vid, damage);
            }
        }

        self.draw_overlay(geometry);
        self.scanout.flush();
    }

    /// Blits one view's damaged content and fills its border rings.
    fn repaint_view(&mut self, screen_geometry: Rect, vid: Id<View>, damage: &Region) {
        let Some(view) = self.views.get(vid) else {
            return;
        };
        let Some(buffer) = view.buffer.clone() else {
            return;
        };
        let geometry = view.geometry;
        let extents = view.extents_rect();
        let inner_width = view.border.inner_width;
        let outer_width = view.border.outer_width;
        let inner_color = view.border.inner_color;
        let outer_color = view.border.outer_color;

        let mut view_damage = std::mem::take(&mut self.scratch.view_damage);
        let mut border_damage = std::mem::take(&mut self.scratch.border_damage);
        let mut outer_ring = std::mem::take(&mut self.scratch.outer_ring);
        let mut inner_ring = std::mem::take(&mut self.scratch.inner_ring);

        view_damage.reset_rect(extents);
        view_damage.intersect(damage);
        view_damage.subtract(&view.clip);

        border_damage.copy_from(&view_damage);
        border_damage.subtract_rect(geometry);
        view_damage.intersect_rect(geometry);

        if !view_damage.is_empty() {
            view_damage.translate(-geometry.x, -geometry.y);
            self.scanout.copy_region(
                &buffer,
                geometry.x - screen_geometry.x,
                geometry.y - screen_geometry.y,
                &view_damage,
            );
        }

        // Split the frame into the outer ring (outside the inner-expanded
        // rectangle) and the inner ring (between it and the content).
        let inner_rect = geometry.inflated(inner_width);

        outer_ring.copy_from(&border_damage);
        outer_ring.subtract_rect(inner_rect);

        inner_ring.reset_rect(inner_rect);
        inner_ring.subtract_rect(geometry);
        inner_ring.intersect(&border_damage);

        if outer_width > 0 && !outer_ring.is_empty() {
            outer_ring.translate(-screen_geometry.x, -screen_geometry.y);
            self.scanout.fill_region(outer_color, &outer_ring);
        }

        if inner_width > 0 && !inner_ring.is_empty() {
            inner_ring.translate(-screen_geometry.x, -screen_geometry.y);
            self.scanout.fill_region(inner_color, &inner_ring);
        }

        self.scratch.view_damage = view_damage;
        self.scratch.border_damage = border_damage;
        self.scratch.outer_ring = outer_ring;
        self.scratch.inner_ring = inner_ring;
    }

    /// Draws the overlay as four filled rectangles clipped to the screen.
    fn draw_overlay(&mut self, screen_geometry: Rect) {
        let overlay = self.overlay;
        if !overlay.active || overlay.border_width == 0 {
            return;
        }
        let (w, h) = (overlay.width, overlay.height);
        if w == 0 || h == 0 {
            return;
        }
        let bw = overlay.border_width.min(w).min(h);
        let x = overlay.x - screen_geometry.x;
        let y = overlay.y - screen_geometry.y;
        let clip_w = screen_geometry.width as i32;
        let clip_h = screen_geometry.height as i32;

        let mut draw_clipped = |rx: i32, ry: i32, rw: i32, rh: i32| {
            let x1 = rx.max(0);
            let y1 = ry.max(0);
            let x2 = (rx + rw).min(clip_w);
            let y2 = (ry + rh).min(clip_h);
            if x2 > x1 && y2 > y1 {
                self.scanout.fill_rectangle(
                    overlay.color,
                    x1,
                    y1,
                    (x2 - x1) as u32,
                    (y2 - y1) as u32,
                );
            }
        };

        draw_clipped(x, y, w as i32, bw as i32);
        draw_clipped(x, y + h as i32 - bw as i32, w as i32, bw as i32);
        draw_clipped(x, y, bw as i32, h as i32);
        draw_clipped(x + w as i32 - bw as i32, y, bw as i32, h as i32);
    }
}
