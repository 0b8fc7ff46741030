//! Selection overlay.
//!
//! A single optional hollow rectangle drawn above all views during the
//! select chord. It is not a view: it has no surface and only participates
//! in damage.

use crate::util::{Rect, span_u32};

use super::{ALL_SCREENS, Compositor};

#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay {
    pub active: bool,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: u32,
    pub border_width: u32,
}

impl Overlay {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl Compositor {
    /// Draws or updates the overlay box given two opposite corners in
    /// global coordinates.
    pub fn overlay_set_box(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: u32,
        border_width: u32,
    ) {
        let x = x1.min(x2);
        let y = y1.min(y2);
        let width = span_u32(x, x1.max(x2));
        let height = span_u32(y, y1.max(y2));
        let border_width = border_width.max(1);

        if self.overlay.active {
            let rect = self.overlay.rect();
            self.damage.union_rect(rect);
        }

        self.overlay = Overlay {
            active: true,
            x,
            y,
            width,
            height,
            color,
            border_width,
        };

        self.damage.union_rect(self.overlay.rect());
        self.schedule_update(ALL_SCREENS);
    }

    /// Removes the overlay, if any.
    pub fn overlay_clear(&mut self) {
        if !self.overlay.active {
            return;
        }
        let rect = self.overlay.rect();
        self.damage.union_rect(rect);
        self.overlay.active = false;
        self.schedule_update(ALL_SCREENS);
    }
}
