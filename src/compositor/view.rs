//! Per-surface visual records and their lifecycle operations.
//!
//! A view is the painted form of one surface: geometry, the buffer the
//! repaint reads (the client buffer or a proxy copy), the double border,
//! clip region, and stacking membership. Only views carrying a window
//! record participate in focus and stacking policy; subsurface views hang
//! off a parent handle instead.

use log::debug;

use crate::engine::wm::Window;
use crate::render::{BufferFlags, BufferRef, RenderError};
use crate::surface::Surface;
use crate::util::{Box32, Id, Rect, Region, clamp_i32, span_u32};

use super::Compositor;

/// Two concentric frames around the content rectangle.
#[derive(Debug, Clone, Default)]
pub struct Border {
    pub outer_width: u32,
    pub outer_color: u32,
    pub damaged_outer: bool,
    pub inner_width: u32,
    pub inner_color: u32,
    pub damaged_inner: bool,
}

impl Border {
    /// Combined ring width on one side.
    pub fn total(&self) -> u32 {
        self.outer_width.saturating_add(self.inner_width)
    }
}

pub struct View {
    pub surface: Id<Surface>,
    /// Buffer the repaint reads. Differs from the surface's buffer when a
    /// proxy copy is in use.
    pub buffer: Option<BufferRef>,
    pub window: Option<Id<Window>>,
    pub parent: Option<Id<View>>,
    /// Parent-relative offset for subsurface views.
    pub sub_offset: (i32, i32),
    pub visible: bool,
    pub geometry: Rect,
    /// Geometry expanded by both border rings, saturating.
    pub extents: Box32,
    /// Opaque area of everything above this view in stacking order.
    pub clip: Region,
    /// Mask of screens the extents intersect.
    pub screens: u32,
    pub border: Border,
}

impl View {
    pub fn new(surface: Id<Surface>) -> Self {
        Self {
            surface,
            buffer: None,
            window: None,
            parent: None,
            sub_offset: (0, 0),
            visible: false,
            geometry: Rect::default(),
            extents: Box32::default(),
            clip: Region::new(),
            screens: 0,
            border: Border::default(),
        }
    }

    /// Recomputes the extents from geometry and border widths and marks
    /// both rings damaged.
    pub fn update_extents(&mut self) {
        let total = self.border.total() as i64;
        let x = self.geometry.x as i64;
        let y = self.geometry.y as i64;
        let w = self.geometry.width as i64;
        let h = self.geometry.height as i64;

        self.extents.x1 = clamp_i32(x - total);
        self.extents.y1 = clamp_i32(y - total);
        self.extents.x2 = clamp_i32(x + w + total);
        self.extents.y2 = clamp_i32(y + h + total);

        if self.extents.x2 < self.extents.x1 {
            self.extents.x2 = self.extents.x1;
        }
        if self.extents.y2 < self.extents.y1 {
            self.extents.y2 = self.extents.y1;
        }

        self.border.damaged_outer = true;
        self.border.damaged_inner = true;
    }

    pub fn extents_rect(&self) -> Rect {
        Rect {
            x: self.extents.x1,
            y: self.extents.y1,
            width: span_u32(self.extents.x1, self.extents.x2),
            height: span_u32(self.extents.y1, self.extents.y2),
        }
    }
}

impl Compositor {
    /// Creates a view for `surface` at the top of the stack.
    pub fn create_view(&mut self, surface: Id<Surface>) -> Option<Id<View>> {
        if !self.surfaces.contains(surface) {
            return None;
        }
        let id = self.views.insert(View::new(surface));
        self.stack.insert(0, id);
        if let Some(s) = self.surfaces.get_mut(surface) {
            s.view = Some(id);
        }
        Some(id)
    }

    /// Destroys a view: unlinks children, hides it, drops the record.
    ///
    /// Children are orphaned first so the hide does not cascade to them;
    /// they stay visible until their own surface goes away.
    pub fn destroy_view(&mut self, id: Id<View>) {
        let child_ids: Vec<Id<View>> = self
            .views
            .iter()
            .filter(|(_, v)| v.parent == Some(id))
            .map(|(cid, _)| cid)
            .collect();
        for cid in child_ids {
            if let Some(child) = self.views.get_mut(cid) {
                child.parent = None;
            }
        }
        self.view_hide(id);
        if let Some(view) = self.views.remove(id) {
            if let Some(s) = self.surfaces.get_mut(view.surface) {
                s.view = None;
            }
        }
        self.stack.retain(|vid| *vid != id);
    }

    /// Attaches a client buffer, routing through a proxy when the scanout
    /// renderer cannot read it. On failure the previous buffer stays and
    /// the client may resubmit.
    pub fn view_attach(
        &mut self,
        id: Id<View>,
        client_buffer: Option<BufferRef>,
    ) -> Result<(), RenderError> {
        let Some(view) = self.views.get(id) else {
            return Ok(());
        };
        let surface = view.surface;

        let was_proxy = match (&view.buffer, self.surfaces.get(surface)) {
            (Some(current), Some(s)) => match &s.buffer {
                Some(base) => !std::rc::Rc::ptr_eq(current, base),
                None => true,
            },
            _ => false,
        };
        let needs_proxy = client_buffer
            .as_ref()
            .is_some_and(|b| !self.scanout.capabilities(b).read);
        let resized = match (&view.buffer, &client_buffer) {
            (Some(old), Some(new)) => old.width != new.width || old.height != new.height,
            _ => false,
        };

        let buffer = match &client_buffer {
            Some(client) => {
                if needs_proxy {
                    if !was_proxy || resized {
                        debug!("Creating a proxy buffer");
                        Some(self.scanout.create_buffer(
                            client.width,
                            client.height,
                            client.format,
                            BufferFlags {
                                map: true,
                                scanout: false,
                            },
                        )?)
                    } else {
                        // The existing proxy still fits.
                        view.buffer.clone()
                    }
                } else {
                    Some(client.clone())
                }
            }
            None => None,
        };

        let Some(view) = self.views.get_mut(id) else {
            return Ok(());
        };
        view.buffer = buffer;
        if let Some(s) = self.surfaces.get_mut(surface) {
            s.buffer = client_buffer.clone();
        }

        self.update_view(id);

        // Adopt the new buffer size; a size change damages the symmetric
        // difference of old and new extents.
        let Some(view) = self.views.get(id) else {
            return Ok(());
        };
        let (old_w, old_h, old_extents) = (view.geometry.width, view.geometry.height, view.extents);
        let (new_w, new_h) = match &client_buffer {
            Some(b) => (b.width, b.height),
            None => (old_w, old_h),
        };
        if new_w != old_w || new_h != old_h {
            let Some(view) = self.views.get_mut(id) else {
                return Ok(());
            };
            view.geometry.width = new_w;
            view.geometry.height = new_h;
            view.update_extents();
            if view.visible {
                let mut old = Region::from_rect(old_extents.to_rect());
                let mut new = Region::from_rect(view.extents.to_rect());
                let mut both = old.clone();
                both.intersect(&new);
                new.union(&old);
                new.subtract(&both);
                new.subtract(&view.clip);
                self.damage.union(&new);

                self.view_update_screens(id);
                self.update_view(id);
            }
        }

        Ok(())
    }

    /// Moves a view, damaging the area it uncovered and the area it now
    /// covers. Subsurface children follow their parent.
    pub fn view_move(&mut self, id: Id<View>, x: i32, y: i32) {
        let Some(view) = self.views.get(id) else {
            return;
        };
        if view.visible {
            self.damage_below_view(id);
            self.update_view(id);
        }

        let moved = {
            let Some(view) = self.views.get_mut(id) else {
                return;
            };
            if view.geometry.x == x && view.geometry.y == y {
                false
            } else {
                view.geometry.x = x;
                view.geometry.y = y;
                view.update_extents();
                true
            }
        };

        if moved {
            let visible = self.views.get(id).map(|v| v.visible).unwrap_or(false);
            if visible {
                // Assume worst-case no clipping until the next damage pass
                // recomputes it.
                if let Some(view) = self.views.get_mut(id) {
                    view.clip.clear();
                }
                self.view_update_screens(id);
                self.damage_below_view(id);
                self.update_view(id);
            }

            // Keep subsurface children glued to the parent.
            let children: Vec<(Id<View>, (i32, i32))> = self
                .views
                .iter()
                .filter(|(_, v)| v.parent == Some(id))
                .map(|(cid, v)| (cid, v.sub_offset))
                .collect();
            for (cid, (sx, sy)) in children {
                self.view_move(cid, clamp_i32(x as i64 + sx as i64), clamp_i32(y as i64 + sy as i64));
            }
        }
    }

    pub fn view_show(&mut self, id: Id<View>) {
        let Some(view) = self.views.get_mut(id) else {
            return;
        };
        if view.visible {
            return;
        }
        view.visible = true;
        view.clip.clear();
        self.view_update_screens(id);
        self.damage_view(id);
        self.update_view(id);

        let children: Vec<Id<View>> = self
            .views
            .iter()
            .filter(|(_, v)| v.parent == Some(id))
            .map(|(cid, _)| cid)
            .collect();
        for cid in children {
            self.view_show(cid);
        }
    }

    pub fn view_hide(&mut self, id: Id<View>) {
        let Some(view) = self.views.get(id) else {
            return;
        };
        if !view.visible {
            return;
        }
        // Update all the screens the view was on.
        self.update_view(id);
        self.damage_below_view(id);
        if let Some(view) = self.views.get_mut(id) {
            view.screens = 0;
            view.visible = false;
        }

        let children: Vec<Id<View>> = self
            .views
            .iter()
            .filter(|(_, v)| v.parent == Some(id))
            .map(|(cid, _)| cid)
            .collect();
        for cid in children {
            self.view_hide(cid);
        }
    }

    /// Updates both border rings. Geometry is not adjusted; callers choose
    /// whether to compensate.
    pub fn view_set_border(
        &mut self,
        id: Id<View>,
        inner_color: u32,
        inner_width: u32,
        outer_color: u32,
        outer_width: u32,
    ) {
        let Some(view) = self.views.get_mut(id) else {
            return;
        };
        let widths_changed =
            view.border.inner_width != inner_width || view.border.outer_width != outer_width;
        let colors_changed =
            view.border.inner_color != inner_color || view.border.outer_color != outer_color;
        if !widths_changed && !colors_changed {
            return;
        }

        view.border.inner_color = inner_color;
        view.border.outer_color = outer_color;
        view.border.damaged_inner = true;
        view.border.damaged_outer = true;
        if widths_changed {
            view.border.inner_width = inner_width;
            view.border.outer_width = outer_width;
            view.update_extents();
        }
        self.update_view(id);
    }

    /// Parents `id` under `parent` as a subsurface view; visibility follows
    /// the parent.
    pub fn view_set_parent(&mut self, id: Id<View>, parent: Id<View>, sub_x: i32, sub_y: i32) {
        let parent_state = self
            .views
            .get(parent)
            .map(|p| (p.visible, p.geometry.x, p.geometry.y));
        let Some((parent_visible, px, py)) = parent_state else {
            return;
        };
        if let Some(view) = self.views.get_mut(id) {
            view.parent = Some(parent);
            view.sub_offset = (sub_x, sub_y);
        }
        self.view_move(
            id,
            clamp_i32(px as i64 + sub_x as i64),
            clamp_i32(py as i64 + sub_y as i64),
        );
        if parent_visible {
            self.view_show(id);
        } else {
            self.view_hide(id);
        }
    }

    /// Resizes and repositions in one step (spawn adoption, fullscreen).
    pub fn view_set_geometry(&mut self, id: Id<View>, rect: Rect) {
        let Some(view) = self.views.get(id) else {
            return;
        };
        if view.visible {
            self.damage_below_view(id);
        }
        let Some(view) = self.views.get_mut(id) else {
            return;
        };
        view.geometry = rect;
        view.clip.clear();
        view.update_extents();
        let visible = view.visible;
        if visible {
            self.view_update_screens(id);
            self.damage_view(id);
            self.update_view(id);
        }
    }

    /// Adds the region below a view (extents minus clip) to the damage.
    pub(super) fn damage_below_view(&mut self, id: Id<View>) {
        let Some(view) = self.views.get(id) else {
            return;
        };
        let mut below = std::mem::take(&mut self.scratch.below);
        below.reset_rect(view.extents_rect());
        below.subtract(&view.clip);
        self.damage.union(&below);
        self.scratch.below = below;
    }

    /// Completely damages the view and its border.
    pub(super) fn damage_view(&mut self, id: Id<View>) {
        self.damage_below_view(id);
        if let Some(view) = self.views.get_mut(id) {
            view.border.damaged_outer = true;
            view.border.damaged_inner = true;
        }
    }

    /// Recomputes which screens the view's extents intersect.
    pub(super) fn view_update_screens(&mut self, id: Id<View>) {
        let Some(view) = self.views.get(id) else {
            return;
        };
        let extents = view.extents_rect();
        let mut mask = 0;
        for (_, screen) in self.screens.iter() {
            if extents.intersection(&screen.geometry).is_valid() {
                mask |= screen.mask;
            }
        }
        if let Some(view) = self.views.get_mut(id) {
            view.screens = mask;
        }
    }

    /// Schedules updates on the screens a visible view occupies.
    pub(super) fn update_view(&mut self, id: Id<View>) -> bool {
        let Some(view) = self.views.get(id) else {
            return false;
        };
        if !self.active || !view.visible {
            return false;
        }
        let screens = view.screens;
        self.schedule_update(screens);
        true
    }
}
