//! The view/damage/repaint pipeline.
//!
//! The compositor owns the stacked view list, the accumulated damage and
//! opaque regions, the per-screen scanout swapchains, and the update
//! scheduler. Repaints run from an idle callback: damage is calculated once
//! for the whole batch, then every scheduled screen that is not awaiting a
//! page flip is painted and swapped. A screen's pending-flip bit stays set
//! until the display driver's frame signal comes back.

mod damage;
mod overlay;
mod repaint;
mod view;
mod zoom;


pub use overlay::Overlay;
pub use view::{Border, View};

use log::{debug, warn};

use crate::render::{BufferFlags, BufferRef, Format, RenderError, Renderer};
use crate::screen::Screen;
use crate::surface::Surface;
use crate::util::{Id, Pool, Rect, Region};

pub const ALL_SCREENS: u32 = u32::MAX;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;

/// Scratch regions reused across repaint batches. Taken out of the
/// compositor for the duration of a computation and put back, so the
/// steady paint path never allocates fresh region storage.
#[derive(Default)]
pub(crate) struct PaintScratch {
    pub(crate) screen_damage: Region,
    pub(crate) total_damage: Region,
    pub(crate) base_damage: Region,
    pub(crate) view_damage: Region,
    pub(crate) border_damage: Region,
    pub(crate) outer_ring: Region,
    pub(crate) inner_ring: Region,
    pub(crate) below: Region,
    pub(crate) surface_opaque: Region,
    pub(crate) border_region: Region,
}

pub struct Compositor {
    pub views: Pool<View>,
    /// Stacking order, index 0 topmost. Owns the views exclusively.
    pub stack: Vec<Id<View>>,
    pub surfaces: Pool<Surface>,
    pub screens: Pool<Screen>,

    pub(crate) damage: Region,
    pub(crate) opaque: Region,

    /// Screens that have been repainted but are waiting on a page flip.
    pending_flips: u32,
    /// Screens scheduled to be repainted on the next idle.
    scheduled_updates: u32,
    updating: bool,
    /// An idle callback to `perform` has been posted and not yet run.
    update_posted: bool,

    /// The session holds the display; cleared on access loss.
    active: bool,
    /// Set when a swap was denied and the host should deactivate us.
    deactivate_requested: bool,

    zoom: f32,
    pub(crate) overlay: Overlay,

    pub wallpaper: Option<BufferRef>,
    pub background_color: u32,

    pub(crate) scanout: Box<dyn Renderer>,
    pub(crate) shm: Box<dyn Renderer>,

    pub(crate) scratch: PaintScratch,
}

impl Compositor {
    pub fn new(scanout: Box<dyn Renderer>, shm: Box<dyn Renderer>, background_color: u32) -> Self {
        Self {
            views: Pool::new(),
            stack: Vec::new(),
            surfaces: Pool::new(),
            screens: Pool::new(),
            damage: Region::new(),
            opaque: Region::new(),
            pending_flips: 0,
            scheduled_updates: 0,
            updating: false,
            update_posted: false,
            active: true,
            deactivate_requested: false,
            zoom: 1.0,
            overlay: Overlay::default(),
            wallpaper: None,
            background_color,
            scanout,
            shm,
            scratch: PaintScratch::default(),
        }
    }

    pub fn create_surface(&mut self) -> Id<Surface> {
        self.surfaces.insert(Surface::new())
    }

    /// Tears down a surface and its view.
    pub fn destroy_surface(&mut self, id: Id<Surface>) {
        if let Some(view) = self.surfaces.get(id).and_then(|s| s.view) {
            self.destroy_view(view);
        }
        self.surfaces.remove(id);
    }

    /// Registers a new output. Returns `None` when the render target cannot
    /// be allocated; the screen is then not managed.
    pub fn create_screen(&mut self, geometry: Rect) -> Option<Id<Screen>> {
        let mut used = 0;
        for (_, screen) in self.screens.iter() {
            used |= screen.mask;
        }
        let mask = (0..u32::BITS).map(|bit| 1 << bit).find(|m| used & m == 0)?;

        let target = match self.scanout.create_target(
            geometry.width,
            geometry.height,
            Format::Xrgb8888,
            BufferFlags {
                map: false,
                scanout: true,
            },
        ) {
            Ok(target) => target,
            Err(err) => {
                warn!("Could not allocate render target for screen: {}", err);
                return None;
            }
        };

        let id = self.screens.insert(Screen::new(geometry, mask, target));
        debug!(
            "screen {}x{} mask {:#x}",
            geometry.width, geometry.height, mask
        );
        self.schedule_update(mask);
        Some(id)
    }

    /// Unregisters a hot-unplugged output; its render target is destroyed
    /// synchronously.
    pub fn destroy_screen(&mut self, id: Id<Screen>) {
        if let Some(screen) = self.screens.remove(id) {
            self.scanout.destroy_target(screen.target);
            self.pending_flips &= !screen.mask;
            self.scheduled_updates &= !screen.mask;
        }
    }

    /// Current overlay state, for front-ends that mirror it.
    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Sets the zoom level, clamped to the supported range. Any change
    /// forces a full repaint since view damage no longer maps linearly to
    /// screen pixels.
    pub fn set_zoom(&mut self, level: f32) {
        let level = level.clamp(MIN_ZOOM, MAX_ZOOM);
        if self.zoom != level {
            self.zoom = level;
            self.schedule_update(ALL_SCREENS);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Session activation handoff. Reactivating clears stale update state
    /// and redamages everything.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        if active {
            self.pending_flips = 0;
            let rects: Vec<Rect> = self.screens.iter().map(|(_, s)| s.geometry).collect();
            for rect in rects {
                self.damage.union_rect(rect);
            }
            self.schedule_update(ALL_SCREENS);
        } else {
            self.scheduled_updates = 0;
        }
    }

    /// True once after a swap was denied; the host should deactivate.
    pub fn take_deactivate_request(&mut self) -> bool {
        std::mem::take(&mut self.deactivate_requested)
    }

    /// Marks screens for repaint. `ALL_SCREENS` means every screen; under
    /// zoom each screen is additionally fully damaged.
    pub fn schedule_update(&mut self, screens: u32) {
        if self.scheduled_updates == 0 {
            self.update_posted = true;
        }

        let mut screens = if screens == ALL_SCREENS {
            let mut mask = 0;
            for (_, screen) in self.screens.iter() {
                mask |= screen.mask;
            }
            mask
        } else {
            screens
        };

        if self.zoom != 1.0 {
            let rects: Vec<(Rect, u32)> = self
                .screens
                .iter()
                .map(|(_, s)| (s.geometry, s.mask))
                .collect();
            for (rect, mask) in rects {
                self.damage.union_rect(rect);
                screens |= mask;
            }
        }

        self.scheduled_updates |= screens;
    }

    /// True once after an idle callback was posted; the loop then calls
    /// [`Compositor::perform`].
    pub fn take_update_posted(&mut self) -> bool {
        std::mem::take(&mut self.update_posted)
    }

    /// Runs one update batch: damage calculation, then a repaint of every
    /// scheduled screen not awaiting a flip. Damage is cleared exactly once
    /// at batch end.
    pub fn perform(&mut self) {
        let updates = self.scheduled_updates & !self.pending_flips;
        if !self.active || updates == 0 {
            return;
        }

        debug!("Performing update");
        self.updating = true;
        self.calculate_damage();

        let screen_ids: Vec<Id<Screen>> = self.screens.ids().collect();
        for id in screen_ids {
            self.update_screen(id);
        }

        self.damage.clear();
        self.scheduled_updates &= !updates;
        self.updating = false;
    }

    /// Frame signal from the display driver: the flip for `screen`
    /// completed. Updates that queued behind the flip run now.
    pub fn handle_frame(&mut self, id: Id<Screen>) {
        let Some(screen) = self.screens.get_mut(id) else {
            return;
        };
        let mask = screen.mask;
        let target = screen.target;
        let released = screen.current_buffer.take();
        screen.current_buffer = screen.next_buffer.take();
        self.pending_flips &= !mask;

        if let Some(buffer) = released {
            self.scanout.target_release(target, &buffer);
        }

        if self.scheduled_updates != 0 && !self.updating {
            self.perform();
        }
    }

    pub fn pending_flips(&self) -> u32 {
        self.pending_flips
    }

    pub fn scheduled_updates(&self) -> u32 {
        self.scheduled_updates
    }

    pub(crate) fn swap_screen(&mut self, id: Id<Screen>) {
        let Some(screen) = self.screens.get(id) else {
            return;
        };
        let (target, mask) = (screen.target, screen.mask);
        match self.scanout.target_take(target) {
            Ok(buffer) => {
                if let Some(screen) = self.screens.get_mut(id) {
                    screen.next_buffer = Some(buffer);
                }
                self.pending_flips |= mask;
            }
            Err(RenderError::AccessDenied) => {
                // The session is being deactivated out from under us; stop
                // scheduling repaints until the host hands the device back.
                warn!("Swap denied, deactivating session");
                self.set_active(false);
                self.deactivate_requested = true;
            }
            Err(err) => warn!("Buffer swap failed: {}", err),
        }
    }

    /// Topmost visible view whose geometry and input region contain the
    /// point.
    pub fn view_at(&self, x: i32, y: i32) -> Option<Id<View>> {
        for &vid in &self.stack {
            let Some(view) = self.views.get(vid) else {
                continue;
            };
            if !view.visible || !view.geometry.contains(x, y) {
                continue;
            }
            let Some(surface) = self.surfaces.get(view.surface) else {
                continue;
            };
            if surface
                .input
                .contains_point(x - view.geometry.x, y - view.geometry.y)
            {
                return Some(vid);
            }
        }
        None
    }

    /// Walks a view's parent chain up to the view carrying a window record.
    pub fn window_view(&self, mut vid: Id<View>) -> Option<Id<View>> {
        loop {
            let view = self.views.get(vid)?;
            if view.window.is_some() {
                return Some(vid);
            }
            let parent = view.parent?;
            if parent == vid {
                return None;
            }
            vid = parent;
        }
    }

    /// Topmost visible window view containing the point.
    pub fn window_at(&self, x: i32, y: i32) -> Option<Id<View>> {
        self.view_at(x, y).and_then(|vid| self.window_view(vid))
    }

    /// Raises the window containing `vid` just above the previously topmost
    /// window view, below any floating non-window views.
    pub fn raise_window(&mut self, vid: Id<View>) {
        let Some(vid) = self.window_view(vid) else {
            return;
        };
        if !self.views.get(vid).map(|v| v.visible).unwrap_or(false) {
            return;
        }

        let mut insert_at = 0;
        let mut top_window = None;
        for (i, &other) in self.stack.iter().enumerate() {
            let Some(view) = self.views.get(other) else {
                continue;
            };
            if !view.visible {
                continue;
            }
            if view.window.is_some() {
                top_window = Some(other);
                break;
            }
            insert_at = i + 1;
        }

        if top_window == Some(vid) {
            return;
        }

        self.stack.retain(|v| *v != vid);
        let insert_at = insert_at.min(self.stack.len());
        self.stack.insert(insert_at, vid);

        self.damage_stacked_views(vid, top_window);
    }

    /// Moves a window one step toward the front (negative) or back
    /// (positive) within the visible window views.
    pub fn stack_window(&mut self, vid: Id<View>, direction: i32) {
        if direction == 0 {
            return;
        }
        let Some(view) = self.views.get(vid) else {
            return;
        };
        if !view.visible || view.window.is_none() {
            return;
        }
        let Some(pos) = self.stack.iter().position(|v| *v == vid) else {
            return;
        };

        let is_window_view = |comp: &Self, other: Id<View>| {
            comp.views
                .get(other)
                .map(|v| v.visible && v.window.is_some())
                .unwrap_or(false)
        };

        let other = if direction < 0 {
            self.stack[..pos]
                .iter()
                .rev()
                .copied()
                .find(|&v| is_window_view(self, v))
        } else {
            self.stack[pos + 1..]
                .iter()
                .copied()
                .find(|&v| is_window_view(self, v))
        };
        let Some(other) = other else {
            return;
        };

        self.stack.retain(|v| *v != vid);
        let other_pos = match self.stack.iter().position(|v| *v == other) {
            Some(p) => p,
            None => return,
        };
        if direction < 0 {
            self.stack.insert(other_pos, vid);
        } else {
            self.stack.insert(other_pos + 1, vid);
        }

        self.damage_stacked_views(vid, Some(other));
    }

    /// Damages the borders and extents of a restacked view and the view it
    /// crossed.
    fn damage_stacked_views(&mut self, a: Id<View>, b: Option<Id<View>>) {
        let mut screens = 0;
        for vid in std::iter::once(a).chain(b) {
            if let Some(view) = self.views.get_mut(vid) {
                view.border.damaged_outer = true;
                view.border.damaged_inner = true;
                screens |= view.screens;
                let rect = view.extents_rect();
                self.damage.union_rect(rect);
            }
        }
        self.schedule_update(screens);
    }
}
