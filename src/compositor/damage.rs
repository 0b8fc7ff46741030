//! Damage calculation pass.

use super::Compositor;

impl Compositor {
    /// Walks the view list top-down: builds each view's clip region from
    /// the opaque area accumulated above it, pulls committed surface damage
    /// into the compositor damage, flushes proxy buffers, and expands
    /// border-damage flags.
    pub(super) fn calculate_damage(&mut self) {
        self.opaque.clear();
        let mut surface_opaque = std::mem::take(&mut self.scratch.surface_opaque);
        let mut border_region = std::mem::take(&mut self.scratch.border_region);

        for i in 0..self.stack.len() {
            let vid = self.stack[i];
            let Some(view) = self.views.get(vid) else {
                continue;
            };
            if !view.visible {
                continue;
            }
            let geometry = view.geometry;
            let surface_id = view.surface;

            // Clip the view by the opaque region covering it.
            if let Some(view) = self.views.get_mut(vid) {
                view.clip.copy_from(&self.opaque);
            }

            let Some(surface) = self.surfaces.get(surface_id) else {
                continue;
            };

            // Accumulate this surface's opaque area in global coordinates.
            surface_opaque.copy_from(&surface.opaque);
            surface_opaque.translate(geometry.x, geometry.y);
            self.opaque.union(&surface_opaque);

            if !surface.damage.is_empty() {
                self.flush_proxy(vid);

                // Lift the committed damage to global coordinates in place;
                // the surface keeps its region storage.
                let Some(surface) = self.surfaces.get_mut(surface_id) else {
                    continue;
                };
                surface.damage.translate(geometry.x, geometry.y);
                self.damage.union(&surface.damage);
                surface.damage.clear();
            }

            // A damaged ring repaints the whole frame around the content.
            let Some(view) = self.views.get_mut(vid) else {
                continue;
            };
            if view.border.damaged_outer || view.border.damaged_inner {
                view.border.damaged_outer = false;
                view.border.damaged_inner = false;
                border_region.reset_rect(view.extents_rect());
                border_region.subtract_rect(geometry);
                self.damage.union(&border_region);
            }
        }

        self.scratch.surface_opaque = surface_opaque;
        self.scratch.border_region = border_region;
    }

    /// Copies the damaged part of the client buffer into the proxy buffer
    /// the scanout renderer reads.
    fn flush_proxy(&mut self, vid: crate::util::Id<super::View>) {
        let Some(view) = self.views.get(vid) else {
            return;
        };
        let Some(surface) = self.surfaces.get(view.surface) else {
            return;
        };
        let (Some(proxy), Some(base)) = (&view.buffer, &surface.buffer) else {
            return;
        };
        if std::rc::Rc::ptr_eq(proxy, base) {
            return;
        }
        if self.shm.set_target_buffer(proxy).is_err() {
            return;
        }
        self.shm.copy_region(base, 0, 0, &surface.damage);
        self.shm.flush();
    }
}
