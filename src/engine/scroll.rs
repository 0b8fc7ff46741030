//! Timer-driven easing: scrolling, window-move easing, and zoom.
//!
//! All easing is discrete exponential. Each tick moves a fraction of the
//! remaining distance, so motion starts fast and settles; the pending
//! accumulators shrink monotonically and every easing path converges in a
//! bounded number of ticks.

use log::debug;

use crate::util::{Id, Rect};

use super::Engine;
use super::chord::Mode;
use super::timer::TimerKind;
use super::wm::Window;

/// Easing tick period in milliseconds.
pub const TICK_MS: u64 = 16;

/// Client of the scroll-position broadcast.
pub trait ScrollSink {
    /// Receives the cumulative signed vertical scroll offset.
    fn scroll_position(&mut self, pos: i32);
}

impl Engine {
    /// Resets every scroll accumulator and stops the drag sampler. Safe to
    /// call at any time; repeated stops are no-ops.
    pub(crate) fn scroll_stop(&mut self) {
        self.chord.scroll_pending_px = 0;
        self.chord.scroll_pending_px_x = 0;
        self.chord.auto_scrolling = false;
        self.stop_timer(TimerKind::ScrollDrag);
    }

    /// Publishes the cumulative scroll position to every bound client.
    fn send_scrollpos(&mut self) {
        let pos = self.scrollpos;
        for sink in &mut self.scroll_sinks {
            sink.scroll_position(pos);
        }
    }

    /// One scroll easing step: move every visible non-sticky view by a
    /// capped fraction of the pending delta.
    pub(crate) fn tick_scroll(&mut self) {
        let rem = self.chord.scroll_pending_px;
        let rem_x = self.chord.scroll_pending_px_x;

        let driving = self.chord.mode == Mode::Scrolling
            || self.chord.auto_scrolling
            || self.chord.mode == Mode::Moving;
        if !driving || (rem == 0 && rem_x == 0) {
            debug!(
                "scroll tick stop mode={:?} auto={} rem={} rem_x={}",
                self.chord.mode, self.chord.auto_scrolling, rem, rem_x
            );
            self.scroll_stop();
            return;
        }

        let ease = self.config.scroll.ease;
        let cap = self.config.scroll.cap;
        let step = ease_step(rem, ease, cap);
        let step_x = ease_step(rem_x, ease, cap);

        self.scrollpos += step;
        self.send_scrollpos();

        let moving = self.chord.mode == Mode::Moving;
        let drag_mode = self.config.scroll.drag_mode;
        let current_screen = self
            .current_screen
            .and_then(|id| self.comp.screens.get(id))
            .map(|s| s.geometry);

        let targets: Vec<(Id<Window>, Id<crate::compositor::View>)> = self
            .windows
            .iter()
            .filter(|(wid, w)| {
                if w.sticky {
                    return false;
                }
                // The dragged window already follows the cursor; scrolling
                // it too makes the motion fight itself.
                if moving && Some(*wid) == self.focused {
                    return false;
                }
                true
            })
            .map(|(wid, w)| (wid, w.view))
            .collect();

        for (_, view) in targets {
            let Some(geometry) = self.comp.views.get(view).map(|v| v.geometry) else {
                continue;
            };
            if !drag_mode {
                // Wheel mode only scrolls the column of windows on the
                // current screen.
                let Some(screen) = current_screen else {
                    continue;
                };
                if !is_on_screen_horizontally(geometry, screen) {
                    continue;
                }
            }
            self.comp
                .view_move(view, geometry.x + step_x, geometry.y + step);
        }

        self.chord.scroll_pending_px -= step;
        self.chord.scroll_pending_px_x -= step_x;
        self.arm_timer(TimerKind::ScrollStep, TICK_MS);
    }

    /// Samples the cursor while the drag-scroll chord is held; inverted
    /// deltas become pending scroll.
    pub(crate) fn tick_scroll_drag(&mut self) {
        if self.chord.mode != Mode::Scrolling {
            return;
        }

        let Some((x, y)) = self.cursor_position() else {
            self.arm_timer(TimerKind::ScrollDrag, TICK_MS);
            return;
        };

        let (last_x, last_y) = self.chord.scroll_drag_last;
        let delta_x = x - last_x;
        let delta_y = y - last_y;
        self.chord.scroll_drag_last = (x, y);

        if delta_x == 0 && delta_y == 0 {
            self.arm_timer(TimerKind::ScrollDrag, TICK_MS);
            return;
        }

        // Inverted: dragging down pulls the content down, scrolling up.
        self.chord.scroll_pending_px -= delta_y;
        self.chord.scroll_pending_px_x -= delta_x;

        if delta_y != 0 {
            self.chord.scroll_cursor_dir = if delta_y > 0 { 1 } else { -1 };
            self.update_mode_cursor();
        }

        self.arm_timer(TimerKind::ScrollStep, 1);
        self.arm_timer(TimerKind::ScrollDrag, TICK_MS);
    }

    /// Eases the dragged window toward the cursor and injects edge
    /// auto-scroll when the cursor nears the top or bottom of the screen.
    pub(crate) fn tick_move_scroll(&mut self) {
        if self.chord.mode != Mode::Moving {
            return;
        }

        let screen_height = self
            .current_screen
            .and_then(|id| self.comp.screens.get(id))
            .map(|s| s.geometry.height as i32)
            .unwrap_or(0);
        if screen_height == 0 {
            self.arm_timer(TimerKind::MoveScroll, TICK_MS);
            return;
        }

        let Some((x, y)) = self.cursor_position() else {
            self.arm_timer(TimerKind::MoveScroll, TICK_MS);
            return;
        };

        // Each tick covers a configured fraction of the remaining gap
        // between the window and its target under the cursor.
        if let Some(focused) = self.focused {
            if let Some(geometry) = self.window_get_geometry(focused) {
                let ease = self.config.movement.ease_factor;
                let target_x = self.chord.move_start_win.0 + (x - self.chord.move_start_cursor.0);
                let target_y = self.chord.move_start_win.1 + (y - self.chord.move_start_cursor.1);
                let new_x = geometry.x + ((target_x - geometry.x) as f32 * ease) as i32;
                let new_y = geometry.y + ((target_y - geometry.y) as f32 * ease) as i32;
                self.window_set_position(focused, new_x, new_y);
            }
        }

        // Edge strips scroll the rest of the world under the drag.
        let threshold = self.config.movement.edge_threshold;
        let speed = self.config.movement.scroll_speed;
        if y < threshold {
            self.chord.scroll_pending_px += speed;
            self.arm_timer(TimerKind::ScrollStep, 1);
        } else if y > screen_height - threshold {
            self.chord.scroll_pending_px -= speed;
            self.arm_timer(TimerKind::ScrollStep, 1);
        }

        self.arm_timer(TimerKind::MoveScroll, TICK_MS);
    }

    /// Pulls the zoom level toward its target, snapping when close.
    pub(crate) fn tick_zoom(&mut self) {
        let current = self.comp.zoom();
        let target = self.chord.zoom_target;
        let diff = target - current;

        if diff.abs() < 0.01 {
            self.comp.set_zoom(target);
            return;
        }

        let mut step = diff / 4.0;
        if step > 0.0 && step < 0.01 {
            step = 0.01;
        }
        if step < 0.0 && step > -0.01 {
            step = -0.01;
        }

        self.comp.set_zoom(current + step);
        self.arm_timer(TimerKind::Zoom, TICK_MS);
    }

    /// Tracks which screen contains the cursor.
    pub(crate) fn tick_cursor(&mut self) {
        if let Some((x, y)) = self.cursor_position_raw() {
            let hit = self
                .comp
                .screens
                .iter()
                .find(|(_, s)| s.geometry.contains(x, y))
                .map(|(id, _)| id);
            if let Some(id) = hit {
                if self.current_screen != Some(id) {
                    self.current_screen = Some(id);
                }
            }
        }
        self.arm_timer(TimerKind::CursorTrack, TICK_MS);
    }

    /// Redraws the selection overlay at the tracked cursor.
    pub(crate) fn tick_select(&mut self) {
        if self.chord.mode != Mode::Selecting {
            return;
        }

        if let Some((x, y)) = self.cursor_position() {
            self.chord.cur_x = x;
            self.chord.cur_y = y;
            let color = self.config.select.box_color.to_argb();
            let border = self.config.select.box_border;
            let (sx, sy) = (self.chord.start_x, self.chord.start_y);
            self.comp.overlay_set_box(sx, sy, x, y, color, border);
        }

        self.arm_timer(TimerKind::Select, TICK_MS);
    }

    /// The deferred-click timeout: the buffered press finally reaches the
    /// client, unless a chord claimed it.
    pub(crate) fn tick_click_timeout(&mut self) {
        if !self.chord.click.pending {
            return;
        }

        // A move chord eats the buffered press outright.
        if self.chord.mode == Mode::Moving {
            self.click_cancel();
            return;
        }

        if self.chord.left && self.chord.right {
            return;
        }

        if !self.chord.click.forwarded {
            let (time, button) = (self.chord.click.time, self.chord.click.button);
            self.seat
                .send_button(time, button, crate::seat::ButtonState::Pressed);
            self.chord.click.forwarded = true;
        }
    }
}

/// Sign-preserving `rem / ease` with a minimum step of one pixel and a
/// symmetric cap.
fn ease_step(rem: i32, ease: i32, cap: i32) -> i32 {
    let mut step = rem / ease;
    if step == 0 && rem != 0 {
        step = if rem > 0 { 1 } else { -1 };
    }
    step.clamp(-cap, cap)
}

/// Horizontal-overlap test used to keep wheel scrolling from dragging
/// windows parked on other screens.
fn is_on_screen_horizontally(window: Rect, screen: Rect) -> bool {
    window.right() > screen.x && window.x < screen.right()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_step_divides_toward_zero() {
        assert_eq!(ease_step(64, 4, 64), 16);
        assert_eq!(ease_step(-64, 4, 64), -16);
    }

    #[test]
    fn ease_step_never_stalls() {
        assert_eq!(ease_step(3, 4, 64), 1);
        assert_eq!(ease_step(-3, 4, 64), -1);
        assert_eq!(ease_step(0, 4, 64), 0);
    }

    #[test]
    fn ease_step_caps_large_remainders() {
        assert_eq!(ease_step(100_000, 4, 64), 64);
        assert_eq!(ease_step(-100_000, 4, 64), -64);
    }

    #[test]
    fn horizontal_overlap() {
        let screen = Rect::new(0, 0, 1000, 800);
        assert!(is_on_screen_horizontally(Rect::new(-50, 0, 100, 100), screen));
        assert!(is_on_screen_horizontally(Rect::new(0, 5000, 100, 100), screen));
        assert!(!is_on_screen_horizontally(Rect::new(1000, 0, 100, 100), screen));
        assert!(!is_on_screen_horizontally(Rect::new(-100, 0, 100, 100), screen));
    }
}
