//! The mouse-chord state machine.
//!
//! Buttons reach the engine before any client sees them. Lone left/right
//! presses are held back for a short timeout so a chord can still absorb
//! them; multi-button chords switch the machine into one of the exclusive
//! modes and swallow the raw events until every button is up. The `acme`
//! editor gets its native chords back: raw events pass through whenever it
//! is focused and under the cursor.

use log::debug;

use crate::seat::{
    AXIS_VERTICAL, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, ButtonState, CursorKind,
};
use crate::util::Rect;

use super::Engine;
use super::timer::{TimerHandle, TimerKind};
use super::wm::{EDGE_BOTTOM, EDGE_RIGHT};

/// App id whose windows receive raw chord input when focused.
const ACME_APP_ID: &str = "acme";

/// Wheel-zoom step and clamp while the scroll chord is held in drag mode.
const WHEEL_ZOOM_STEP: f32 = 0.15;
const WHEEL_ZOOM_MIN: f32 = 0.25;
const WHEEL_ZOOM_MAX: f32 = 4.0;

/// Exclusive chord modes. `jumping` is transient and tracked separately;
/// auto-scrolling may overlap any mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    Selecting,
    Killing,
    Scrolling,
    Moving,
    Resizing,
}

/// A lone click buffered until the chord timeout decides its fate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingClick {
    pub pending: bool,
    pub forwarded: bool,
    pub button: u32,
    pub time: u32,
}

/// Selection geometry waiting for the spawned terminal to appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingSpawn {
    pub pending: bool,
    pub geometry: Rect,
}

#[derive(Default)]
pub struct ChordState {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
    /// A chord has begun; raw left/right events are swallowed.
    pub activated: bool,
    pub mode: Mode,
    pub jumping: bool,
    pub auto_scrolling: bool,

    pub click: PendingClick,
    pub spawn: PendingSpawn,

    /// Selection rectangle origin and the last tracked cursor.
    pub start_x: i32,
    pub start_y: i32,
    pub cur_x: i32,
    pub cur_y: i32,

    pub move_start_win: (i32, i32),
    pub move_start_cursor: (i32, i32),

    /// Pending scroll deltas in pixels, vertical and horizontal.
    pub scroll_pending_px: i32,
    pub scroll_pending_px_x: i32,
    pub scroll_cursor_dir: i8,
    pub scroll_drag_last: (i32, i32),

    pub zoom_target: f32,

    select_timer: Option<TimerHandle>,
    click_timer: Option<TimerHandle>,
    scroll_timer: Option<TimerHandle>,
    scroll_drag_timer: Option<TimerHandle>,
    move_scroll_timer: Option<TimerHandle>,
    zoom_timer: Option<TimerHandle>,
    cursor_timer: Option<TimerHandle>,
}

impl ChordState {
    pub(super) fn take_timer(&mut self, kind: TimerKind) -> Option<TimerHandle> {
        self.timer_slot(kind).take()
    }

    pub(super) fn set_timer(&mut self, kind: TimerKind, handle: Option<TimerHandle>) {
        *self.timer_slot(kind) = handle;
    }

    fn timer_slot(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Select => &mut self.select_timer,
            TimerKind::ClickTimeout => &mut self.click_timer,
            TimerKind::ScrollStep => &mut self.scroll_timer,
            TimerKind::ScrollDrag => &mut self.scroll_drag_timer,
            TimerKind::MoveScroll => &mut self.move_scroll_timer,
            TimerKind::Zoom => &mut self.zoom_timer,
            TimerKind::CursorTrack => &mut self.cursor_timer,
        }
    }

    fn any_button(&self) -> bool {
        self.left || self.middle || self.right
    }
}

impl Engine {
    /// Arms `kind` to fire `delay_ms` from now, replacing any armed entry.
    pub(crate) fn arm_timer(&mut self, kind: TimerKind, delay_ms: u64) {
        let deadline = self.now().saturating_add(delay_ms);
        if let Some(old) = self.chord.take_timer(kind) {
            self.timers.cancel(old);
        }
        let handle = self.timers.arm(kind, deadline);
        self.chord.set_timer(kind, Some(handle));
    }

    pub(crate) fn stop_timer(&mut self, kind: TimerKind) {
        if let Some(handle) = self.chord.take_timer(kind) {
            self.timers.cancel(handle);
        }
    }

    /// Cursor image for the active mode.
    pub(crate) fn update_mode_cursor(&mut self) {
        let kind = match self.chord.mode {
            Mode::Killing => CursorKind::Sight,
            Mode::Scrolling => {
                if self.chord.scroll_cursor_dir < 0 {
                    CursorKind::Up
                } else {
                    CursorKind::Down
                }
            }
            Mode::Selecting => CursorKind::Cross,
            Mode::Moving | Mode::Resizing => CursorKind::Box,
            Mode::Idle => CursorKind::Default,
        };
        self.seat.set_cursor(kind);
    }

    pub(crate) fn click_cancel(&mut self) {
        self.stop_timer(TimerKind::ClickTimeout);
        self.chord.click.pending = false;
        self.chord.click.forwarded = false;
    }

    /// Ends the selection overlay and its tracking timer.
    pub(crate) fn stop_select(&mut self) {
        self.stop_timer(TimerKind::Select);
        if self.chord.mode == Mode::Selecting {
            self.chord.mode = Mode::Idle;
        }
        self.comp.overlay_clear();
        self.update_mode_cursor();
    }

    /// Common entry edge for every chord mode: the pending click dies, the
    /// selection overlay stops, and the scroll engine is reset.
    fn enter_mode(&mut self, mode: Mode) {
        self.click_cancel();
        self.stop_select();
        self.scroll_stop();
        self.chord.activated = true;
        self.chord.mode = mode;
        self.update_mode_cursor();
    }

    fn leave_mode(&mut self) {
        self.chord.mode = Mode::Idle;
        self.update_mode_cursor();
        if !self.chord.any_button() {
            self.chord.activated = false;
        }
    }

    fn forward_button(&mut self, time: u32, button: u32, pressed: bool) {
        let state = if pressed {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        };
        self.seat.send_button(time, button, state);
    }

    /// True when the window under the cursor is acme and focused; acme
    /// depends on native mouse chords and must see raw events.
    fn acme_passthrough(&self) -> bool {
        let Some((x, y)) = self.cursor_position() else {
            return false;
        };
        let Some(wid) = self.window_at(x, y) else {
            return false;
        };
        if Some(wid) != self.focused {
            return false;
        }
        self.windows
            .get(wid)
            .and_then(|w| w.app_id.as_deref())
            .is_some_and(|id| id == ACME_APP_ID)
    }

    /// The chord button interpreter.
    pub(crate) fn on_chord_button(&mut self, time: u32, button: u32, pressed: bool) {
        let was_left = self.chord.left;
        let was_right = self.chord.right;

        match button {
            BTN_LEFT => self.chord.left = pressed,
            BTN_MIDDLE => self.chord.middle = pressed,
            BTN_RIGHT => self.chord.right = pressed,
            _ => {}
        }

        debug!(
            "button {:#x} {}",
            button,
            if pressed { "pressed" } else { "released" }
        );

        let is_lr = button == BTN_LEFT || button == BTN_RIGHT;
        let is_chord_button = is_lr || button == BTN_MIDDLE;
        let acme = self.acme_passthrough();

        // Let acme's own two-button chords through untouched.
        if acme && is_lr && pressed {
            let other_down = if button == BTN_LEFT { was_right } else { was_left };
            if other_down {
                self.forward_button(time, button, pressed);
                return;
            }
        }

        // Kill release: close whatever is under the cursor.
        if button == BTN_LEFT && !pressed && self.chord.mode == Mode::Killing {
            if let Some((x, y)) = self.cursor_position() {
                if let Some(target) = self.window_at(x, y) {
                    self.window_close(target);
                }
            }
            self.leave_mode();
            return;
        }

        // Right held, left pressed: arm the kill.
        if button == BTN_LEFT && pressed && was_right && !self.chord.activated && !acme {
            self.enter_mode(Mode::Killing);
            return;
        }

        // Right held, middle pressed: scrolling.
        if button == BTN_MIDDLE && pressed && was_right && !self.chord.activated {
            self.enter_mode(Mode::Scrolling);
            self.chord.scroll_cursor_dir = -1;
            self.update_mode_cursor();

            if self.config.scroll.drag_mode {
                if let Some((x, y)) = self.cursor_position() {
                    self.chord.scroll_drag_last = (x, y);
                }
                self.arm_timer(TimerKind::ScrollDrag, super::scroll::TICK_MS);
            }
            debug!("scroll start");
            return;
        }

        // Middle released while left is held: interactive move.
        if button == BTN_MIDDLE
            && !pressed
            && was_left
            && !self.chord.activated
            && self.chord.mode != Mode::Selecting
            && !acme
        {
            self.enter_mode(Mode::Moving);

            // Anchor for the easing: where the window and cursor started.
            if let Some((x, y)) = self.cursor_position() {
                if let Some(geometry) = self.focused.and_then(|w| self.window_get_geometry(w)) {
                    self.chord.move_start_win = (geometry.x, geometry.y);
                    self.chord.move_start_cursor = (x, y);
                }
            }

            self.arm_timer(TimerKind::MoveScroll, super::scroll::TICK_MS);

            // Forward the release so clients don't see a stuck button.
            self.forward_button(time, button, pressed);
            return;
        }

        // Left released while moving: drop the window.
        if button == BTN_LEFT && !pressed && self.chord.mode == Mode::Moving {
            self.stop_timer(TimerKind::MoveScroll);
            self.leave_mode();
            self.forward_button(time, button, pressed);
            return;
        }

        // Middle released while right is held: interactive resize from the
        // bottom-right edge.
        if button == BTN_MIDDLE
            && !pressed
            && was_right
            && !self.chord.activated
            && self.chord.mode != Mode::Selecting
        {
            self.enter_mode(Mode::Resizing);
            if let Some(focused) = self.focused {
                self.window_begin_resize(focused, EDGE_RIGHT | EDGE_BOTTOM);
            }
            self.forward_button(time, button, pressed);
            return;
        }

        // Right released while resizing: done.
        if button == BTN_RIGHT && !pressed && self.chord.mode == Mode::Resizing {
            if let Some(focused) = self.focused {
                self.window_end_resize(focused);
            }
            self.leave_mode();
            self.forward_button(time, button, pressed);
            return;
        }

        // Left held, middle pressed: the configured 2-1 action.
        if button == BTN_MIDDLE && pressed && was_left && !self.chord.activated {
            self.click_cancel();
            self.stop_select();
            if let Some(focused) = self.focused {
                self.run_chord_action(focused);
            }
            self.chord.activated = true;
            self.forward_button(time, button, pressed);
            return;
        }

        // Swallow the middle release that ends a wheel scroll.
        if button == BTN_MIDDLE && !pressed && self.chord.mode == Mode::Scrolling {
            return;
        }

        if pressed && is_lr && self.chord.mode != Mode::Selecting {
            let other_down = if button == BTN_LEFT { was_right } else { was_left };

            // Any real click interrupts auto-scrolling.
            if self.chord.auto_scrolling {
                self.chord.auto_scrolling = false;
                self.scroll_stop();
            }

            // Only a lone left press moves window focus.
            if button == BTN_LEFT && !other_down {
                if let Some((x, y)) = self.cursor_position() {
                    if let Some(target) = self.window_at(x, y) {
                        self.focus_window(Some(target), "click");
                    }
                }
            }
        }

        // Both main buttons down: select-to-spawn. Same entry edge as the
        // other modes; without a cursor the chord activates but nothing is
        // selected.
        if self.chord.left && self.chord.right && !self.chord.activated && !acme {
            self.click_cancel();
            self.stop_select();
            self.scroll_stop();
            self.chord.activated = true;
            if let Some((x, y)) = self.cursor_position() {
                self.chord.mode = Mode::Selecting;
                self.update_mode_cursor();
                self.chord.start_x = x;
                self.chord.start_y = y;
                self.chord.cur_x = x;
                self.chord.cur_y = y;
                let color = self.config.select.box_color.to_argb();
                let border = self.config.select.box_border;
                self.comp.overlay_set_box(x, y, x, y, color, border);
                self.arm_timer(TimerKind::Select, super::scroll::TICK_MS);
            }
        }

        // While a chord is active swallow left/right events so they don't
        // reach clients.
        if is_chord_button && self.chord.activated && self.chord.mode != Mode::Selecting {
            if !self.chord.right && self.chord.mode == Mode::Scrolling {
                self.chord.mode = Mode::Idle;
                self.update_mode_cursor();
                // Whatever is still pending eases out on its own.
                if self.chord.scroll_pending_px != 0 || self.chord.scroll_pending_px_x != 0 {
                    self.chord.auto_scrolling = true;
                }
            }
            if self.chord.mode != Mode::Scrolling && !self.chord.auto_scrolling {
                debug!("scroll stop");
                self.scroll_stop();
            }
            if !self.chord.any_button() {
                self.chord.activated = false;
            }
            return;
        }

        if button == BTN_MIDDLE {
            if self.chord.mode == Mode::Moving {
                return;
            }
            self.forward_button(time, button, pressed);
            return;
        }

        // A lone left/right press waits out the chord timeout before the
        // client hears about it.
        if is_lr && pressed && self.chord.mode != Mode::Selecting {
            let other_down = if button == BTN_LEFT { was_right } else { was_left };
            if other_down {
                // The chord activates via the block above.
            } else if !self.chord.click.pending {
                self.chord.click = PendingClick {
                    pending: true,
                    forwarded: false,
                    button,
                    time,
                };
                self.arm_timer(
                    TimerKind::ClickTimeout,
                    self.config.chord.click_timeout_ms as u64,
                );
                return;
            }
        }

        if is_lr && !pressed && self.chord.mode != Mode::Selecting {
            if self.chord.click.pending && self.chord.click.button == button {
                if !self.chord.click.forwarded {
                    let (t, b) = (self.chord.click.time, self.chord.click.button);
                    self.seat.send_button(t, b, ButtonState::Pressed);
                }
                self.seat.send_button(time, button, ButtonState::Released);
                self.click_cancel();
                return;
            }
            self.seat.send_button(time, button, ButtonState::Released);
            return;
        }

        // Right released while selecting: the rectangle becomes a terminal.
        if button == BTN_RIGHT && !pressed && self.chord.mode == Mode::Selecting {
            let (x, y) = self
                .cursor_position()
                .unwrap_or((self.chord.cur_x, self.chord.cur_y));
            self.stop_select();
            self.finish_selection(x, y);
        }

        if !self.chord.any_button() {
            self.chord.activated = false;
        }
    }

    /// Converts the selection rectangle into a spawn request. The outer box
    /// is clamped to a minimum size, then shrunk by both border rings so
    /// the spawned window's frame lands exactly on the drawn box.
    fn finish_selection(&mut self, x: i32, y: i32) {
        let bw = self.config.border.total_width();
        let x1 = self.chord.start_x.min(x);
        let y1 = self.chord.start_y.min(y);
        let x2 = self.chord.start_x.max(x);
        let y2 = self.chord.start_y.max(y);

        let mut outer_w = (x2 - x1) as u32;
        let mut outer_h = (y2 - y1) as u32;
        let min = 50 + 2 * bw;
        if outer_w < min {
            outer_w = min;
        }
        if outer_h < min {
            outer_h = min;
        }

        let geometry = Rect {
            x: x1 + bw as i32,
            y: y1 + bw as i32,
            width: if outer_w > 2 * bw { outer_w - 2 * bw } else { 1 },
            height: if outer_h > 2 * bw { outer_h - 2 * bw } else { 1 },
        };

        self.chord.spawn = PendingSpawn {
            pending: true,
            geometry,
        };
        let terminal = self.config.terminal.clone();
        self.spawner.spawn_terminal(
            &terminal.exec,
            &terminal.window_id_flag,
            &terminal.select_app_id,
        );
        debug!(
            "spawned terminal at {},{} {}x{}",
            geometry.x, geometry.y, geometry.width, geometry.height
        );
    }

    /// The configured left-held-middle-press action.
    fn run_chord_action(&mut self, focused: crate::util::Id<super::wm::Window>) {
        use crate::config::ChordAction;

        match self.config.chord.action {
            ChordAction::Sticky => {
                if let Some(window) = self.windows.get_mut(focused) {
                    window.sticky = !window.sticky;
                    debug!("sticky -> {}", window.sticky);
                }
            }
            ChordAction::Fullscreen => {
                if let Some(window) = self.windows.get_mut(focused) {
                    window.sticky = !window.sticky;
                }
                if let Some(screen) = self.current_screen {
                    self.window_set_fullscreen(focused, screen);
                }
            }
            ChordAction::Jump => self.jump_to_nearest(),
        }
    }

    /// The chord axis interpreter.
    pub(crate) fn on_chord_axis(&mut self, time: u32, axis: u32, value120: i32) {
        // Scroll events during a window move would leak to the client
        // under the cursor.
        if self.chord.mode == Mode::Moving {
            return;
        }

        if self.config.scroll.drag_mode {
            // In drag mode the wheel controls zoom while the scroll chord
            // is held.
            if self.config.zoom.enabled
                && self.chord.mode == Mode::Scrolling
                && axis == AXIS_VERTICAL
                && value120 != 0
            {
                if self.chord.zoom_target == 0.0 {
                    self.chord.zoom_target = self.comp.zoom();
                }
                let delta = if value120 < 0 {
                    WHEEL_ZOOM_STEP
                } else {
                    -WHEEL_ZOOM_STEP
                };
                self.chord.zoom_target =
                    (self.chord.zoom_target + delta).clamp(WHEEL_ZOOM_MIN, WHEEL_ZOOM_MAX);
                self.arm_timer(TimerKind::Zoom, 1);
                return;
            }
            self.seat.send_axis(time, axis, value120);
            return;
        }

        if self.chord.mode != Mode::Scrolling {
            self.seat.send_axis(time, axis, value120);
            return;
        }

        // Only vertical wheel input scrolls the viewport.
        if axis != AXIS_VERTICAL || value120 == 0 {
            self.seat.send_axis(time, axis, value120);
            return;
        }

        self.chord.scroll_cursor_dir = if value120 < 0 { -1 } else { 1 };
        self.update_mode_cursor();

        let dy = value120 * self.config.scroll.wheel_px / 120;
        self.chord.scroll_pending_px += dy;
        self.arm_timer(TimerKind::ScrollStep, 1);
    }

    /// Interactive resize bookkeeping; the actual geometry updates flow
    /// through the shell layer.
    pub fn window_begin_resize(&mut self, wid: crate::util::Id<super::wm::Window>, edges: u32) {
        debug!("begin resize edges {:#x}", edges);
        self.resizing = Some((wid, edges));
    }

    pub fn window_end_resize(&mut self, wid: crate::util::Id<super::wm::Window>) {
        if self.resizing.map(|(w, _)| w) == Some(wid) {
            debug!("end resize");
            self.resizing = None;
        }
    }

    /// Interactive move bookkeeping for the public window API; the chord
    /// path drives its own easing instead.
    pub fn window_begin_move(&mut self, wid: crate::util::Id<super::wm::Window>) {
        self.moving = Some(wid);
    }

    pub fn window_end_move(&mut self, wid: crate::util::Id<super::wm::Window>) {
        if self.moving == Some(wid) {
            self.moving = None;
        }
    }
}
