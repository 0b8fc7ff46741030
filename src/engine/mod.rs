//! The window manager policy engine.
//!
//! One engine value owns every mutable piece of the core: the compositor
//! pipeline, the window policy records, the chord state machine, the timer
//! queue, and the handles to the external seat and process spawner. All
//! event-loop callbacks land on methods of this type; nothing in the core
//! runs off the loop thread.

pub mod chord;
pub mod cursors;
pub mod scroll;
pub mod timer;
pub mod wm;

#[cfg(test)]
mod tests;

use log::debug;

use crate::compositor::Compositor;
use crate::config::{Config, CursorTheme};
use crate::screen::Screen;
use crate::seat::{ButtonState, CursorMode, PointerSeat, fixed_to_int};
use crate::spawn::Spawner;
use crate::util::{Id, Pool};

use chord::ChordState;
use scroll::ScrollSink;
use timer::{TimerKind, Timers};
use wm::Window;

/// Modifier bits for bindings.
pub mod mods {
    pub const CTRL: u32 = 1 << 0;
    pub const ALT: u32 = 1 << 1;
    pub const LOGO: u32 = 1 << 2;
    pub const SHIFT: u32 = 1 << 3;
    /// Matches any modifier combination.
    pub const ANY: u32 = u32::MAX;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Key,
    Button,
}

/// What a matched binding does. Handlers are typed variants rather than
/// opaque callbacks so the dispatch site carries its own context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    /// Terminate the event loop.
    Quit,
    /// Route the event through the chord state machine.
    Chord,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    kind: BindingKind,
    modifiers: u32,
    value: u32,
    action: BindingAction,
}

#[derive(Debug, Clone, Copy)]
struct AxisBinding {
    modifiers: u32,
    axis: u32,
    action: BindingAction,
}

pub struct Engine {
    pub config: Config,
    pub comp: Compositor,
    pub windows: Pool<Window>,
    pub chord: ChordState,
    pub timers: Timers,
    pub seat: Box<dyn PointerSeat>,
    pub spawner: Box<dyn Spawner>,

    pub focused: Option<Id<Window>>,
    pub current_screen: Option<Id<Screen>>,
    /// Interactive resize in progress via the public window API.
    pub resizing: Option<(Id<Window>, u32)>,
    /// Interactive move in progress via the public window API.
    pub moving: Option<Id<Window>>,
    /// Runtime copy of `scroll.focus_center`; the jump action forces it on
    /// for the duration of the jump.
    pub focus_center: bool,

    pub(crate) scroll_sinks: Vec<Box<dyn ScrollSink>>,
    pub(crate) scrollpos: i32,

    bindings: Vec<Binding>,
    axis_bindings: Vec<AxisBinding>,

    now: u64,
    running: bool,
}

impl Engine {
    pub fn new(
        config: Config,
        comp: Compositor,
        seat: Box<dyn PointerSeat>,
        spawner: Box<dyn Spawner>,
    ) -> Self {
        let focus_center = config.scroll.focus_center;
        let mut engine = Self {
            config,
            comp,
            windows: Pool::new(),
            chord: ChordState::default(),
            timers: Timers::new(),
            seat,
            spawner,
            focused: None,
            current_screen: None,
            resizing: None,
            moving: None,
            focus_center,
            scroll_sinks: Vec::new(),
            scrollpos: 0,
            bindings: Vec::new(),
            axis_bindings: Vec::new(),
            now: 0,
            running: true,
        };
        engine.install_default_bindings();
        engine.apply_cursor_theme();
        engine
    }

    /// Chord buttons, both scroll axes, and the quit key.
    fn install_default_bindings(&mut self) {
        use crate::seat::{AXIS_HORIZONTAL, AXIS_VERTICAL, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT};

        self.add_binding(BindingKind::Button, mods::ANY, BTN_LEFT, BindingAction::Chord);
        self.add_binding(BindingKind::Button, mods::ANY, BTN_MIDDLE, BindingAction::Chord);
        self.add_binding(BindingKind::Button, mods::ANY, BTN_RIGHT, BindingAction::Chord);
        self.add_axis_binding(mods::ANY, AXIS_VERTICAL, BindingAction::Chord);
        self.add_axis_binding(mods::ANY, AXIS_HORIZONTAL, BindingAction::Chord);
        self.add_binding(
            BindingKind::Key,
            mods::LOGO | mods::SHIFT,
            'q' as u32,
            BindingAction::Quit,
        );
    }

    /// With the `nein` profile the compositor owns the cursor plane: the
    /// builtin image set is uploaded for every chord mode, then the idle
    /// cursor is selected.
    fn apply_cursor_theme(&mut self) {
        if self.config.cursor.theme != CursorTheme::Nein {
            return;
        }
        self.seat.set_cursor_mode(CursorMode::Compositor);
        for (kind, image) in cursors::theme_images() {
            self.seat.set_cursor_image(
                kind,
                &image.pixels,
                image.width,
                image.height,
                image.hotspot_x,
                image.hotspot_y,
            );
        }
        self.update_mode_cursor();
    }

    pub fn add_binding(&mut self, kind: BindingKind, modifiers: u32, value: u32, action: BindingAction) {
        self.bindings.push(Binding {
            kind,
            modifiers,
            value,
            action,
        });
    }

    pub fn add_axis_binding(&mut self, modifiers: u32, axis: u32, action: BindingAction) {
        self.axis_bindings.push(AxisBinding {
            modifiers,
            axis,
            action,
        });
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Cumulative signed vertical scroll offset.
    pub fn scroll_position(&self) -> i32 {
        self.scrollpos
    }

    /// Registers a scroll-position client; it receives the current value
    /// immediately and every non-zero vertical step from then on.
    pub fn bind_scroll_sink(&mut self, mut sink: Box<dyn ScrollSink>) {
        sink.scroll_position(self.scrollpos);
        self.scroll_sinks.push(sink);
    }

    /// Key event entry point.
    pub fn handle_key(&mut self, _time: u32, keysym: u32, modifiers: u32, pressed: bool) {
        if !pressed {
            return;
        }
        for binding in &self.bindings {
            if binding.kind != BindingKind::Key || binding.value != keysym {
                continue;
            }
            if binding.modifiers != mods::ANY && binding.modifiers != modifiers {
                continue;
            }
            match binding.action {
                BindingAction::Quit => {
                    debug!("quit binding pressed");
                    self.running = false;
                }
                BindingAction::Chord => {}
            }
            return;
        }
    }

    /// Button event entry point. A press raises and pointer-focuses the
    /// window under the cursor before the chord machine runs; buttons with
    /// no binding forward to the client untouched.
    pub fn handle_button(&mut self, time: u32, button: u32, pressed: bool) {
        if pressed {
            if let Some((x, y)) = self.cursor_position_raw() {
                if let Some(vid) = self.comp.view_at(x, y) {
                    self.seat.set_focus(Some(vid.token()));
                    self.comp.raise_window(vid);
                }
            }
        }

        let action = self
            .bindings
            .iter()
            .find(|b| b.kind == BindingKind::Button && b.value == button)
            .map(|b| b.action);
        match action {
            Some(BindingAction::Chord) => self.on_chord_button(time, button, pressed),
            Some(BindingAction::Quit) => {
                if pressed {
                    self.running = false;
                }
            }
            None => {
                let state = if pressed {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                self.seat.send_button(time, button, state);
            }
        }
    }

    /// Axis event entry point. Axis bindings are registered with ANY
    /// modifiers; axis events carry no modifier state of their own.
    pub fn handle_axis(&mut self, time: u32, axis: u32, value120: i32) {
        let action = self
            .axis_bindings
            .iter()
            .find(|b| b.axis == axis && b.modifiers == mods::ANY)
            .map(|b| b.action);
        match action {
            Some(BindingAction::Chord) => self.on_chord_axis(time, axis, value120),
            Some(BindingAction::Quit) => self.running = false,
            None => self.seat.send_axis(time, axis, value120),
        }
    }

    /// Motion entry point: pointer focus follows the cursor while no
    /// buttons are held. Window focus is not affected.
    pub fn handle_motion(&mut self, _time: u32, fx: i32, fy: i32) {
        if self.chord.left || self.chord.middle || self.chord.right {
            return;
        }
        let (x, y) = (fixed_to_int(fx), fixed_to_int(fy));
        let token = self.comp.view_at(x, y).map(|vid| vid.token());
        self.seat.set_focus(token);
    }

    /// Frame signal for a screen's in-flight presentation.
    pub fn handle_frame(&mut self, screen: Id<Screen>) {
        self.comp.handle_frame(screen);
    }

    /// Advances the virtual clock: drains due timers in deadline order,
    /// then runs any posted update idle.
    pub fn advance(&mut self, now: u64) {
        self.now = self.now.max(now);
        while let Some((_, kind)) = self.timers.pop_due(self.now) {
            self.dispatch_timer(kind);
        }
        self.run_idle();
    }

    /// Runs pending idle work (compositor updates).
    pub fn run_idle(&mut self) {
        while self.comp.take_update_posted() {
            self.comp.perform();
        }
    }

    /// Next timer deadline, for the outer event loop's poll timeout.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.timers.next_deadline()
    }

    fn dispatch_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Select => self.tick_select(),
            TimerKind::ClickTimeout => self.tick_click_timeout(),
            TimerKind::ScrollStep => self.tick_scroll(),
            TimerKind::ScrollDrag => self.tick_scroll_drag(),
            TimerKind::MoveScroll => self.tick_move_scroll(),
            TimerKind::Zoom => self.tick_zoom(),
            TimerKind::CursorTrack => self.tick_cursor(),
        }
    }

    /// Raw cursor position in global integer coordinates.
    pub(crate) fn cursor_position_raw(&self) -> Option<(i32, i32)> {
        let (fx, fy) = self.seat.cursor_position()?;
        Some((fixed_to_int(fx), fixed_to_int(fy)))
    }

    /// Cursor position in world coordinates: under zoom the screen-space
    /// cursor is mapped back through the zoom transform about the current
    /// screen's center.
    pub(crate) fn cursor_position(&self) -> Option<(i32, i32)> {
        let (mut x, mut y) = self.cursor_position_raw()?;
        if self.config.zoom.enabled {
            let zoom = self.comp.zoom();
            if zoom != 1.0 {
                if let Some(screen) = self.current_screen.and_then(|id| self.comp.screens.get(id)) {
                    let cx = screen.geometry.x + screen.geometry.width as i32 / 2;
                    let cy = screen.geometry.y + screen.geometry.height as i32 / 2;
                    x = ((x - cx) as f32 / zoom) as i32 + cx;
                    y = ((y - cy) as f32 / zoom) as i32 + cy;
                }
            }
        }
        Some((x, y))
    }
}
