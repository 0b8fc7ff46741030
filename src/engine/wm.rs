//! Window policy: focus, lifecycle, and terminal spawn linking.

use log::{debug, info};

use crate::compositor::View;
use crate::screen::Screen;
use crate::spawn;
use crate::surface::Surface;
use crate::util::{Id, Rect};

use super::Engine;
use super::timer::TimerKind;

/// Resize edges for interactive resizing.
pub const EDGE_RIGHT: u32 = 1 << 0;
pub const EDGE_BOTTOM: u32 = 1 << 1;

/// How far up the process tree we look for a spawning terminal.
const SPAWN_WALK_DEPTH: u32 = 10;

/// Policy record attached to a top-level window view.
pub struct Window {
    pub view: Id<View>,
    pub title: Option<String>,
    pub app_id: Option<String>,
    pub pid: i32,

    pub spawn_parent: Option<Id<Window>>,
    pub spawn_children: Vec<Id<Window>>,
    pub hidden_for_spawn: bool,
    pub saved_geometry: Rect,

    pub sticky: bool,
}

impl Window {
    pub fn new(view: Id<View>) -> Self {
        Self {
            view,
            title: None,
            app_id: None,
            pid: 0,
            spawn_parent: None,
            spawn_children: Vec::new(),
            hidden_for_spawn: false,
            saved_geometry: Rect::default(),
            sticky: false,
        }
    }
}

impl Engine {
    /// Shifts window-manager focus, restyling borders and kicking off the
    /// focus-follow behaviors (zoom reset, auto-centering).
    pub fn focus_window(&mut self, target: Option<Id<Window>>, reason: &str) {
        if self.focused == target {
            return;
        }
        let name = |engine: &Self, wid: Option<Id<Window>>| {
            wid.and_then(|w| engine.windows.get(w))
                .and_then(|w| w.title.clone())
                .unwrap_or_default()
        };
        info!(
            "focus '{}' -> '{}' ({})",
            name(self, self.focused),
            name(self, target),
            reason
        );

        let border = self.config.border.clone();
        if let Some(old_view) = self.focused.and_then(|w| self.windows.get(w)).map(|w| w.view) {
            self.comp.view_set_border(
                old_view,
                border.inner_color_inactive.to_argb(),
                border.inner_width,
                border.outer_color_inactive.to_argb(),
                border.outer_width,
            );
        }

        let target_view = target.and_then(|w| self.windows.get(w)).map(|w| w.view);
        self.seat.set_focus(target_view.map(|v| v.token()));

        // Ease zoom back to normal when focusing a window.
        if self.config.zoom.enabled && target.is_some() && self.comp.zoom() != 1.0 {
            self.chord.zoom_target = 1.0;
            self.arm_timer(TimerKind::Zoom, 1);
        }

        if let Some(view) = target_view {
            self.comp.view_set_border(
                view,
                border.inner_color_active.to_argb(),
                border.inner_width,
                border.outer_color_active.to_argb(),
                border.outer_width,
            );
        }

        self.focused = target;
        self.maybe_auto_center(target);
    }

    /// Centers the newly focused window on the current screen by feeding
    /// the center delta to the scroll engine: both axes in drag mode,
    /// vertical only in wheel mode. Skipped for offscreen windows (unless
    /// focus arrived via jump) and while the user is actively scrolling.
    fn maybe_auto_center(&mut self, target: Option<Id<Window>>) {
        use super::chord::Mode;

        if !self.focus_center || self.chord.mode == Mode::Scrolling {
            return;
        }
        let Some(wid) = target else {
            return;
        };
        let Some(view) = self.windows.get(wid).map(|w| w.view) else {
            return;
        };
        let Some(screen) = self.current_screen.and_then(|id| self.comp.screens.get(id)) else {
            return;
        };
        let screen_geometry = screen.geometry;
        let Some((geometry, shown)) = self.comp.views.get(view).map(|v| (v.geometry, v.visible))
        else {
            return;
        };
        if !(shown || self.chord.jumping) {
            return;
        }
        // Skip windows the client has not sized yet.
        if geometry.width == 0 || geometry.height == 0 {
            return;
        }

        let window_cx = geometry.x + geometry.width as i32 / 2;
        let window_cy = geometry.y + geometry.height as i32 / 2;
        let screen_cx = screen_geometry.x + screen_geometry.width as i32 / 2;
        let screen_cy = screen_geometry.y + screen_geometry.height as i32 / 2;

        let delta_x = if self.config.scroll.drag_mode {
            screen_cx - window_cx
        } else {
            0
        };
        let delta_y = screen_cy - window_cy;

        if delta_x != 0 || delta_y != 0 {
            self.scroll_stop();
            self.chord.scroll_pending_px = delta_y;
            self.chord.scroll_pending_px_x = delta_x;
            self.chord.auto_scrolling = true;
            self.arm_timer(TimerKind::ScrollStep, super::scroll::TICK_MS);
        }
    }

    /// New top-level window announced by the shell layer.
    pub fn window_new(
        &mut self,
        view: Id<View>,
        title: Option<String>,
        app_id: Option<String>,
        pid: i32,
    ) -> Option<Id<Window>> {
        if !self.comp.views.contains(view) {
            return None;
        }
        let mut window = Window::new(view);
        window.title = title;
        window.app_id = app_id.clone();
        window.pid = pid;
        let wid = self.windows.insert(window);
        if let Some(v) = self.comp.views.get_mut(view) {
            v.window = Some(wid);
        }

        let border = self.config.border.clone();
        self.comp.view_set_border(
            view,
            border.inner_color_inactive.to_argb(),
            border.inner_width,
            border.outer_color_inactive.to_argb(),
            border.outer_width,
        );

        self.window_set_stacked(wid);

        if self.config.terminal.spawn_linking && pid > 0 {
            self.link_spawn_parent(wid, pid);
        }

        self.adopt_pending_spawn(wid, app_id.as_deref());

        self.comp.view_show(view);
        info!(
            "window '{}'",
            self.windows
                .get(wid)
                .and_then(|w| w.title.as_deref())
                .unwrap_or("")
        );
        self.focus_window(Some(wid), "new_window");
        Some(wid)
    }

    /// Walks the process tree upward looking for a terminal window the new
    /// window was spawned from. The immediate parent is usually a shell,
    /// so the walk goes several levels.
    fn link_spawn_parent(&mut self, wid: Id<Window>, pid: i32) {
        let mut current = pid;
        let mut terminal = None;
        for _ in 0..SPAWN_WALK_DEPTH {
            if current <= 1 {
                break;
            }
            let Some(parent) = spawn::parent_pid(current) else {
                break;
            };
            if parent <= 1 {
                break;
            }
            if let Some(candidate) = self.find_window_by_pid(parent) {
                if self.is_terminal_window(candidate) {
                    terminal = Some(candidate);
                    break;
                }
            }
            current = parent;
        }

        if let Some(terminal) = terminal {
            self.make_spawn_link(terminal, wid);
        }
    }

    fn find_window_by_pid(&self, pid: i32) -> Option<Id<Window>> {
        self.windows
            .iter()
            .find(|(_, w)| w.pid == pid)
            .map(|(wid, _)| wid)
    }

    /// Matches app id or title against the configured terminal list. Title
    /// is checked too because some terminals only set one of them.
    fn is_terminal_window(&self, wid: Id<Window>) -> bool {
        let Some(window) = self.windows.get(wid) else {
            return false;
        };
        let ids = &self.config.terminal.app_ids;
        let matches = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|v| ids.iter().any(|id| v.contains(id.as_str())))
        };
        matches(&window.app_id) || matches(&window.title)
    }

    /// Hides the terminal and hands its geometry to the spawned child.
    fn make_spawn_link(&mut self, terminal: Id<Window>, child: Id<Window>) {
        let Some(terminal_view) = self.windows.get(terminal).map(|w| w.view) else {
            return;
        };
        let Some(child_view) = self.windows.get(child).map(|w| w.view) else {
            return;
        };
        let Some(geometry) = self.comp.views.get(terminal_view).map(|v| v.geometry) else {
            return;
        };

        if let Some(w) = self.windows.get_mut(child) {
            w.spawn_parent = Some(terminal);
        }
        if let Some(w) = self.windows.get_mut(terminal) {
            w.spawn_children.push(child);
            w.saved_geometry = geometry;
            w.hidden_for_spawn = true;
        }
        debug!("spawn link: hiding terminal for child");
        self.comp.view_hide(terminal_view);
        self.comp.view_set_geometry(child_view, geometry);
    }

    /// Applies a pending select-spawn geometry to a window whose app id
    /// matches the expected selection id. Checked on new-window and on
    /// app-id-changed.
    fn adopt_pending_spawn(&mut self, wid: Id<Window>, app_id: Option<&str>) {
        if !self.chord.spawn.pending {
            return;
        }
        if app_id != Some(self.config.terminal.select_app_id.as_str()) {
            return;
        }
        let mut geometry = self.chord.spawn.geometry;
        if geometry.width < 50 {
            geometry.width = 50;
        }
        if geometry.height < 50 {
            geometry.height = 50;
        }
        if let Some(view) = self.windows.get(wid).map(|w| w.view) {
            self.comp.view_set_geometry(view, geometry);
        }
        self.chord.spawn.pending = false;
    }

    /// Title change from the shell layer.
    pub fn window_title_changed(&mut self, wid: Id<Window>, title: Option<String>) {
        if let Some(window) = self.windows.get_mut(wid) {
            window.title = title;
        }
    }

    /// App id change; may complete a pending select spawn.
    pub fn window_app_id_changed(&mut self, wid: Id<Window>, app_id: Option<String>) {
        if let Some(window) = self.windows.get_mut(wid) {
            window.app_id = app_id.clone();
        }
        self.adopt_pending_spawn(wid, app_id.as_deref());
    }

    /// A window's `entered` handler may request focus on hover.
    pub fn window_entered(&mut self, wid: Id<Window>) {
        if self.windows.contains(wid) {
            self.focus_window(Some(wid), "hover");
        }
    }

    /// Tears down the policy record when the shell destroys the window.
    ///
    /// Spawn children become parentless; a terminal whose last spawn child
    /// died is restored, re-shown and refocused.
    pub fn window_destroyed(&mut self, wid: Id<Window>) {
        if let Some(parent) = self.windows.get(wid).and_then(|w| w.spawn_parent) {
            let last_child = if let Some(terminal) = self.windows.get_mut(parent) {
                terminal.spawn_children.retain(|c| *c != wid);
                terminal.spawn_children.is_empty() && terminal.hidden_for_spawn
            } else {
                false
            };
            if last_child {
                let restore = self
                    .windows
                    .get_mut(parent)
                    .map(|w| {
                        w.hidden_for_spawn = false;
                        (w.view, w.saved_geometry)
                    });
                if let Some((view, geometry)) = restore {
                    self.comp.view_show(view);
                    self.comp.view_set_geometry(view, geometry);
                    self.focus_window(Some(parent), "spawn_child_destroyed");
                }
            }
        }

        let children: Vec<Id<Window>> = self
            .windows
            .get(wid)
            .map(|w| w.spawn_children.clone())
            .unwrap_or_default();
        for child in children {
            if let Some(c) = self.windows.get_mut(child) {
                c.spawn_parent = None;
            }
        }

        if self.focused == Some(wid) {
            self.focus_window(None, "destroy");
        }

        if let Some(window) = self.windows.remove(wid) {
            if let Some(view) = self.comp.views.get_mut(window.view) {
                view.window = None;
            }
        }
    }

    /// Surface teardown from the protocol layer; cascades to the view and
    /// any window record.
    pub fn surface_destroyed(&mut self, surface: Id<Surface>) {
        let wid = self
            .comp
            .surfaces
            .get(surface)
            .and_then(|s| s.view)
            .and_then(|v| self.comp.views.get(v))
            .and_then(|v| v.window);
        if let Some(wid) = wid {
            self.window_destroyed(wid);
        }
        self.comp.destroy_surface(surface);
    }

    /// Asks the window to go away. The shell layer owns the client
    /// round-trip; the policy record falls out when the surface dies.
    pub fn window_close(&mut self, wid: Id<Window>) {
        let Some(window) = self.windows.get(wid) else {
            return;
        };
        info!(
            "closing window '{}'",
            window.title.as_deref().unwrap_or("")
        );
        let surface = self
            .comp
            .views
            .get(window.view)
            .map(|v| v.surface);
        if let Some(surface) = surface {
            self.surface_destroyed(surface);
        }
    }

    pub fn window_show(&mut self, wid: Id<Window>) {
        if let Some(view) = self.windows.get(wid).map(|w| w.view) {
            self.comp.view_show(view);
        }
    }

    pub fn window_hide(&mut self, wid: Id<Window>) {
        if let Some(view) = self.windows.get(wid).map(|w| w.view) {
            self.comp.view_hide(view);
        }
    }

    pub fn window_set_position(&mut self, wid: Id<Window>, x: i32, y: i32) {
        if let Some(view) = self.windows.get(wid).map(|w| w.view) {
            self.comp.view_move(view, x, y);
        }
    }

    pub fn window_set_size(&mut self, wid: Id<Window>, width: u32, height: u32) {
        let Some(geometry) = self.window_get_geometry(wid) else {
            return;
        };
        self.window_set_geometry(
            wid,
            Rect {
                width,
                height,
                ..geometry
            },
        );
    }

    /// Free stacking is the only layout mode; this exists for shell layers
    /// that switch windows between modes.
    pub fn window_set_stacked(&mut self, _wid: Id<Window>) {}

    /// Tiled layout is not supported; the window stays stacked.
    pub fn window_set_tiled(&mut self, wid: Id<Window>) {
        debug!("tiled layout unsupported, keeping window stacked");
        self.window_set_stacked(wid);
    }

    pub fn window_set_geometry(&mut self, wid: Id<Window>, geometry: Rect) {
        if let Some(view) = self.windows.get(wid).map(|w| w.view) {
            self.comp.view_set_geometry(view, geometry);
        }
    }

    pub fn window_get_geometry(&self, wid: Id<Window>) -> Option<Rect> {
        let view = self.windows.get(wid)?.view;
        self.comp.views.get(view).map(|v| v.geometry)
    }

    pub fn window_get_pid(&self, wid: Id<Window>) -> Option<i32> {
        self.windows.get(wid).map(|w| w.pid)
    }

    pub fn window_set_border(
        &mut self,
        wid: Id<Window>,
        inner_color: u32,
        inner_width: u32,
        outer_color: u32,
        outer_width: u32,
    ) {
        if let Some(view) = self.windows.get(wid).map(|w| w.view) {
            self.comp
                .view_set_border(view, inner_color, inner_width, outer_color, outer_width);
        }
    }

    /// Fills the given screen with the window.
    pub fn window_set_fullscreen(&mut self, wid: Id<Window>, screen: Id<Screen>) {
        let Some(geometry) = self.comp.screens.get(screen).map(|s| s.geometry) else {
            return;
        };
        self.window_set_geometry(wid, geometry);
    }

    pub fn window_stack(&mut self, wid: Id<Window>, direction: i32) {
        if let Some(view) = self.windows.get(wid).map(|w| w.view) {
            self.comp.stack_window(view, direction);
        }
    }

    /// Window under the cursor in world coordinates, if any.
    pub fn window_at(&self, x: i32, y: i32) -> Option<Id<Window>> {
        let vid = self.comp.window_at(x, y)?;
        self.comp.views.get(vid).and_then(|v| v.window)
    }

    /// New output announced by the output layer. Starts the cursor tracker
    /// once the first screen exists.
    pub fn screen_new(&mut self, geometry: Rect) -> Option<Id<Screen>> {
        let id = self.comp.create_screen(geometry)?;
        if self.current_screen.is_none() {
            self.current_screen = Some(id);
        }
        self.arm_timer(TimerKind::CursorTrack, super::scroll::TICK_MS);
        Some(id)
    }

    pub fn screen_destroyed(&mut self, id: Id<Screen>) {
        self.comp.destroy_screen(id);
        if self.current_screen == Some(id) {
            self.current_screen = self.comp.screens.ids().next();
        }
    }

    /// Focuses the window nearest to the cursor, excluding the current
    /// focus. Centering is forced on for the duration of the jump so even
    /// offscreen windows scroll into view.
    pub(crate) fn jump_to_nearest(&mut self) {
        let saved_center = self.focus_center;
        self.focus_center = true;
        self.chord.jumping = true;

        let (x, y) = self.cursor_position_raw().unwrap_or((0, 0));
        let mut closest: Option<Id<Window>> = None;
        let mut min_dist = i64::MAX;
        for (wid, window) in self.windows.iter() {
            if Some(wid) == self.focused {
                continue;
            }
            let Some(geometry) = self.comp.views.get(window.view).map(|v| v.geometry) else {
                continue;
            };
            let dx = x as i64 - geometry.x as i64;
            let dy = y as i64 - geometry.y as i64;
            let dist = dx * dx + dy * dy;
            if dist < min_dist {
                min_dist = dist;
                closest = Some(wid);
            }
        }

        if let Some(wid) = closest {
            self.focus_window(Some(wid), "jump");
        }

        // Cleared unconditionally, whether or not a target was found.
        self.chord.jumping = false;
        self.focus_center = saved_center;
    }
}
