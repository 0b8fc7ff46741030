use std::cell::RefCell;
use std::rc::Rc;

use super::chord::Mode;
use super::*;
use crate::compositor::Compositor;
use crate::config::Config;
use crate::render::{BufferFlags, Format, Renderer, SoftwareRenderer};
use crate::seat::{
    BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, ButtonState, CursorKind, CursorMode, Fixed, int_to_fixed,
};
use crate::util::{Id, Rect, Region};

#[derive(Debug, Clone, PartialEq)]
enum SeatEvent {
    Button(u32, u32, bool),
    Axis(u32, u32, i32),
}

#[derive(Default)]
struct SeatLog {
    events: Vec<SeatEvent>,
    cursor: Option<(i32, i32)>,
    cursor_kind: Option<CursorKind>,
    cursor_images: Vec<CursorKind>,
    focus: Option<u64>,
}

struct FakeSeat(Rc<RefCell<SeatLog>>);

impl crate::seat::PointerSeat for FakeSeat {
    fn cursor_position(&self) -> Option<(Fixed, Fixed)> {
        self.0
            .borrow()
            .cursor
            .map(|(x, y)| (int_to_fixed(x), int_to_fixed(y)))
    }

    fn set_focus(&mut self, token: Option<u64>) {
        self.0.borrow_mut().focus = token;
    }

    fn send_button(&mut self, time: u32, button: u32, state: ButtonState) {
        self.0.borrow_mut().events.push(SeatEvent::Button(
            time,
            button,
            state == ButtonState::Pressed,
        ));
    }

    fn send_axis(&mut self, time: u32, axis: u32, value120: i32) {
        self.0
            .borrow_mut()
            .events
            .push(SeatEvent::Axis(time, axis, value120));
    }

    fn set_cursor(&mut self, kind: CursorKind) {
        self.0.borrow_mut().cursor_kind = Some(kind);
    }

    fn set_cursor_mode(&mut self, _mode: CursorMode) {}

    fn set_cursor_image(
        &mut self,
        kind: CursorKind,
        pixels: &[u32],
        width: u32,
        height: u32,
        _hotspot_x: i32,
        _hotspot_y: i32,
    ) {
        assert_eq!(pixels.len(), (width * height) as usize);
        self.0.borrow_mut().cursor_images.push(kind);
    }
}

struct FakeSpawner(Rc<RefCell<Vec<(String, String, String)>>>);

impl crate::spawn::Spawner for FakeSpawner {
    fn spawn_terminal(&mut self, exec: &str, flag: &str, app_id: &str) -> Option<i32> {
        self.0
            .borrow_mut()
            .push((exec.to_string(), flag.to_string(), app_id.to_string()));
        Some(4242)
    }
}

struct Harness {
    engine: Engine,
    seat: Rc<RefCell<SeatLog>>,
    spawns: Rc<RefCell<Vec<(String, String, String)>>>,
}

fn harness_with(config: Config) -> Harness {
    let seat = Rc::new(RefCell::new(SeatLog::default()));
    let spawns = Rc::new(RefCell::new(Vec::new()));
    let comp = Compositor::new(
        Box::new(SoftwareRenderer::new_scanout()),
        Box::new(SoftwareRenderer::new_shm()),
        0xff10_1010,
    );
    let engine = Engine::new(
        config,
        comp,
        Box::new(FakeSeat(Rc::clone(&seat))),
        Box::new(FakeSpawner(Rc::clone(&spawns))),
    );
    Harness {
        engine,
        seat,
        spawns,
    }
}

/// Standard harness: one 1000x800 screen, focus centering off so window
/// churn does not inject scroll of its own.
fn harness() -> Harness {
    let mut config = Config::default();
    config.scroll.focus_center = false;
    let mut h = harness_with(config);
    h.engine.screen_new(Rect::new(0, 0, 1000, 800));
    h
}

/// Harness with focus centering on, for the auto-center paths.
fn centering_harness() -> Harness {
    let mut h = harness_with(Config::default());
    h.engine.screen_new(Rect::new(0, 0, 1000, 800));
    h
}

impl Harness {
    fn set_cursor(&mut self, x: i32, y: i32) {
        self.seat.borrow_mut().cursor = Some((x, y));
    }

    fn press(&mut self, time: u32, button: u32) {
        self.engine.advance(time as u64);
        self.engine.handle_button(time, button, true);
    }

    fn release(&mut self, time: u32, button: u32) {
        self.engine.advance(time as u64);
        self.engine.handle_button(time, button, false);
    }

    /// Button events the client actually received.
    fn client_buttons(&self) -> Vec<(u32, u32, bool)> {
        self.seat
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                SeatEvent::Button(t, b, p) => Some((*t, *b, *p)),
                _ => None,
            })
            .collect()
    }

    /// Creates a window with a filled buffer, input over its whole area,
    /// shown and focused.
    fn window(&mut self, x: i32, y: i32, w: u32, h: u32, app_id: &str) -> Id<wm::Window> {
        let sid = self.engine.comp.create_surface();
        let vid = self.engine.comp.create_view(sid).expect("view");
        let buffer = self
            .engine
            .comp
            .scanout
            .create_buffer(
                w,
                h,
                Format::Xrgb8888,
                BufferFlags {
                    map: true,
                    scanout: false,
                },
            )
            .expect("buffer");
        self.engine.comp.view_attach(vid, Some(buffer)).expect("attach");
        self.engine.comp.view_move(vid, x, y);
        let surface = self.engine.comp.surfaces.get_mut(sid).expect("surface");
        surface.input = Region::from_rect(Rect::new(0, 0, w, h));
        surface.damage = Region::from_rect(Rect::new(0, 0, w, h));
        self.engine
            .window_new(vid, Some(app_id.to_string()), Some(app_id.to_string()), 0)
            .expect("window")
    }

    /// Runs 16 ms ticks until the scroll accumulators drain.
    fn run_scroll_to_convergence(&mut self) -> u32 {
        let mut ticks = 0;
        while self.engine.chord.scroll_pending_px != 0 || self.engine.chord.scroll_pending_px_x != 0
        {
            let now = self.engine.now() + 16;
            self.engine.advance(now);
            ticks += 1;
            assert!(ticks < 1000, "scroll did not converge");
        }
        // One more tick lets the engine observe the drained state.
        let now = self.engine.now() + 16;
        self.engine.advance(now);
        ticks
    }
}

#[test]
fn lone_click_forwards_after_timeout_with_original_timestamps() {
    let mut h = harness();
    h.set_cursor(10, 10);

    h.press(100, BTN_LEFT);
    assert!(h.client_buttons().is_empty(), "press is buffered");

    // Nothing forwards before the deadline.
    h.engine.advance(224);
    assert!(h.client_buttons().is_empty());

    h.engine.advance(225);
    assert_eq!(h.client_buttons(), vec![(100, BTN_LEFT, true)]);

    h.release(240, BTN_LEFT);
    assert_eq!(
        h.client_buttons(),
        vec![(100, BTN_LEFT, true), (240, BTN_LEFT, false)]
    );
}

#[test]
fn early_release_forwards_press_and_release_immediately() {
    let mut h = harness();
    h.set_cursor(10, 10);

    h.press(100, BTN_LEFT);
    h.release(140, BTN_LEFT);
    assert_eq!(
        h.client_buttons(),
        vec![(100, BTN_LEFT, true), (140, BTN_LEFT, false)]
    );

    // The timeout later must not duplicate the press.
    h.engine.advance(500);
    assert_eq!(h.client_buttons().len(), 2);
}

#[test]
fn chord_absorbs_both_clicks_and_starts_selection() {
    let mut h = harness();
    let mut config = Config::default();
    config.chord.click_timeout_ms = 250;
    h.engine.config = config;
    h.set_cursor(400, 300);

    h.press(100, BTN_LEFT);
    h.press(150, BTN_RIGHT);

    assert_eq!(h.engine.chord.mode, Mode::Selecting);
    assert!(h.engine.comp.overlay().active);
    assert_eq!(h.engine.comp.overlay().x, 400);
    assert_eq!(h.engine.comp.overlay().y, 300);

    // Past the timeout: still nothing reached the client.
    h.engine.advance(500);
    assert!(h.client_buttons().is_empty());
}

#[test]
fn selection_release_spawns_terminal_with_compensated_geometry() {
    let mut config = Config::default();
    config.border.outer_width = 4;
    config.border.inner_width = 4;
    let mut h = harness_with(config);
    h.engine.screen_new(Rect::new(0, 0, 1000, 800));
    h.set_cursor(100, 100);

    h.press(100, BTN_LEFT);
    h.press(150, BTN_RIGHT);
    assert_eq!(h.engine.chord.mode, Mode::Selecting);

    h.set_cursor(300, 260);
    h.release(400, BTN_RIGHT);

    assert_eq!(h.engine.chord.mode, Mode::Idle);
    assert!(h.engine.chord.spawn.pending);
    let geometry = h.engine.chord.spawn.geometry;
    assert_eq!(
        (geometry.x, geometry.y, geometry.width, geometry.height),
        (108, 108, 184, 144)
    );
    assert_eq!(
        h.spawns.borrow().as_slice(),
        &[(
            "havoc".to_string(),
            "-i".to_string(),
            "waychord-select".to_string()
        )]
    );
    assert!(!h.engine.comp.overlay().active);

    // The next window with the selection app id adopts the geometry.
    h.release(420, BTN_LEFT);
    let wid = h.window(0, 0, 10, 10, "waychord-select");
    assert!(!h.engine.chord.spawn.pending);
    assert_eq!(h.engine.window_get_geometry(wid), Some(geometry));
}

#[test]
fn tiny_selection_clamps_to_minimum_content_size() {
    let mut config = Config::default();
    config.border.outer_width = 4;
    config.border.inner_width = 4;
    let mut h = harness_with(config);
    h.engine.screen_new(Rect::new(0, 0, 1000, 800));
    h.set_cursor(100, 100);

    h.press(100, BTN_LEFT);
    h.press(150, BTN_RIGHT);
    h.set_cursor(105, 103);
    h.release(200, BTN_RIGHT);

    let geometry = h.engine.chord.spawn.geometry;
    // Outer box clamps to 50 + 2*8 per axis, content keeps 50x50.
    assert_eq!((geometry.width, geometry.height), (50, 50));
}

#[test]
fn kill_chord_closes_window_under_cursor() {
    let mut h = harness();
    let victim = h.window(100, 100, 200, 200, "doomed");
    h.set_cursor(150, 150);

    h.press(100, BTN_RIGHT);
    h.press(150, BTN_LEFT);
    assert_eq!(h.engine.chord.mode, Mode::Killing);

    h.release(200, BTN_LEFT);
    assert_eq!(h.engine.chord.mode, Mode::Idle);
    assert!(h.engine.windows.get(victim).is_none());

    // Neither button reached the client.
    h.release(220, BTN_RIGHT);
    assert!(h.client_buttons().is_empty());
}

#[test]
fn chord_modes_are_mutually_exclusive() {
    let mut h = harness();
    h.window(0, 0, 500, 500, "app");
    h.set_cursor(100, 100);

    h.press(100, BTN_LEFT);
    h.press(150, BTN_RIGHT);
    assert_eq!(h.engine.chord.mode, Mode::Selecting);

    // A second press of an already-held chord cannot stack a mode.
    h.release(200, BTN_RIGHT);
    assert_eq!(h.engine.chord.mode, Mode::Idle);

    h.release(220, BTN_LEFT);
    h.press(300, BTN_RIGHT);
    h.press(320, BTN_MIDDLE);
    assert_eq!(h.engine.chord.mode, Mode::Scrolling);
    h.press(340, BTN_LEFT);
    assert_eq!(h.engine.chord.mode, Mode::Scrolling, "kill needs a fresh chord");
}

#[test]
fn acme_receives_raw_chords_when_focused() {
    let mut h = harness();
    h.window(0, 0, 500, 500, "acme");
    h.set_cursor(100, 100);
    h.seat.borrow_mut().events.clear();

    h.press(100, BTN_RIGHT);
    h.press(150, BTN_LEFT);

    // The second button of acme's 3-1 chord passes through raw; no kill
    // mode is armed.
    assert_eq!(h.engine.chord.mode, Mode::Idle);
    assert_eq!(h.client_buttons(), vec![(150, BTN_LEFT, true)]);
}

#[test]
fn sticky_action_toggles_focused_window() {
    let mut h = harness();
    let wid = h.window(0, 0, 300, 300, "app");
    h.set_cursor(50, 50);
    h.seat.borrow_mut().events.clear();

    h.press(100, BTN_LEFT);
    h.press(150, BTN_MIDDLE);
    assert!(h.engine.windows.get(wid).unwrap().sticky);
    // The middle press is forwarded, the buffered left press is not.
    assert_eq!(h.client_buttons(), vec![(150, BTN_MIDDLE, true)]);

    h.release(200, BTN_MIDDLE);
    h.release(220, BTN_LEFT);
    h.press(300, BTN_LEFT);
    h.press(320, BTN_MIDDLE);
    assert!(!h.engine.windows.get(wid).unwrap().sticky);
}

#[test]
fn jump_action_focuses_nearest_other_window() {
    let mut config = Config::default();
    config.chord.action = crate::config::ChordAction::Jump;
    config.scroll.focus_center = false;
    let mut h = harness_with(config);
    h.engine.screen_new(Rect::new(0, 0, 1000, 800));

    let far = h.window(800, 600, 100, 100, "far");
    let near = h.window(200, 150, 100, 100, "near");
    let focused = h.window(0, 0, 100, 100, "focused");
    assert_eq!(h.engine.focused, Some(focused));

    h.set_cursor(150, 150);
    h.press(100, BTN_LEFT);
    h.press(150, BTN_MIDDLE);

    assert_eq!(h.engine.focused, Some(near));
    assert_ne!(h.engine.focused, Some(far));
    assert!(!h.engine.chord.jumping, "jump flag clears unconditionally");
    assert!(!h.engine.focus_center, "focus_center restored after jump");
}

#[test]
fn move_chord_eases_window_toward_cursor() {
    let mut h = harness();
    let wid = h.window(100, 100, 200, 200, "app");
    h.set_cursor(150, 150);
    h.seat.borrow_mut().events.clear();

    h.press(100, BTN_MIDDLE);
    h.press(120, BTN_LEFT);
    h.release(140, BTN_MIDDLE);
    assert_eq!(h.engine.chord.mode, Mode::Moving);

    // Drag right/down by 100 and let the easing run a few ticks.
    h.set_cursor(250, 250);
    for _ in 0..10 {
        let now = h.engine.now() + 16;
        h.engine.advance(now);
    }
    let geometry = h.engine.window_get_geometry(wid).unwrap();
    assert!(geometry.x > 130, "window moved toward cursor, got {}", geometry.x);
    assert!(geometry.y > 130);

    h.release(600, BTN_LEFT);
    assert_eq!(h.engine.chord.mode, Mode::Idle);
    // Client saw the middle press, middle release, and left release, but
    // never a left press.
    let buttons = h.client_buttons();
    assert!(buttons.contains(&(140, BTN_MIDDLE, false)));
    assert!(buttons.iter().all(|(_, b, p)| !(*b == BTN_LEFT && *p)));
}

#[test]
fn resize_chord_begins_and_ends_interactive_resize() {
    let mut h = harness();
    let wid = h.window(100, 100, 200, 200, "app");
    h.set_cursor(150, 150);

    h.press(100, BTN_MIDDLE);
    h.press(120, BTN_RIGHT);
    h.release(140, BTN_MIDDLE);
    assert_eq!(h.engine.chord.mode, Mode::Resizing);
    assert_eq!(h.engine.resizing.map(|(w, _)| w), Some(wid));

    h.release(200, BTN_RIGHT);
    assert_eq!(h.engine.chord.mode, Mode::Idle);
    assert!(h.engine.resizing.is_none());
}

#[test]
fn wheel_scroll_translates_views_and_broadcasts_position() {
    struct Sink(Rc<RefCell<Vec<i32>>>);
    impl super::scroll::ScrollSink for Sink {
        fn scroll_position(&mut self, pos: i32) {
            self.0.borrow_mut().push(pos);
        }
    }

    let mut h = harness();
    let on_screen = h.window(100, 100, 200, 200, "a");
    let off_screen = h.window(5000, 100, 200, 200, "b");
    let positions = Rc::new(RefCell::new(Vec::new()));
    h.engine.bind_scroll_sink(Box::new(Sink(Rc::clone(&positions))));
    assert_eq!(positions.borrow().as_slice(), &[0], "bind sends current value");

    h.set_cursor(400, 300);
    h.press(100, BTN_RIGHT);
    h.press(120, BTN_MIDDLE);
    assert_eq!(h.engine.chord.mode, Mode::Scrolling);

    h.engine.handle_axis(140, 0, 120);
    assert_eq!(h.engine.chord.scroll_pending_px, 64);
    h.run_scroll_to_convergence();

    assert_eq!(h.engine.scroll_position(), 64);
    assert_eq!(
        h.engine.window_get_geometry(on_screen).unwrap().y,
        100 + 64
    );
    // Wheel mode leaves windows on other screens alone.
    assert_eq!(h.engine.window_get_geometry(off_screen).unwrap().y, 100);
    assert_eq!(*positions.borrow().last().unwrap(), 64);
    assert!(positions.borrow().len() > 2, "one update per step");
}

#[test]
fn sticky_window_is_immune_to_scrolling() {
    let mut h = harness();
    let sticky = h.window(100, 100, 100, 100, "sticky");
    let normal = h.window(300, 100, 100, 100, "normal");
    h.engine.windows.get_mut(sticky).unwrap().sticky = true;

    h.set_cursor(400, 300);
    h.press(100, BTN_RIGHT);
    h.press(120, BTN_MIDDLE);
    h.engine.handle_axis(140, 0, 120);
    h.run_scroll_to_convergence();

    assert_eq!(h.engine.window_get_geometry(sticky).unwrap().y, 100);
    assert_eq!(h.engine.window_get_geometry(normal).unwrap().y, 164);
}

#[test]
fn releasing_scroll_chord_lets_pending_pixels_ease_out() {
    let mut h = harness();
    let wid = h.window(100, 100, 100, 100, "a");
    h.set_cursor(400, 300);

    h.press(100, BTN_RIGHT);
    h.press(120, BTN_MIDDLE);
    h.engine.handle_axis(140, 0, 240);
    assert_eq!(h.engine.chord.scroll_pending_px, 128);

    // Drop the whole chord mid-scroll; the remainder still lands.
    h.release(150, BTN_MIDDLE);
    h.release(160, BTN_RIGHT);
    assert_eq!(h.engine.chord.mode, Mode::Idle);
    assert!(h.engine.chord.auto_scrolling);

    h.run_scroll_to_convergence();
    assert_eq!(h.engine.window_get_geometry(wid).unwrap().y, 228);
}

#[test]
fn selection_entry_stops_residual_auto_scroll() {
    let mut h = harness();
    let wid = h.window(100, 100, 100, 100, "a");
    h.set_cursor(400, 300);

    // Leave an eased-out scroll in flight, chord fully released.
    h.press(100, BTN_RIGHT);
    h.press(120, BTN_MIDDLE);
    h.engine.handle_axis(140, 0, 600);
    h.release(150, BTN_MIDDLE);
    h.release(160, BTN_RIGHT);
    assert!(h.engine.chord.auto_scrolling);
    assert_ne!(h.engine.chord.scroll_pending_px, 0);

    // Chording L+R right away must not select over a moving stack.
    h.press(200, BTN_LEFT);
    h.press(210, BTN_RIGHT);
    assert_eq!(h.engine.chord.mode, Mode::Selecting);
    assert!(!h.engine.chord.auto_scrolling);
    assert_eq!(h.engine.chord.scroll_pending_px, 0);
    assert_eq!(h.engine.chord.scroll_pending_px_x, 0);

    // No further ticks translate the stack under the overlay.
    let y = h.engine.window_get_geometry(wid).unwrap().y;
    for _ in 0..4 {
        let now = h.engine.now() + 16;
        h.engine.advance(now);
    }
    assert_eq!(h.engine.window_get_geometry(wid).unwrap().y, y);
}

#[test]
fn scroll_converges_monotonically() {
    let mut h = harness();
    h.window(100, 100, 100, 100, "a");
    h.set_cursor(400, 300);
    h.press(100, BTN_RIGHT);
    h.press(120, BTN_MIDDLE);
    h.engine.handle_axis(140, 0, 1200);
    assert_eq!(h.engine.chord.scroll_pending_px, 640);

    let mut last = h.engine.chord.scroll_pending_px.abs();
    let mut ticks = 0;
    while h.engine.chord.scroll_pending_px != 0 {
        let now = h.engine.now() + 16;
        h.engine.advance(now);
        let rem = h.engine.chord.scroll_pending_px.abs();
        assert!(rem < last, "remainder must shrink every tick");
        last = rem;
        ticks += 1;
        assert!(ticks < 64, "convergence is logarithmic, got {} ticks", ticks);
    }
}

#[test]
fn focus_auto_center_vertical_mode() {
    let mut h = centering_harness();
    let other = h.window(0, 0, 100, 100, "other");
    let target = h.window(400, 900, 200, 200, "target");
    // Focus currently on `target` (created last); switch away, then focus
    // it again to trigger centering.
    h.engine.focus_window(Some(other), "test");
    h.engine.chord.scroll_pending_px = 0;
    h.engine.chord.auto_scrolling = false;

    h.engine.focus_window(Some(target), "test");
    assert!(h.engine.chord.auto_scrolling);
    assert_eq!(h.engine.chord.scroll_pending_px, -600);
    assert_eq!(h.engine.chord.scroll_pending_px_x, 0);

    h.run_scroll_to_convergence();
    assert_eq!(h.engine.window_get_geometry(target).unwrap().y, 300);
}

#[test]
fn auto_center_suppressed_while_user_scrolls() {
    let mut h = centering_harness();
    let a = h.window(0, 0, 100, 100, "a");
    let b = h.window(400, 900, 200, 200, "b");
    h.engine.focus_window(Some(a), "test");

    h.set_cursor(400, 300);
    h.press(100, BTN_RIGHT);
    h.press(120, BTN_MIDDLE);
    assert_eq!(h.engine.chord.mode, Mode::Scrolling);

    h.engine.focus_window(Some(b), "test");
    assert!(!h.engine.chord.auto_scrolling);
    assert_eq!(h.engine.chord.scroll_pending_px, 0);
}

#[test]
fn zoom_eases_toward_wheel_target() {
    let mut config = Config::default();
    config.scroll.drag_mode = true;
    let mut h = harness_with(config);
    h.engine.screen_new(Rect::new(0, 0, 1000, 800));
    h.set_cursor(400, 300);

    h.press(100, BTN_RIGHT);
    h.press(120, BTN_MIDDLE);
    assert_eq!(h.engine.chord.mode, Mode::Scrolling);

    // Wheel up zooms in by one step.
    h.engine.handle_axis(140, 0, -120);
    assert!((h.engine.chord.zoom_target - 1.15).abs() < 1e-6);

    let now = h.engine.now() + 1;
    h.engine.advance(now);
    assert!((h.engine.comp.zoom() - 1.0375).abs() < 0.001);

    for _ in 0..25 {
        let now = h.engine.now() + 16;
        h.engine.advance(now);
    }
    assert_eq!(h.engine.comp.zoom(), 1.15);
}

#[test]
fn focusing_a_window_eases_zoom_back_to_normal() {
    let mut h = harness();
    let a = h.window(0, 0, 100, 100, "a");
    let b = h.window(200, 0, 100, 100, "b");
    h.engine.focus_window(Some(a), "test");
    h.engine.comp.set_zoom(2.0);

    h.engine.focus_window(Some(b), "test");
    assert_eq!(h.engine.chord.zoom_target, 1.0);
    for _ in 0..60 {
        let now = h.engine.now() + 16;
        h.engine.advance(now);
    }
    assert_eq!(h.engine.comp.zoom(), 1.0);
}

#[test]
fn move_edge_autoscroll_produces_parallax() {
    let mut h = harness();
    let background = h.window(500, 500, 100, 100, "bg");
    let dragged = h.window(100, 100, 200, 200, "drag");
    h.engine.focus_window(Some(dragged), "test");

    h.set_cursor(150, 150);
    h.press(100, BTN_MIDDLE);
    h.press(120, BTN_LEFT);
    h.release(140, BTN_MIDDLE);
    assert_eq!(h.engine.chord.mode, Mode::Moving);

    // Cursor inside the top edge strip: other windows scroll down.
    h.set_cursor(150, 10);
    for _ in 0..8 {
        let now = h.engine.now() + 16;
        h.engine.advance(now);
    }
    assert!(
        h.engine.window_get_geometry(background).unwrap().y > 500,
        "background window should drift down"
    );
}

#[test]
fn spawn_child_destroy_restores_hidden_terminal() {
    let mut h = harness();
    let terminal = h.window(100, 100, 400, 300, "havoc");
    let child = h.window(0, 0, 10, 10, "editor");

    // Wire the spawn link the way the /proc walk would.
    let saved = h.engine.window_get_geometry(terminal).unwrap();
    let terminal_view = h.engine.windows.get(terminal).unwrap().view;
    h.engine.windows.get_mut(child).unwrap().spawn_parent = Some(terminal);
    {
        let t = h.engine.windows.get_mut(terminal).unwrap();
        t.spawn_children.push(child);
        t.saved_geometry = saved;
        t.hidden_for_spawn = true;
    }
    h.engine.comp.view_hide(terminal_view);
    assert!(!h.engine.comp.views.get(terminal_view).unwrap().visible);

    h.engine.window_destroyed(child);

    assert!(h.engine.comp.views.get(terminal_view).unwrap().visible);
    assert_eq!(h.engine.window_get_geometry(terminal), Some(saved));
    assert_eq!(h.engine.focused, Some(terminal));
    assert!(!h.engine.windows.get(terminal).unwrap().hidden_for_spawn);
}

#[test]
fn destroying_window_orphans_spawn_children() {
    let mut h = harness();
    let parent = h.window(100, 100, 400, 300, "havoc");
    let child = h.window(0, 0, 10, 10, "editor");
    h.engine.windows.get_mut(child).unwrap().spawn_parent = Some(parent);
    h.engine
        .windows
        .get_mut(parent)
        .unwrap()
        .spawn_children
        .push(child);

    h.engine.window_destroyed(parent);
    assert!(h.engine.windows.get(parent).is_none());
    let orphan = h.engine.windows.get(child).unwrap();
    assert!(orphan.spawn_parent.is_none());
}

#[test]
fn press_raises_window_under_cursor() {
    let mut h = harness();
    let bottom = h.window(0, 0, 300, 300, "bottom");
    let _top = h.window(200, 200, 300, 300, "top");
    let bottom_view = h.engine.windows.get(bottom).unwrap().view;

    h.set_cursor(50, 50);
    h.press(100, BTN_LEFT);
    assert_eq!(h.engine.comp.stack.first(), Some(&bottom_view));
    assert!(h.seat.borrow().focus.is_some(), "pointer focus follows the press");
}

#[test]
fn missing_cursor_still_updates_button_state() {
    let mut h = harness();
    h.window(0, 0, 300, 300, "app");
    // No pointer present at all.
    h.seat.borrow_mut().cursor = None;

    h.press(100, BTN_LEFT);
    assert!(h.engine.chord.left);
    h.press(150, BTN_RIGHT);
    assert!(h.engine.chord.right);
    // Chord activated, but the cursor-dependent selection never started.
    assert!(h.engine.chord.activated);
    assert_eq!(h.engine.chord.mode, Mode::Idle);
}

#[test]
fn nein_theme_uploads_an_image_per_cursor_kind() {
    let h = harness();
    let uploads = h.seat.borrow().cursor_images.clone();
    assert_eq!(uploads.len(), 6);
    for kind in [
        CursorKind::Default,
        CursorKind::Box,
        CursorKind::Cross,
        CursorKind::Sight,
        CursorKind::Up,
        CursorKind::Down,
    ] {
        assert!(uploads.contains(&kind), "missing {:?}", kind);
    }
}

#[test]
fn swc_theme_skips_image_upload() {
    let mut config = Config::default();
    config.cursor.theme = crate::config::CursorTheme::Swc;
    let h = harness_with(config);
    assert!(h.seat.borrow().cursor_images.is_empty());
}

#[test]
fn mode_cursor_follows_chord_state() {
    let mut h = harness();
    h.window(0, 0, 300, 300, "app");
    h.set_cursor(50, 50);

    h.press(100, BTN_RIGHT);
    h.press(120, BTN_LEFT);
    assert_eq!(h.seat.borrow().cursor_kind, Some(CursorKind::Sight));
    h.release(140, BTN_LEFT);
    assert_eq!(h.seat.borrow().cursor_kind, Some(CursorKind::Default));
}

#[test]
fn quit_binding_stops_engine() {
    let mut h = harness();
    assert!(h.engine.is_running());
    h.engine
        .handle_key(100, 'q' as u32, mods::LOGO | mods::SHIFT, true);
    assert!(!h.engine.is_running());
}
