//! End-to-end chord scenarios driven through the public engine API with a
//! fake seat, a recording spawner, and a virtual clock.

use std::cell::RefCell;
use std::rc::Rc;

use waychord::Engine;
use waychord::compositor::Compositor;
use waychord::config::Config;
use waychord::engine::chord::Mode;
use waychord::engine::wm::Window;
use waychord::render::{Buffer, BufferFlags, BufferKind, Format, SoftwareRenderer};
use waychord::seat::{
    BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, ButtonState, CursorKind, CursorMode, Fixed, PointerSeat,
    int_to_fixed,
};
use waychord::spawn::Spawner;
use waychord::util::{Id, Rect, Region};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ButtonEvent {
    time: u32,
    button: u32,
    pressed: bool,
}

#[derive(Default)]
struct SeatState {
    cursor: Option<(i32, i32)>,
    buttons: Vec<ButtonEvent>,
}

struct RecordingSeat(Rc<RefCell<SeatState>>);

impl PointerSeat for RecordingSeat {
    fn cursor_position(&self) -> Option<(Fixed, Fixed)> {
        self.0
            .borrow()
            .cursor
            .map(|(x, y)| (int_to_fixed(x), int_to_fixed(y)))
    }

    fn set_focus(&mut self, _token: Option<u64>) {}

    fn send_button(&mut self, time: u32, button: u32, state: ButtonState) {
        self.0.borrow_mut().buttons.push(ButtonEvent {
            time,
            button,
            pressed: state == ButtonState::Pressed,
        });
    }

    fn send_axis(&mut self, _time: u32, _axis: u32, _value120: i32) {}

    fn set_cursor(&mut self, _kind: CursorKind) {}

    fn set_cursor_mode(&mut self, _mode: CursorMode) {}

    fn set_cursor_image(
        &mut self,
        _kind: CursorKind,
        _pixels: &[u32],
        _width: u32,
        _height: u32,
        _hotspot_x: i32,
        _hotspot_y: i32,
    ) {
    }
}

struct RecordingSpawner(Rc<RefCell<Vec<String>>>);

impl Spawner for RecordingSpawner {
    fn spawn_terminal(&mut self, exec: &str, flag: &str, app_id: &str) -> Option<i32> {
        self.0
            .borrow_mut()
            .push(format!("{} {} {}", exec, flag, app_id));
        Some(1234)
    }
}

struct Scenario {
    engine: Engine,
    seat: Rc<RefCell<SeatState>>,
    spawns: Rc<RefCell<Vec<String>>>,
}

fn scenario(mut mutate: impl FnMut(&mut Config)) -> Scenario {
    let mut config = Config::default();
    mutate(&mut config);
    let seat = Rc::new(RefCell::new(SeatState::default()));
    let spawns = Rc::new(RefCell::new(Vec::new()));
    let comp = Compositor::new(
        Box::new(SoftwareRenderer::new_scanout()),
        Box::new(SoftwareRenderer::new_shm()),
        0xff10_1010,
    );
    let mut engine = Engine::new(
        config,
        comp,
        Box::new(RecordingSeat(Rc::clone(&seat))),
        Box::new(RecordingSpawner(Rc::clone(&spawns))),
    );
    engine.screen_new(Rect::new(0, 0, 1000, 800));
    Scenario {
        engine,
        seat,
        spawns,
    }
}

impl Scenario {
    fn cursor(&mut self, x: i32, y: i32) {
        self.seat.borrow_mut().cursor = Some((x, y));
    }

    fn button(&mut self, time: u32, button: u32, pressed: bool) {
        self.engine.advance(time as u64);
        self.engine.handle_button(time, button, pressed);
    }

    fn client_buttons(&self) -> Vec<ButtonEvent> {
        self.seat.borrow().buttons.clone()
    }

    fn spawn_window(&mut self, x: i32, y: i32, w: u32, h: u32, app_id: &str) -> Id<Window> {
        let sid = self.engine.comp.create_surface();
        let vid = self.engine.comp.create_view(sid).expect("view");
        let buffer = Rc::new(Buffer::new(
            w,
            h,
            Format::Xrgb8888,
            BufferKind::Device,
            BufferFlags {
                map: true,
                scanout: false,
            },
        ));
        self.engine
            .comp
            .view_attach(vid, Some(buffer))
            .expect("attach");
        self.engine.comp.view_move(vid, x, y);
        let surface = self.engine.comp.surfaces.get_mut(sid).expect("surface");
        surface.input = Region::from_rect(Rect::new(0, 0, w, h));
        surface.damage = Region::from_rect(Rect::new(0, 0, w, h));
        self.engine
            .window_new(vid, Some(app_id.to_string()), Some(app_id.to_string()), 0)
            .expect("window")
    }

    fn tick_until_scroll_settles(&mut self) {
        let mut guard = 0;
        while self.engine.chord.scroll_pending_px != 0
            || self.engine.chord.scroll_pending_px_x != 0
        {
            let now = self.engine.now() + 16;
            self.engine.advance(now);
            guard += 1;
            assert!(guard < 1000, "scroll failed to settle");
        }
        let now = self.engine.now() + 16;
        self.engine.advance(now);
    }
}

#[test]
fn scenario_click_fidelity() {
    let mut s = scenario(|c| c.chord.click_timeout_ms = 125);
    s.cursor(10, 10);

    s.button(100, BTN_LEFT, true);
    s.button(140, BTN_LEFT, false);

    // Release before the deadline flushes the press immediately with its
    // original timestamp, followed by the matching release.
    assert_eq!(
        s.client_buttons(),
        vec![
            ButtonEvent {
                time: 100,
                button: BTN_LEFT,
                pressed: true
            },
            ButtonEvent {
                time: 140,
                button: BTN_LEFT,
                pressed: false
            },
        ]
    );

    // A slow click instead arrives via the timeout.
    let mut s = scenario(|c| c.chord.click_timeout_ms = 125);
    s.cursor(10, 10);
    s.button(300, BTN_LEFT, true);
    s.engine.advance(424);
    assert_eq!(s.client_buttons().len(), 0);
    s.engine.advance(425);
    assert_eq!(
        s.client_buttons(),
        vec![ButtonEvent {
            time: 300,
            button: BTN_LEFT,
            pressed: true
        }]
    );
    s.button(500, BTN_LEFT, false);
    assert_eq!(s.client_buttons().len(), 2);
}

#[test]
fn scenario_chord_absorbs_clicks() {
    let mut s = scenario(|c| c.chord.click_timeout_ms = 250);
    s.cursor(320, 240);

    s.button(100, BTN_LEFT, true);
    s.button(150, BTN_RIGHT, true);

    assert_eq!(s.engine.chord.mode, Mode::Selecting);
    let overlay = s.engine.comp.overlay();
    assert!(overlay.active);
    assert_eq!((overlay.x, overlay.y), (320, 240));

    s.engine.advance(1000);
    assert!(
        s.client_buttons().is_empty(),
        "chord presses never reach the client"
    );
}

#[test]
fn scenario_select_spawn_geometry() {
    let mut s = scenario(|c| {
        c.border.outer_width = 4;
        c.border.inner_width = 4;
    });
    s.cursor(100, 100);

    s.button(100, BTN_LEFT, true);
    s.button(150, BTN_RIGHT, true);
    s.cursor(300, 260);
    s.button(400, BTN_RIGHT, false);

    assert!(s.engine.chord.spawn.pending);
    let g = s.engine.chord.spawn.geometry;
    assert_eq!((g.x, g.y, g.width, g.height), (108, 108, 184, 144));
    assert_eq!(s.spawns.borrow().as_slice(), &["havoc -i waychord-select"]);

    // The spawned terminal adopts the geometry on arrival.
    s.button(420, BTN_LEFT, false);
    let wid = s.spawn_window(0, 0, 10, 10, "waychord-select");
    assert_eq!(s.engine.window_get_geometry(wid), Some(g));
    assert!(!s.engine.chord.spawn.pending);
}

#[test]
fn scenario_focus_auto_center_vertical() {
    let mut s = scenario(|c| {
        c.scroll.drag_mode = false;
        c.scroll.focus_center = true;
    });
    let other = s.spawn_window(0, 0, 100, 100, "other");
    let target = s.spawn_window(400, 900, 200, 200, "target");

    s.engine.focus_window(Some(other), "setup");
    s.engine.chord.scroll_pending_px = 0;
    s.engine.chord.scroll_pending_px_x = 0;
    s.engine.chord.auto_scrolling = false;

    s.engine.focus_window(Some(target), "test");
    assert_eq!(s.engine.chord.scroll_pending_px, -600);
    assert_eq!(s.engine.chord.scroll_pending_px_x, 0);

    s.tick_until_scroll_settles();
    assert_eq!(s.engine.window_get_geometry(target).unwrap().y, 300);
}

#[test]
fn scenario_zoom_step() {
    let mut s = scenario(|c| {
        c.scroll.drag_mode = true;
        c.zoom.enabled = true;
    });
    s.cursor(500, 400);

    s.button(100, BTN_RIGHT, true);
    s.button(120, BTN_MIDDLE, true);
    assert_eq!(s.engine.chord.mode, Mode::Scrolling);

    s.engine.handle_axis(140, 0, -120);
    assert!((s.engine.chord.zoom_target - 1.15).abs() < 1e-6);

    let now = s.engine.now() + 1;
    s.engine.advance(now);
    assert!(
        (s.engine.comp.zoom() - 1.0375).abs() < 0.001,
        "one tick covers a quarter of the gap, got {}",
        s.engine.comp.zoom()
    );

    for _ in 0..20 {
        let now = s.engine.now() + 16;
        s.engine.advance(now);
    }
    assert_eq!(s.engine.comp.zoom(), 1.15);
}

#[test]
fn scenario_sticky_under_scroll() {
    let mut s = scenario(|c| c.scroll.focus_center = false);
    let a = s.spawn_window(100, 100, 100, 100, "a");
    let b = s.spawn_window(300, 100, 100, 100, "b");
    s.engine.windows.get_mut(a).unwrap().sticky = true;

    s.cursor(500, 400);
    s.button(100, BTN_RIGHT, true);
    s.button(120, BTN_MIDDLE, true);
    s.engine.handle_axis(140, 0, 120);
    assert_eq!(s.engine.chord.scroll_pending_px, 64);

    s.tick_until_scroll_settles();
    assert_eq!(s.engine.window_get_geometry(a).unwrap().y, 100);
    assert_eq!(s.engine.window_get_geometry(b).unwrap().y, 164);
}

#[test]
fn zoom_is_clamped_to_supported_range() {
    let mut s = scenario(|_| {});
    s.engine.comp.set_zoom(0.0001);
    assert_eq!(s.engine.comp.zoom(), 0.1);
    s.engine.comp.set_zoom(1e9);
    assert_eq!(s.engine.comp.zoom(), 10.0);
}

#[test]
fn chord_modes_never_overlap_across_a_session() {
    let mut s = scenario(|c| c.scroll.focus_center = false);
    s.spawn_window(0, 0, 800, 600, "app");
    s.cursor(100, 100);

    // select -> idle -> kill -> idle -> scroll -> idle
    s.button(100, BTN_LEFT, true);
    s.button(120, BTN_RIGHT, true);
    assert_eq!(s.engine.chord.mode, Mode::Selecting);
    s.button(140, BTN_RIGHT, false);
    s.button(160, BTN_LEFT, false);
    assert_eq!(s.engine.chord.mode, Mode::Idle);

    s.button(200, BTN_RIGHT, true);
    s.button(220, BTN_LEFT, true);
    assert_eq!(s.engine.chord.mode, Mode::Killing);
    s.button(240, BTN_LEFT, false);
    assert_eq!(s.engine.chord.mode, Mode::Idle);
    s.button(260, BTN_RIGHT, false);

    s.button(300, BTN_RIGHT, true);
    s.button(320, BTN_MIDDLE, true);
    assert_eq!(s.engine.chord.mode, Mode::Scrolling);
    s.button(340, BTN_MIDDLE, false);
    s.button(360, BTN_RIGHT, false);
    assert_eq!(s.engine.chord.mode, Mode::Idle);
}
