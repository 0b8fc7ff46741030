//! Application startup and the outer event loop.
//!
//! Builds the engine from configuration and drives its timer deadlines
//! with calloop until a quit binding or a termination signal arrives. The
//! Wayland protocol front-end attaches to the engine through the library
//! API; without one the engine idles with no pointer present.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use calloop::EventLoop;
use calloop::timer::{TimeoutAction, Timer};
use log::{info, warn};

use crate::cli::Cli;
use crate::compositor::Compositor;
use crate::config::{Config, ConfigSource};
use crate::engine::Engine;
use crate::render::SoftwareRenderer;
use crate::seat::{ButtonState, CursorKind, CursorMode, Fixed, PointerSeat};
use crate::spawn::ProcessSpawner;

const DEFAULT_BACKGROUND: u32 = 0xff10_1010;

/// Seat placeholder used until a protocol front-end binds one. Reports no
/// pointer, so every cursor-dependent chord step quietly no-ops.
struct HeadlessSeat;

impl PointerSeat for HeadlessSeat {
    fn cursor_position(&self) -> Option<(Fixed, Fixed)> {
        None
    }

    fn set_focus(&mut self, _token: Option<u64>) {}

    fn send_button(&mut self, _time: u32, _button: u32, _state: ButtonState) {}

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

struct App {
    engine: Engine,
    started: Instant,
    exit_flag: Arc<AtomicBool>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let (config, source) = match Config::load() {
        Ok(loaded) => (loaded.config, loaded.source),
        Err(err) => {
            warn!("Failed to load config: {}. Using defaults.", err);
            (Config::default(), ConfigSource::Default)
        }
    };

    if cli.check_config {
        match source {
            ConfigSource::Primary => println!("configuration ok"),
            ConfigSource::Default => println!("no configuration file, defaults in effect"),
        }
        return Ok(());
    }

    info!("Starting waychord");

    let comp = Compositor::new(
        Box::new(SoftwareRenderer::new_scanout()),
        Box::new(SoftwareRenderer::new_shm()),
        DEFAULT_BACKGROUND,
    );
    let engine = Engine::new(
        config,
        comp,
        Box::new(HeadlessSeat),
        Box::new(ProcessSpawner),
    );

    let exit_flag = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};
        for sig in [SIGTERM, SIGINT] {
            signal_hook::flag::register(sig, Arc::clone(&exit_flag))
                .context("Failed to register signal handler")?;
        }
    }

    let mut app = App {
        engine,
        started: Instant::now(),
        exit_flag,
    };

    let mut event_loop: EventLoop<App> =
        EventLoop::try_new().context("Failed to create event loop")?;
    let signal = event_loop.get_signal();

    event_loop
        .handle()
        .insert_source(
            Timer::from_duration(Duration::from_millis(16)),
            |_deadline, _, app: &mut App| {
                let now = app.started.elapsed().as_millis() as u64;
                app.engine.advance(now);

                // Sleep until the next engine deadline, bounded so signal
                // checks stay responsive.
                let wait = app
                    .engine
                    .next_deadline()
                    .map(|deadline| deadline.saturating_sub(now))
                    .unwrap_or(250)
                    .clamp(1, 250);
                TimeoutAction::ToDuration(Duration::from_millis(wait))
            },
        )
        .map_err(|err| anyhow::anyhow!("Failed to install engine timer: {}", err))?;

    event_loop
        .run(None::<Duration>, &mut app, |app| {
            if app.exit_flag.load(Ordering::Acquire) || !app.engine.is_running() {
                signal.stop();
            }
        })
        .context("Event loop error")?;

    info!("waychord exiting");
    Ok(())
}
