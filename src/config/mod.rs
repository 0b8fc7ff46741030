//! Configuration file support for waychord.
//!
//! Settings load once at startup from `~/.config/waychord/config.toml`:
//! border colors and widths, selection box appearance, chord timing, scroll
//! and move easing, zoom, terminal spawning, and the cursor theme. Chord
//! semantics are fixed for the lifetime of the session; there is no runtime
//! reload.
//!
//! If no config file exists, defaults matching the stock build are used.

pub mod enums;
pub mod types;

mod core;
mod io;
mod validate;


pub use core::Config;
pub use enums::{ChordAction, ColorSpec, CursorTheme};
#[allow(unused_imports)]
pub use io::{ConfigSource, LoadedConfig};
pub use types::{
    BorderConfig, ChordConfig, CursorConfig, MoveConfig, ScrollConfig, SelectConfig,
    TerminalConfig, ZoomConfig,
};
