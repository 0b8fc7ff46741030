use serde::{Deserialize, Serialize};

use super::types::{
    BorderConfig, ChordConfig, CursorConfig, MoveConfig, ScrollConfig, SelectConfig,
    TerminalConfig, ZoomConfig,
};

/// Main configuration structure containing all user settings.
///
/// This is the root type deserialized from the TOML file. Every field has a
/// default matching the stock build, so a missing or partial file works.
///
/// # Example TOML
/// ```toml
/// [border]
/// inner_color_active = "#285577"
/// outer_width = 4
///
/// [scroll]
/// drag_mode = true
/// focus_center = false
///
/// [terminal]
/// exec = "foot"
/// window_id_flag = "-a"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Window border rings
    #[serde(default)]
    pub border: BorderConfig,

    /// Selection box appearance
    #[serde(default)]
    pub select: SelectConfig,

    /// Chord timing and the 2-1 action
    #[serde(default)]
    pub chord: ChordConfig,

    /// Scroll easing
    #[serde(default)]
    pub scroll: ScrollConfig,

    /// Move easing and edge auto-scroll
    #[serde(default, rename = "move")]
    pub movement: MoveConfig,

    /// Zoom compositing
    #[serde(default)]
    pub zoom: ZoomConfig,

    /// Terminal spawning
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// Cursor profile
    #[serde(default)]
    pub cursor: CursorConfig,
}
