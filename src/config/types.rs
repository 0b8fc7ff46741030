//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use super::enums::{ChordAction, ColorSpec, CursorTheme};

/// Double-border appearance for window views.
///
/// Every window carries two concentric frames; the outer frame surrounds
/// the inner frame which surrounds the content. A width of 0 disables the
/// ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderConfig {
    #[serde(default = "default_outer_color_active")]
    pub outer_color_active: ColorSpec,

    #[serde(default = "default_inner_color_active")]
    pub inner_color_active: ColorSpec,

    #[serde(default = "default_outer_color_inactive")]
    pub outer_color_inactive: ColorSpec,

    #[serde(default = "default_inner_color_inactive")]
    pub inner_color_inactive: ColorSpec,

    /// Outer ring width in pixels (0 disables the ring)
    #[serde(default = "default_border_width")]
    pub outer_width: u32,

    /// Inner ring width in pixels (0 disables the ring)
    #[serde(default = "default_border_width")]
    pub inner_width: u32,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            outer_color_active: default_outer_color_active(),
            inner_color_active: default_inner_color_active(),
            outer_color_inactive: default_outer_color_inactive(),
            inner_color_inactive: default_inner_color_inactive(),
            outer_width: default_border_width(),
            inner_width: default_border_width(),
        }
    }
}

impl BorderConfig {
    /// Combined ring width on one side.
    pub fn total_width(&self) -> u32 {
        self.outer_width.saturating_add(self.inner_width)
    }
}

/// Selection box drawn while the select chord is held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectConfig {
    #[serde(default = "default_select_box_color")]
    pub box_color: ColorSpec,

    /// Border width of the selection box in pixels
    #[serde(default = "default_select_box_border")]
    pub box_border: u32,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            box_color: default_select_box_color(),
            box_border: default_select_box_border(),
        }
    }
}

/// Chord timing and the configurable 2-1 action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordConfig {
    /// How long a lone left/right press is held back before it is forwarded
    /// to the client (milliseconds)
    #[serde(default = "default_click_timeout_ms")]
    pub click_timeout_ms: u32,

    /// Action taken when middle is pressed while left is held
    #[serde(default = "default_chord_action")]
    pub action: ChordAction,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            click_timeout_ms: default_click_timeout_ms(),
            action: default_chord_action(),
        }
    }
}

/// Scroll easing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Pixels of viewport scroll per wheel detent
    #[serde(default = "default_scroll_wheel_px")]
    pub wheel_px: i32,

    /// Easing divisor: each tick moves `remaining / ease` pixels
    #[serde(default = "default_scroll_ease")]
    pub ease: i32,

    /// Maximum pixels moved in one tick
    #[serde(default = "default_scroll_cap")]
    pub cap: i32,

    /// Drag mode: scrolling follows the cursor instead of the wheel, and
    /// translates on both axes
    #[serde(default)]
    pub drag_mode: bool,

    /// Center a window on the screen when it gains focus
    #[serde(default = "default_focus_center")]
    pub focus_center: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            wheel_px: default_scroll_wheel_px(),
            ease: default_scroll_ease(),
            cap: default_scroll_cap(),
            drag_mode: false,
            focus_center: default_focus_center(),
        }
    }
}

/// Interactive move easing and screen-edge auto-scroll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveConfig {
    /// Height of the top/bottom strip that triggers auto-scroll while
    /// dragging a window (pixels)
    #[serde(default = "default_move_edge_threshold")]
    pub edge_threshold: i32,

    /// Pixels injected into the scroll engine per tick while inside the
    /// edge strip
    #[serde(default = "default_move_scroll_speed")]
    pub scroll_speed: i32,

    /// Fraction of the remaining gap the dragged window covers per tick
    /// (0 < factor <= 1)
    #[serde(default = "default_move_ease_factor")]
    pub ease_factor: f32,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            edge_threshold: default_move_edge_threshold(),
            scroll_speed: default_move_scroll_speed(),
            ease_factor: default_move_ease_factor(),
        }
    }
}

/// Zoom compositing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    #[serde(default = "default_zoom_enabled")]
    pub enabled: bool,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            enabled: default_zoom_enabled(),
        }
    }
}

/// Terminal spawning for the select chord and spawn-parent linking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Terminal executable launched on select release
    #[serde(default = "default_term_exec")]
    pub exec: String,

    /// Flag passed before the app id (e.g. `-i` for havoc, `-a` for foot)
    #[serde(default = "default_term_flag")]
    pub window_id_flag: String,

    /// App id given to select-spawned terminals; the next window carrying
    /// it adopts the selection geometry
    #[serde(default = "default_select_app_id")]
    pub select_app_id: String,

    /// Link windows spawned from a terminal to that terminal (hide the
    /// terminal while its child lives)
    #[serde(default = "default_spawn_linking")]
    pub spawn_linking: bool,

    /// Substrings identifying terminal windows by app id or title
    #[serde(default = "default_terminal_app_ids")]
    pub app_ids: Vec<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            exec: default_term_exec(),
            window_id_flag: default_term_flag(),
            select_app_id: default_select_app_id(),
            spawn_linking: default_spawn_linking(),
            app_ids: default_terminal_app_ids(),
        }
    }
}

/// Cursor profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorConfig {
    #[serde(default = "default_cursor_theme")]
    pub theme: CursorTheme,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            theme: default_cursor_theme(),
        }
    }
}

fn default_outer_color_active() -> ColorSpec {
    ColorSpec::hex("#222222")
}

fn default_inner_color_active() -> ColorSpec {
    ColorSpec::hex("#285577")
}

fn default_outer_color_inactive() -> ColorSpec {
    ColorSpec::hex("#525252")
}

fn default_inner_color_inactive() -> ColorSpec {
    ColorSpec::hex("#85b3d6")
}

fn default_border_width() -> u32 {
    2
}

fn default_select_box_color() -> ColorSpec {
    ColorSpec::hex("#ffffff")
}

fn default_select_box_border() -> u32 {
    2
}

fn default_click_timeout_ms() -> u32 {
    125
}

fn default_chord_action() -> ChordAction {
    ChordAction::Sticky
}

fn default_scroll_wheel_px() -> i32 {
    64
}

fn default_scroll_ease() -> i32 {
    4
}

fn default_scroll_cap() -> i32 {
    64
}

fn default_focus_center() -> bool {
    true
}

fn default_move_edge_threshold() -> i32 {
    80
}

fn default_move_scroll_speed() -> i32 {
    8
}

fn default_move_ease_factor() -> f32 {
    0.37
}

fn default_zoom_enabled() -> bool {
    true
}

fn default_term_exec() -> String {
    "havoc".to_string()
}

fn default_term_flag() -> String {
    "-i".to_string()
}

fn default_select_app_id() -> String {
    "waychord-select".to_string()
}

fn default_spawn_linking() -> bool {
    true
}

fn default_terminal_app_ids() -> Vec<String> {
    ["havoc", "foot", "alacritty", "st"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cursor_theme() -> CursorTheme {
    CursorTheme::Nein
}
