//! Pointer seat contract.
//!
//! The seat layer (cursor plane, wl_pointer focus and event delivery) lives
//! outside the core. The chord machine drives it through this trait: it
//! queries the cursor, forwards the events it chose not to swallow, and
//! selects the compositor cursor for the active chord mode.

/// 24.8 fixed-point coordinate as used by the wire protocol.
pub type Fixed = i32;

pub fn fixed_to_int(v: Fixed) -> i32 {
    v >> 8
}

pub fn int_to_fixed(v: i32) -> Fixed {
    v << 8
}

pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;
pub const BTN_MIDDLE: u32 = 0x112;

/// Vertical scroll axis (`wl_pointer` convention).
pub const AXIS_VERTICAL: u32 = 0;
pub const AXIS_HORIZONTAL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Cursor images the chord machine can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Default,
    Box,
    Cross,
    Sight,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// Clients may set their own cursor surfaces.
    Client,
    /// Compositor cursor only; client set_cursor requests are ignored.
    Compositor,
}

pub trait PointerSeat {
    /// Current cursor position in compositor-global fixed-point
    /// coordinates, or `None` when no pointer device is present.
    fn cursor_position(&self) -> Option<(Fixed, Fixed)>;

    /// Gives pointer focus to the view identified by `token`, or clears it.
    fn set_focus(&mut self, token: Option<u64>);

    /// Forwards a button event to the focused client.
    fn send_button(&mut self, time: u32, button: u32, state: ButtonState);

    /// Forwards an axis event to the focused client (value120 convention).
    fn send_axis(&mut self, time: u32, axis: u32, value120: i32);

    fn set_cursor(&mut self, kind: CursorKind);

    fn set_cursor_mode(&mut self, mode: CursorMode);

    /// Uploads a custom ARGB8888 cursor image for `kind`.
    fn set_cursor_image(
        &mut self,
        kind: CursorKind,
        pixels: &[u32],
        width: u32,
        height: u32,
        hotspot_x: i32,
        hotspot_y: i32,
    );
}
