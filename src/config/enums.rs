//! Small enumerated config values.

use serde::{Deserialize, Serialize};

/// Color specification - either a hex string (`"#rrggbb"` / `"#aarrggbb"`)
/// or an RGB array like `[255, 0, 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Hex(String),
    Rgb([u8; 3]),
}

impl ColorSpec {
    /// Resolves to a packed `0xAARRGGBB` word. Malformed hex strings fall
    /// back to opaque black.
    pub fn to_argb(&self) -> u32 {
        match self {
            ColorSpec::Rgb([r, g, b]) => {
                0xff00_0000 | (*r as u32) << 16 | (*g as u32) << 8 | *b as u32
            }
            ColorSpec::Hex(s) => {
                let digits = s.trim_start_matches('#');
                match (digits.len(), u32::from_str_radix(digits, 16)) {
                    (6, Ok(rgb)) => 0xff00_0000 | rgb,
                    (8, Ok(argb)) => argb,
                    _ => 0xff00_0000,
                }
            }
        }
    }

    pub fn hex(s: &str) -> Self {
        ColorSpec::Hex(s.to_string())
    }
}

/// Cursor behavior profile.
///
/// `swc` keeps the display library's builtin cursor and lets clients set
/// their own; `nein` forces the compositor cursor set and selects a cursor
/// per chord mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorTheme {
    Swc,
    Nein,
}

/// Action bound to the middle-press-while-left-held chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordAction {
    /// Toggle the focused window's sticky flag.
    Sticky,
    /// Toggle sticky and make the window fullscreen on the current screen.
    Fullscreen,
    /// Focus the nearest other window.
    Jump,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_resolve() {
        assert_eq!(ColorSpec::hex("#285577").to_argb(), 0xff28_5577);
        assert_eq!(ColorSpec::hex("#80ffffff").to_argb(), 0x80ff_ffff);
        assert_eq!(ColorSpec::Rgb([255, 0, 0]).to_argb(), 0xffff_0000);
    }

    #[test]
    fn malformed_hex_is_black() {
        assert_eq!(ColorSpec::hex("oops").to_argb(), 0xff00_0000);
    }
}
