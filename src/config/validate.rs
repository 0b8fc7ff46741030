//! Range validation for loaded configuration values.

use log::warn;

use super::Config;

const MAX_BORDER_WIDTH: u32 = 512;
const MIN_SCROLL_EASE: i32 = 2;
const MAX_SCROLL_EASE: i32 = 64;
const MAX_SCROLL_CAP: i32 = 4096;
const MAX_CLICK_TIMEOUT_MS: u32 = 5000;

impl Config {
    /// Clamps out-of-range values in place, warning about each adjustment.
    pub fn validate_and_clamp(&mut self) {
        if self.border.outer_width > MAX_BORDER_WIDTH {
            warn!(
                "border.outer_width {} exceeds {}, clamping",
                self.border.outer_width, MAX_BORDER_WIDTH
            );
            self.border.outer_width = MAX_BORDER_WIDTH;
        }
        if self.border.inner_width > MAX_BORDER_WIDTH {
            warn!(
                "border.inner_width {} exceeds {}, clamping",
                self.border.inner_width, MAX_BORDER_WIDTH
            );
            self.border.inner_width = MAX_BORDER_WIDTH;
        }

        if self.select.box_border == 0 {
            self.select.box_border = 1;
        }

        if self.chord.click_timeout_ms > MAX_CLICK_TIMEOUT_MS {
            warn!(
                "chord.click_timeout_ms {} exceeds {}, clamping",
                self.chord.click_timeout_ms, MAX_CLICK_TIMEOUT_MS
            );
            self.chord.click_timeout_ms = MAX_CLICK_TIMEOUT_MS;
        }

        // Easing below 2 cannot converge; above the cap it crawls.
        if !(MIN_SCROLL_EASE..=MAX_SCROLL_EASE).contains(&self.scroll.ease) {
            warn!(
                "scroll.ease {} outside {}..={}, clamping",
                self.scroll.ease, MIN_SCROLL_EASE, MAX_SCROLL_EASE
            );
            self.scroll.ease = self.scroll.ease.clamp(MIN_SCROLL_EASE, MAX_SCROLL_EASE);
        }
        if !(1..=MAX_SCROLL_CAP).contains(&self.scroll.cap) {
            warn!(
                "scroll.cap {} outside 1..={}, clamping",
                self.scroll.cap, MAX_SCROLL_CAP
            );
            self.scroll.cap = self.scroll.cap.clamp(1, MAX_SCROLL_CAP);
        }
        if self.scroll.wheel_px <= 0 {
            warn!("scroll.wheel_px must be positive, using 64");
            self.scroll.wheel_px = 64;
        }

        if !(0.01..=1.0).contains(&self.movement.ease_factor) {
            warn!(
                "move.ease_factor {} outside 0.01..=1.0, clamping",
                self.movement.ease_factor
            );
            self.movement.ease_factor = self.movement.ease_factor.clamp(0.01, 1.0);
        }
        if self.movement.edge_threshold < 0 {
            self.movement.edge_threshold = 0;
        }
        if self.movement.scroll_speed < 0 {
            self.movement.scroll_speed = 0;
        }

        if self.terminal.exec.is_empty() {
            warn!("terminal.exec is empty, terminal spawning disabled");
        }
    }
}
