//! Per-output screen records.

use crate::render::{BufferRef, TargetId};
use crate::util::Rect;

/// One output: its global geometry, a unique mask bit for cheap set
/// membership, and the scanout swapchain presenting it.
pub struct Screen {
    pub geometry: Rect,
    pub mask: u32,
    pub target: TargetId,
    /// Buffer submitted but not yet confirmed by a frame signal.
    pub next_buffer: Option<BufferRef>,
    /// Buffer currently on the display.
    pub current_buffer: Option<BufferRef>,
}

impl Screen {
    pub fn new(geometry: Rect, mask: u32, target: TargetId) -> Self {
        Self {
            geometry,
            mask,
            target,
            next_buffer: None,
            current_buffer: None,
        }
    }
}
