//! Shared geometry, region, and arena primitives.
//!
//! This module provides:
//! - Saturating rectangle arithmetic used by every geometry callsite
//! - A banded region algebra for damage and clip accounting
//! - A generational pool backing view/window/screen handles

mod geometry;
mod pool;
mod region;

pub use geometry::{Box32, Rect, clamp_i32, span_u32};
pub use pool::{Id, Pool};
pub use region::Region;

#[cfg(test)]
mod tests;
