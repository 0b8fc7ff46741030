//! Surface-layer contract.
//!
//! The protocol machinery that accumulates committed state lives outside the
//! core; the pipeline only consumes the parts listed here. Damage and opaque
//! regions are surface-local and get translated by the owning view's
//! geometry during the damage pass.

use crate::compositor::View;
use crate::render::BufferRef;
use crate::util::{Id, Region};

#[derive(Default)]
pub struct Surface {
    /// Damage committed since the last flush, surface-local.
    pub damage: Region,
    /// Region the client declared fully opaque.
    pub opaque: Region,
    /// Region accepting pointer input.
    pub input: Region,
    /// Most recently committed buffer.
    pub buffer: Option<BufferRef>,
    /// The view currently presenting this surface, if any.
    pub view: Option<Id<View>>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }
}
