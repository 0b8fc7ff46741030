//! Renderer-facing contracts.
//!
//! The pipeline talks to two renderer instances: the scanout renderer that
//! owns the per-screen swapchains, and a software renderer used for proxy
//! flushes and the zoom composite. Both are driven through the [`Renderer`]
//! trait; buffers are reference-counted records whose pixel storage is
//! CPU-mapped on demand.

pub(crate) mod software;

pub use software::SoftwareRenderer;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use thiserror::Error;

use crate::util::Region;

pub type BufferRef = Rc<Buffer>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("buffer allocation failed")]
    AllocationFailed,
    /// The session lost access to the display device; the compositor must
    /// deactivate until the host hands it back.
    #[error("access to the render device was denied")]
    AccessDenied,
    #[error("buffer is not mappable")]
    Unmappable,
    #[error("no render target bound")]
    NoTarget,
    #[error("unknown render target")]
    UnknownTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xrgb8888,
    Argb8888,
}

/// Memory domain a buffer lives in. The scanout renderer can only sample
/// device-local buffers, which is what forces proxy copies for shm clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Shm,
    Device,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferFlags {
    /// Buffer can be CPU-mapped.
    pub map: bool,
    /// Buffer may be presented directly on a screen.
    pub scanout: bool,
}

/// A pixel buffer. Pixels are `0xAARRGGBB` words, row-major with `pitch`
/// pixels per row.
#[derive(Debug)]
pub struct Buffer {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub pitch: u32,
    pub kind: BufferKind,
    pub flags: BufferFlags,
    pixels: RefCell<Vec<u32>>,
}

impl Buffer {
    pub fn new(width: u32, height: u32, format: Format, kind: BufferKind, flags: BufferFlags) -> Self {
        Self {
            width,
            height,
            format,
            pitch: width,
            kind,
            flags,
            pixels: RefCell::new(vec![0; width as usize * height as usize]),
        }
    }

    /// Wraps existing pixel memory. `pitch` is in pixels per row.
    pub fn with_pixels(
        width: u32,
        height: u32,
        format: Format,
        pitch: u32,
        kind: BufferKind,
        flags: BufferFlags,
        pixels: Vec<u32>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            pitch,
            kind,
            flags,
            pixels: RefCell::new(pixels),
        }
    }

    /// Maps the buffer for reading. Fails for non-mappable device buffers.
    pub fn map(&self) -> Result<Ref<'_, Vec<u32>>, RenderError> {
        if self.kind == BufferKind::Device && !self.flags.map {
            return Err(RenderError::Unmappable);
        }
        Ok(self.pixels.borrow())
    }

    /// Maps the buffer for writing. Fails for non-mappable device buffers.
    pub fn map_mut(&self) -> Result<RefMut<'_, Vec<u32>>, RenderError> {
        if self.kind == BufferKind::Device && !self.flags.map {
            return Err(RenderError::Unmappable);
        }
        Ok(self.pixels.borrow_mut())
    }

    pub(crate) fn storage(&self) -> Ref<'_, Vec<u32>> {
        self.pixels.borrow()
    }

    pub(crate) fn storage_mut(&self) -> RefMut<'_, Vec<u32>> {
        self.pixels.borrow_mut()
    }
}

/// Handle to a renderer-owned swapchain surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetId(pub(crate) u32);

/// Drawing and swapchain operations offered by a renderer instance.
///
/// Mirrors the contract of the external display library: a current target is
/// bound, draw calls write into it, and `flush` completes the batch.
pub trait Renderer {
    fn create_target(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        flags: BufferFlags,
    ) -> Result<TargetId, RenderError>;

    fn destroy_target(&mut self, target: TargetId);

    fn create_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        flags: BufferFlags,
    ) -> Result<BufferRef, RenderError>;

    /// Wraps externally produced pixel memory (wallpaper decode, client
    /// handoff) in a buffer of this renderer's domain.
    fn import_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        pitch: u32,
        pixels: Vec<u32>,
    ) -> Result<BufferRef, RenderError>;

    fn capabilities(&self, buffer: &Buffer) -> Capabilities;

    fn set_target_surface(&mut self, target: TargetId) -> Result<(), RenderError>;

    fn set_target_buffer(&mut self, buffer: &BufferRef) -> Result<(), RenderError>;

    /// Copies `region` (target-local coordinates) from `src`, where the
    /// source pixel for target `(x, y)` is `(x - dx, y - dy)`.
    fn copy_region(&mut self, src: &BufferRef, dx: i32, dy: i32, region: &Region);

    fn copy_rectangle(
        &mut self,
        src: &BufferRef,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        width: u32,
        height: u32,
    );

    fn fill_region(&mut self, color: u32, region: &Region);

    fn fill_rectangle(&mut self, color: u32, x: i32, y: i32, width: u32, height: u32);

    fn flush(&mut self);

    /// Takes the next back buffer of `target` for presentation.
    fn target_take(&mut self, target: TargetId) -> Result<BufferRef, RenderError>;

    /// Returns a presented buffer to `target`'s swapchain.
    fn target_release(&mut self, target: TargetId, buffer: &BufferRef);

    /// Records frame damage and writes the damage accumulated across all
    /// frames that have not been presented yet into `total`.
    fn target_damage(&mut self, target: TargetId, damage: &Region, total: &mut Region);
}
