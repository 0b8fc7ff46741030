//! CPU renderer with swapchain targets.
//!
//! One instance plays the scanout role (device-domain, owns the per-screen
//! swapchains) and a second plays the shm role (mappable buffers, proxy
//! flushes, zoom composite). The domain only changes which buffers the
//! instance will read or write; the draw ops are the same straight loops.

use std::rc::Rc;

use log::debug;

use crate::util::Region;

use super::{
    Buffer, BufferFlags, BufferKind, BufferRef, Capabilities, Format, RenderError, Renderer,
    TargetId,
};

struct Slot {
    buffer: BufferRef,
    /// Damage accumulated since this slot was last drawn.
    damage: Region,
    free: bool,
}

struct Swapchain {
    width: u32,
    height: u32,
    format: Format,
    flags: BufferFlags,
    slots: Vec<Slot>,
    back: Option<usize>,
    alive: bool,
}

impl Swapchain {
    /// Picks (or allocates) the slot the next frame will be drawn into.
    fn back_slot(&mut self, kind: BufferKind) -> usize {
        if let Some(i) = self.back {
            return i;
        }
        let i = match self.slots.iter().position(|s| s.free) {
            Some(i) => i,
            None => {
                // Fresh slots start fully damaged; they have never been drawn.
                self.slots.push(Slot {
                    buffer: Rc::new(Buffer::new(
                        self.width,
                        self.height,
                        self.format,
                        kind,
                        self.flags,
                    )),
                    damage: Region::from_rect(crate::util::Rect::new(
                        0,
                        0,
                        self.width,
                        self.height,
                    )),
                    free: true,
                });
                self.slots.len() - 1
            }
        };
        self.back = Some(i);
        i
    }
}

enum Bound {
    None,
    Target(u32),
    Buffer(BufferRef),
}

/// Software implementation of the [`Renderer`] contract.
pub struct SoftwareRenderer {
    domain: BufferKind,
    targets: Vec<Swapchain>,
    bound: Bound,
    /// Simulates losing the DRM master: swapchain takes fail until cleared.
    access_denied: bool,
}

impl SoftwareRenderer {
    /// Renderer for the scanout role: reads and writes device buffers only.
    pub fn new_scanout() -> Self {
        Self::new(BufferKind::Device)
    }

    /// Renderer for the shm role: reads and writes mappable buffers only.
    pub fn new_shm() -> Self {
        Self::new(BufferKind::Shm)
    }

    fn new(domain: BufferKind) -> Self {
        Self {
            domain,
            targets: Vec::new(),
            bound: Bound::None,
            access_denied: false,
        }
    }

    pub fn set_access_denied(&mut self, denied: bool) {
        self.access_denied = denied;
    }

    /// Current scanout buffer helper for tests: the most recently taken slot.
    pub fn presented_buffer(&self, target: TargetId) -> Option<BufferRef> {
        let chain = self.targets.get(target.0 as usize)?;
        chain
            .slots
            .iter()
            .find(|s| !s.free)
            .map(|s| s.buffer.clone())
    }

    fn chain_mut(&mut self, target: TargetId) -> Result<&mut Swapchain, RenderError> {
        match self.targets.get_mut(target.0 as usize) {
            Some(chain) if chain.alive => Ok(chain),
            _ => Err(RenderError::UnknownTarget),
        }
    }

    fn with_bound<F>(&mut self, f: F)
    where
        F: FnOnce(&Buffer, &mut [u32]),
    {
        let buffer = match &self.bound {
            Bound::Buffer(buffer) => buffer.clone(),
            Bound::Target(index) => {
                let domain = self.domain;
                let Some(chain) = self.targets.get_mut(*index as usize) else {
                    return;
                };
                let slot = chain.back_slot(domain);
                chain.slots[slot].buffer.clone()
            }
            Bound::None => return,
        };
        let mut pixels = buffer.storage_mut();
        f(&buffer, &mut pixels);
    }
}

impl Renderer for SoftwareRenderer {
    fn create_target(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        flags: BufferFlags,
    ) -> Result<TargetId, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::AllocationFailed);
        }
        self.targets.push(Swapchain {
            width,
            height,
            format,
            flags,
            slots: Vec::new(),
            back: None,
            alive: true,
        });
        Ok(TargetId(self.targets.len() as u32 - 1))
    }

    fn destroy_target(&mut self, target: TargetId) {
        if let Some(chain) = self.targets.get_mut(target.0 as usize) {
            chain.alive = false;
            chain.slots.clear();
        }
    }

    fn create_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        flags: BufferFlags,
    ) -> Result<BufferRef, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::AllocationFailed);
        }
        Ok(Rc::new(Buffer::new(width, height, format, self.domain, flags)))
    }

    fn import_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        pitch: u32,
        pixels: Vec<u32>,
    ) -> Result<BufferRef, RenderError> {
        if width == 0 || height == 0 || pitch < width {
            return Err(RenderError::AllocationFailed);
        }
        if pixels.len() < pitch as usize * height as usize {
            return Err(RenderError::AllocationFailed);
        }
        Ok(Rc::new(Buffer::with_pixels(
            width,
            height,
            format,
            pitch,
            self.domain,
            BufferFlags {
                map: true,
                scanout: false,
            },
            pixels,
        )))
    }

    fn capabilities(&self, buffer: &Buffer) -> Capabilities {
        let ok = match self.domain {
            BufferKind::Device => buffer.kind == BufferKind::Device,
            BufferKind::Shm => buffer.flags.map,
        };
        Capabilities { read: ok, write: ok }
    }

    fn set_target_surface(&mut self, target: TargetId) -> Result<(), RenderError> {
        self.chain_mut(target)?;
        self.bound = Bound::Target(target.0);
        Ok(())
    }

    fn set_target_buffer(&mut self, buffer: &BufferRef) -> Result<(), RenderError> {
        if !self.capabilities(buffer).write {
            return Err(RenderError::Unmappable);
        }
        self.bound = Bound::Buffer(buffer.clone());
        Ok(())
    }

    fn copy_region(&mut self, src: &BufferRef, dx: i32, dy: i32, region: &Region) {
        let src = src.clone();
        self.with_bound(|dst, pixels| {
            let spix = src.storage();
            for b in region.boxes() {
                for y in b.y1.max(0)..b.y2.min(dst.height as i32) {
                    for x in b.x1.max(0)..b.x2.min(dst.width as i32) {
                        let sxx = x - dx;
                        let syy = y - dy;
                        if sxx < 0 || syy < 0 || sxx >= src.width as i32 || syy >= src.height as i32
                        {
                            continue;
                        }
                        pixels[(y * dst.pitch as i32 + x) as usize] =
                            spix[(syy * src.pitch as i32 + sxx) as usize];
                    }
                }
            }
        });
    }

    fn copy_rectangle(
        &mut self,
        src: &BufferRef,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        width: u32,
        height: u32,
    ) {
        let src = src.clone();
        self.with_bound(|dst, pixels| {
            let spix = src.storage();
            for row in 0..height as i32 {
                for col in 0..width as i32 {
                    let (sxx, syy) = (sx + col, sy + row);
                    let (dxx, dyy) = (dx + col, dy + row);
                    if sxx < 0
                        || syy < 0
                        || sxx >= src.width as i32
                        || syy >= src.height as i32
                        || dxx < 0
                        || dyy < 0
                        || dxx >= dst.width as i32
                        || dyy >= dst.height as i32
                    {
                        continue;
                    }
                    pixels[(dyy * dst.pitch as i32 + dxx) as usize] =
                        spix[(syy * src.pitch as i32 + sxx) as usize];
                }
            }
        });
    }

    fn fill_region(&mut self, color: u32, region: &Region) {
        self.with_bound(|dst, pixels| {
            for b in region.boxes() {
                for y in b.y1.max(0)..b.y2.min(dst.height as i32) {
                    for x in b.x1.max(0)..b.x2.min(dst.width as i32) {
                        pixels[(y * dst.pitch as i32 + x) as usize] = color;
                    }
                }
            }
        });
    }

    fn fill_rectangle(&mut self, color: u32, x: i32, y: i32, width: u32, height: u32) {
        self.with_bound(|dst, pixels| {
            let x2 = (x as i64 + width as i64).min(dst.width as i64) as i32;
            let y2 = (y as i64 + height as i64).min(dst.height as i64) as i32;
            for yy in y.max(0)..y2 {
                for xx in x.max(0)..x2 {
                    pixels[(yy * dst.pitch as i32 + xx) as usize] = color;
                }
            }
        });
    }

    fn flush(&mut self) {}

    fn target_take(&mut self, target: TargetId) -> Result<BufferRef, RenderError> {
        if self.access_denied {
            return Err(RenderError::AccessDenied);
        }
        let domain = self.domain;
        let chain = self.chain_mut(target)?;
        let slot = chain.back_slot(domain);
        chain.slots[slot].free = false;
        chain.slots[slot].damage.clear();
        chain.back = None;
        Ok(chain.slots[slot].buffer.clone())
    }

    fn target_release(&mut self, target: TargetId, buffer: &BufferRef) {
        if let Ok(chain) = self.chain_mut(target) {
            for slot in &mut chain.slots {
                if Rc::ptr_eq(&slot.buffer, buffer) {
                    slot.free = true;
                    return;
                }
            }
            debug!("released buffer does not belong to target {:?}", target);
        }
    }

    fn target_damage(&mut self, target: TargetId, damage: &Region, total: &mut Region) {
        let domain = self.domain;
        let Ok(chain) = self.chain_mut(target) else {
            total.copy_from(damage);
            return;
        };
        for slot in &mut chain.slots {
            slot.damage.union(damage);
        }
        let slot = chain.back_slot(domain);
        total.copy_from(&chain.slots[slot].damage);
    }
}

/// Converts `0xAARRGGBB` words into a premultiplied RGBA pixmap for the
/// zoom composite. Alpha is forced opaque; XRGB surfaces carry garbage in
/// their top byte.
pub fn pixmap_from_argb(words: &[u32], width: u32, height: u32) -> Option<tiny_skia::Pixmap> {
    let mut pixmap = tiny_skia::Pixmap::new(width, height)?;
    let data = pixmap.data_mut();
    for (i, word) in words.iter().enumerate().take(width as usize * height as usize) {
        let base = i * 4;
        data[base] = (word >> 16) as u8;
        data[base + 1] = (word >> 8) as u8;
        data[base + 2] = *word as u8;
        data[base + 3] = 0xff;
    }
    Some(pixmap)
}

/// Writes a pixmap back into `0xAARRGGBB` words.
pub fn argb_from_pixmap(pixmap: &tiny_skia::Pixmap, words: &mut [u32]) {
    let data = pixmap.data();
    for (i, word) in words
        .iter_mut()
        .enumerate()
        .take(pixmap.width() as usize * pixmap.height() as usize)
    {
        let base = i * 4;
        *word = 0xff00_0000
            | (data[base] as u32) << 16
            | (data[base + 1] as u32) << 8
            | data[base + 2] as u32;
    }
}
