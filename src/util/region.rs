//! Banded region algebra for damage and clip accounting.
//!
//! A region is a set of disjoint rectangles kept in y-x banded form: boxes
//! are sorted by `y1` then `x1`, boxes within one horizontal band share the
//! same `y1`/`y2`, and adjacent boxes in a band never touch. Keeping the
//! canonical form lets union/subtract/intersect run as a single band sweep.
//!
//! Every region carries its own scratch storage for the sweep; mutating
//! operations write into those buffers and swap the result in, so steady
//! repaint traffic reuses capacity instead of allocating per call.

use std::fmt;

use super::geometry::{Box32, Rect};

pub struct Region {
    boxes: Vec<Box32>,
    scratch: Scratch,
}

/// Reused working storage for the band sweep.
#[derive(Default)]
struct Scratch {
    out: Vec<Box32>,
    ys: Vec<i32>,
    xs: Vec<i32>,
    spans_a: Vec<(i32, i32)>,
    spans_b: Vec<(i32, i32)>,
    band: Vec<(i32, i32)>,
    prev_band: Vec<(i32, i32)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    Union,
    Intersect,
    Subtract,
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Region {
    fn clone(&self) -> Self {
        Self {
            boxes: self.boxes.clone(),
            scratch: Scratch::default(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.copy_from(source);
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.boxes == other.boxes
    }
}

impl Eq for Region {}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.boxes.iter()).finish()
    }
}

impl Region {
    pub fn new() -> Self {
        Self {
            boxes: Vec::new(),
            scratch: Scratch::default(),
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.reset_rect(rect);
        region
    }

    /// Replaces the region with a single rectangle (empty if degenerate).
    pub fn reset_rect(&mut self, rect: Rect) {
        self.boxes.clear();
        if rect.is_valid() {
            self.boxes.push(rect.to_box());
        }
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[Box32] {
        &self.boxes
    }

    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.boxes.iter().map(Box32::to_rect)
    }

    /// Bounding box of the region, or an empty box when the region is empty.
    pub fn extents(&self) -> Box32 {
        let mut it = self.boxes.iter();
        let Some(first) = it.next() else {
            return Box32::default();
        };
        let mut ext = *first;
        for b in it {
            ext.x1 = ext.x1.min(b.x1);
            ext.y1 = ext.y1.min(b.y1);
            ext.x2 = ext.x2.max(b.x2);
            ext.y2 = ext.y2.max(b.y2);
        }
        ext
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.boxes
            .iter()
            .any(|b| x >= b.x1 && x < b.x2 && y >= b.y1 && y < b.y2)
    }

    /// Translates every box, saturating at the coordinate-space edge.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        use super::geometry::clamp_i32;
        for b in &mut self.boxes {
            b.x1 = clamp_i32(b.x1 as i64 + dx as i64);
            b.x2 = clamp_i32(b.x2 as i64 + dx as i64);
            b.y1 = clamp_i32(b.y1 as i64 + dy as i64);
            b.y2 = clamp_i32(b.y2 as i64 + dy as i64);
        }
        self.boxes.retain(|b| !b.is_empty());
    }

    pub fn union(&mut self, other: &Region) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.boxes.clear();
            self.boxes.extend_from_slice(&other.boxes);
            return;
        }
        self.combine(&other.boxes, Op::Union);
    }

    pub fn union_rect(&mut self, rect: Rect) {
        if !rect.is_valid() {
            return;
        }
        if self.is_empty() {
            self.boxes.push(rect.to_box());
            return;
        }
        let single = [rect.to_box()];
        self.combine(&single, Op::Union);
    }

    pub fn intersect(&mut self, other: &Region) {
        if self.is_empty() {
            return;
        }
        if other.is_empty() {
            self.boxes.clear();
            return;
        }
        self.combine(&other.boxes, Op::Intersect);
    }

    pub fn intersect_rect(&mut self, rect: Rect) {
        if !rect.is_valid() {
            self.boxes.clear();
            return;
        }
        if self.is_empty() {
            return;
        }
        let single = [rect.to_box()];
        self.combine(&single, Op::Intersect);
    }

    pub fn subtract(&mut self, other: &Region) {
        if self.is_empty() || other.is_empty() {
            return;
        }
        self.combine(&other.boxes, Op::Subtract);
    }

    pub fn subtract_rect(&mut self, rect: Rect) {
        if self.is_empty() || !rect.is_valid() {
            return;
        }
        let single = [rect.to_box()];
        self.combine(&single, Op::Subtract);
    }

    pub fn copy_from(&mut self, other: &Region) {
        self.boxes.clear();
        self.boxes.extend_from_slice(&other.boxes);
    }

    /// Boolean combination with `b`, computed in the scratch buffers and
    /// swapped into place.
    fn combine(&mut self, b: &[Box32], op: Op) {
        let Self { boxes, scratch } = self;
        scratch.combine(boxes, b, op);
        std::mem::swap(boxes, &mut scratch.out);
    }
}

impl Scratch {
    /// Band sweep over two banded box lists, writing the result to `out`.
    ///
    /// Both inputs must already be in canonical banded form; the output is
    /// produced in canonical form by construction (bands are emitted in y
    /// order and vertically coalesced when their interval lists match).
    fn combine(&mut self, a: &[Box32], b: &[Box32], op: Op) {
        self.out.clear();

        // Horizontal band boundaries: every distinct y edge from either
        // operand.
        self.ys.clear();
        for bx in a.iter().chain(b.iter()) {
            self.ys.push(bx.y1);
            self.ys.push(bx.y2);
        }
        self.ys.sort_unstable();
        self.ys.dedup();

        self.prev_band.clear();
        let mut prev_y1 = 0;
        let mut prev_y2 = 0;

        for i in 1..self.ys.len() {
            let (y1, y2) = (self.ys[i - 1], self.ys[i]);
            if y2 <= y1 {
                continue;
            }

            self.spans_a.clear();
            self.spans_b.clear();
            self.spans_a.extend(
                a.iter()
                    .filter(|bx| bx.y1 <= y1 && bx.y2 >= y2)
                    .map(|bx| (bx.x1, bx.x2)),
            );
            self.spans_b.extend(
                b.iter()
                    .filter(|bx| bx.y1 <= y1 && bx.y2 >= y2)
                    .map(|bx| (bx.x1, bx.x2)),
            );
            self.spans_a.sort_unstable();
            self.spans_b.sort_unstable();

            self.band.clear();
            combine_spans(&self.spans_a, &self.spans_b, op, &mut self.xs, &mut self.band);

            if self.band.is_empty() {
                flush_band(&mut self.out, &self.prev_band, prev_y1, prev_y2);
                self.prev_band.clear();
                continue;
            }

            if !self.prev_band.is_empty() && prev_y2 == y1 && self.prev_band == self.band {
                // Identical interval list in the adjoining band: extend it.
                prev_y2 = y2;
                continue;
            }

            flush_band(&mut self.out, &self.prev_band, prev_y1, prev_y2);
            self.prev_band.clear();
            self.prev_band.extend_from_slice(&self.band);
            prev_y1 = y1;
            prev_y2 = y2;
        }

        flush_band(&mut self.out, &self.prev_band, prev_y1, prev_y2);
    }
}

fn flush_band(out: &mut Vec<Box32>, band: &[(i32, i32)], y1: i32, y2: i32) {
    for &(x1, x2) in band {
        out.push(Box32 { x1, y1, x2, y2 });
    }
}

/// Boolean combination of two sorted disjoint x-interval lists. `xs` is the
/// caller's breakpoint scratch.
fn combine_spans(
    a: &[(i32, i32)],
    b: &[(i32, i32)],
    op: Op,
    xs: &mut Vec<i32>,
    out: &mut Vec<(i32, i32)>,
) {
    xs.clear();
    for &(x1, x2) in a.iter().chain(b.iter()) {
        xs.push(x1);
        xs.push(x2);
    }
    xs.sort_unstable();
    xs.dedup();

    let covered = |spans: &[(i32, i32)], x: i32| spans.iter().any(|&(x1, x2)| x1 <= x && x < x2);

    let mut open: Option<i32> = None;
    for w in xs.windows(2) {
        let (x1, x2) = (w[0], w[1]);
        if x2 <= x1 {
            continue;
        }
        let in_a = covered(a, x1);
        let in_b = covered(b, x1);
        let keep = match op {
            Op::Union => in_a || in_b,
            Op::Intersect => in_a && in_b,
            Op::Subtract => in_a && !in_b,
        };
        match (keep, open) {
            (true, None) => open = Some(x1),
            (false, Some(start)) => {
                out.push((start, x1));
                open = None;
            }
            _ => {}
        }
    }
    if let (Some(start), Some(&end)) = (open, xs.last()) {
        out.push((start, end));
    }
}
