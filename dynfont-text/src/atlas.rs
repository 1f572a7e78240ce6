//! Glyph atlas: fixed-size CPU-side texture atlas with FIFO eviction.
//!
//! Placement uses a row-based "shelf" scan: glyphs go left to right
//! along the current row, and a new row starts below the tallest glyph
//! of the previous one. When the shelf reaches the bottom of the atlas
//! the allocator stops extending and reclaims instead:
//!
//! ```text
//! shelf cursor ──► free list (first fit) ──► evict oldest (FIFO)
//!                                                 │
//!                         queue drained, no fit ──┴──► hard reset
//! ```
//!
//! Reclaimed rectangles that are too small for the current request, and
//! the unused remainder of a victim, are kept in a free list so later
//! glyphs can reuse them. A hard reset discards every cached glyph and
//! places the request at the origin; it is lossy but never fails.

use log::{debug, warn};
use thiserror::Error;

use crate::glyph::{EvictionQueue, Glyph, GlyphIndex};
use crate::pixels::PixelBuffer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtlasError {
    #[error(
        "Glyph {ch:?} is {width}×{height} px but the atlas is only {atlas_size}×{atlas_size}; \
         increase the atlas size or reduce the font size"
    )]
    OversizedGlyph {
        ch: char,
        width: u32,
        height: u32,
        atlas_size: u32,
    },
}

/// A region within the atlas texture (UV coordinates normalized to [0,1]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasRegion {
    /// Top-left U coordinate.
    pub u_min: f32,
    /// Top-left V coordinate.
    pub v_min: f32,
    /// Bottom-right U coordinate.
    pub u_max: f32,
    /// Bottom-right V coordinate.
    pub v_max: f32,
}

/// Pixel-space rectangle within the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether a `width × height` bitmap fits inside this rect.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width >= width && self.height >= height
    }

    /// Whether the two rects share at least one pixel.
    pub fn intersects(&self, other: &AtlasRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Convert to normalized UVs for an atlas of side `atlas_size`.
    pub fn to_region(&self, atlas_size: u32) -> AtlasRegion {
        let inv = 1.0 / atlas_size as f32;
        AtlasRegion {
            u_min: self.x as f32 * inv,
            v_min: self.y as f32 * inv,
            u_max: (self.x + self.width) as f32 * inv,
            v_max: (self.y + self.height) as f32 * inv,
        }
    }
}

/// How the allocator found room for a glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Allocation {
    /// Placed at the shelf cursor.
    Shelf(AtlasRect),
    /// Reused a rect left over from an earlier eviction.
    Reclaimed(AtlasRect),
    /// Evicted the listed characters, oldest first; the last one's
    /// region holds the new glyph.
    Evicted { rect: AtlasRect, victims: Vec<char> },
    /// Nothing could be reclaimed; the atlas was wiped.
    HardReset(AtlasRect),
}

impl Allocation {
    pub fn rect(&self) -> AtlasRect {
        match self {
            Allocation::Shelf(rect)
            | Allocation::Reclaimed(rect)
            | Allocation::HardReset(rect) => *rect,
            Allocation::Evicted { rect, .. } => *rect,
        }
    }
}

/// Shelf allocator with FIFO reclamation.
#[derive(Clone, Debug)]
pub struct ShelfAllocator {
    size: u32,
    cursor_x: u32,
    cursor_y: u32,
    /// Tallest glyph on the current row.
    row_height: u32,
    /// The shelf reached the bottom; only reclamation is possible.
    exhausted: bool,
    /// Background-filled rects not owned by any glyph.
    free: Vec<AtlasRect>,
}

impl ShelfAllocator {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            cursor_x: 0,
            cursor_y: 0,
            row_height: 0,
            exhausted: false,
            free: Vec::new(),
        }
    }

    /// Scan cursor as `(x, y)`.
    pub fn cursor(&self) -> (u32, u32) {
        (self.cursor_x, self.cursor_y)
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Free rects available for reuse.
    pub fn free_rects(&self) -> &[AtlasRect] {
        &self.free
    }

    /// Forget all placements. The caller resets the index and pixels.
    pub fn reset(&mut self) {
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.row_height = 0;
        self.exhausted = false;
        self.free.clear();
    }

    /// Find room for a `width × height` glyph for `ch`.
    ///
    /// Victims are removed from `index` and their pixels reset to the
    /// background. The new character is not enqueued here.
    pub fn allocate(
        &mut self,
        ch: char,
        width: u32,
        height: u32,
        index: &mut GlyphIndex,
        queue: &mut EvictionQueue,
        pixels: &mut PixelBuffer,
    ) -> Result<Allocation, AtlasError> {
        if width > self.size || height > self.size {
            return Err(AtlasError::OversizedGlyph {
                ch,
                width,
                height,
                atlas_size: self.size,
            });
        }
        debug_assert!(width > 0 && height > 0);

        if let Some(rect) = self.place_on_shelf(width, height) {
            return Ok(Allocation::Shelf(rect));
        }

        if let Some(pos) = self.free.iter().position(|r| r.fits(width, height)) {
            let free = self.free.remove(pos);
            self.split_remainder(free, width, height);
            return Ok(Allocation::Reclaimed(AtlasRect::new(
                free.x, free.y, width, height,
            )));
        }

        // A full sweep drains the queue: victims are never re-appended.
        let mut victims = Vec::new();
        while let Some(victim) = queue.pop_oldest() {
            let Some(glyph) = index.remove(victim) else {
                continue; // already evicted
            };
            if glyph.rect.is_empty() {
                continue;
            }
            pixels.clear_rect(&glyph.rect);
            victims.push(victim);
            debug!(
                "Evicted {victim:?} at ({}, {}) {}×{} for {ch:?} {width}×{height}",
                glyph.rect.x, glyph.rect.y, glyph.rect.width, glyph.rect.height
            );

            if glyph.rect.fits(width, height) {
                self.split_remainder(glyph.rect, width, height);
                let rect = AtlasRect::new(glyph.rect.x, glyph.rect.y, width, height);
                return Ok(Allocation::Evicted { rect, victims });
            }
            self.free.push(glyph.rect);
        }

        warn!(
            "Glyph atlas ({0}×{0}) has no reclaimable region for {ch:?} {width}×{height}; \
             discarding all {1} cached glyphs",
            self.size,
            index.len()
        );
        index.clear();
        queue.clear();
        pixels.fill_background();
        self.reset();
        self.cursor_x = width;
        self.row_height = height;
        Ok(Allocation::HardReset(AtlasRect::new(0, 0, width, height)))
    }

    fn place_on_shelf(&mut self, width: u32, height: u32) -> Option<AtlasRect> {
        if self.exhausted {
            return None;
        }

        if self.cursor_x + width > self.size {
            self.cursor_y += self.row_height;
            self.cursor_x = 0;
            self.row_height = 0;
        }

        if self.cursor_y + height > self.size {
            self.exhausted = true;
            return None;
        }

        let rect = AtlasRect::new(self.cursor_x, self.cursor_y, width, height);
        self.cursor_x += width;
        self.row_height = self.row_height.max(height);
        Some(rect)
    }

    /// Keep the unused right and bottom strips of `rect` once its
    /// top-left `width × height` corner is taken.
    fn split_remainder(&mut self, rect: AtlasRect, width: u32, height: u32) {
        let right = AtlasRect::new(rect.x + width, rect.y, rect.width - width, height);
        let bottom = AtlasRect::new(rect.x, rect.y + height, rect.width, rect.height - height);
        self.free.extend([right, bottom].into_iter().filter(|r| !r.is_empty()));
    }
}

/// Per-glyph metadata supplied by the caller on insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphEntry {
    pub index: u16,
    pub ascent: i32,
    pub wide_punctuation: bool,
}

/// Counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AtlasStats {
    /// Glyphs currently in the index.
    pub resident: usize,
    /// Entries in the eviction queue (may include stale ones).
    pub queued: usize,
    /// Glyphs evicted since creation.
    pub evictions: u64,
    /// Hard resets since creation.
    pub hard_resets: u64,
    /// Rects waiting in the free list.
    pub free_rects: usize,
}

/// CPU-side glyph texture atlas.
///
/// Owns the allocator, the glyph index, the eviction queue, and the
/// pixel buffer; every mutation of the four goes through here.
#[derive(Clone, Debug)]
pub struct GlyphAtlas {
    allocator: ShelfAllocator,
    index: GlyphIndex,
    queue: EvictionQueue,
    pixels: PixelBuffer,
    evictions: u64,
    hard_resets: u64,
}

impl GlyphAtlas {
    /// Create an empty `size × size` atlas filled with `background`.
    pub fn new(size: u32, background: [u8; 4]) -> Self {
        Self {
            allocator: ShelfAllocator::new(size),
            index: GlyphIndex::new(),
            queue: EvictionQueue::new(),
            pixels: PixelBuffer::new(size, background),
            evictions: 0,
            hard_resets: 0,
        }
    }

    /// Atlas side length in pixels.
    pub fn size(&self) -> u32 {
        self.pixels.size()
    }

    /// Number of glyphs currently in the atlas.
    pub fn glyph_count(&self) -> usize {
        self.index.len()
    }

    /// Look up a resident glyph.
    pub fn get(&self, ch: char) -> Option<&Glyph> {
        self.index.get(ch)
    }

    pub fn index(&self) -> &GlyphIndex {
        &self.index
    }

    pub fn queue(&self) -> &EvictionQueue {
        &self.queue
    }

    pub fn allocator(&self) -> &ShelfAllocator {
        &self.allocator
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Whether pixels changed since the last [`take_dirty`](Self::take_dirty).
    pub fn is_dirty(&self) -> bool {
        self.pixels.is_dirty()
    }

    pub fn take_dirty(&mut self) -> bool {
        self.pixels.take_dirty()
    }

    pub fn stats(&self) -> AtlasStats {
        AtlasStats {
            resident: self.index.len(),
            queued: self.queue.len(),
            evictions: self.evictions,
            hard_resets: self.hard_resets,
            free_rects: self.allocator.free_rects().len(),
        }
    }

    /// Insert a glyph bitmap for `ch`.
    ///
    /// Returns the resident glyph unchanged if `ch` is already cached.
    /// `coverage` holds `width * height` alpha bytes, row-major.
    /// Zero-area bitmaps take no atlas space and are never evicted.
    pub fn insert(
        &mut self,
        ch: char,
        entry: GlyphEntry,
        width: u32,
        height: u32,
        coverage: &[u8],
    ) -> Result<Glyph, AtlasError> {
        if let Some(glyph) = self.index.get(ch) {
            return Ok(*glyph);
        }

        let rect = if width == 0 || height == 0 {
            AtlasRect::default()
        } else {
            let allocation = self.allocator.allocate(
                ch,
                width,
                height,
                &mut self.index,
                &mut self.queue,
                &mut self.pixels,
            )?;
            match &allocation {
                Allocation::Evicted { victims, .. } => self.evictions += victims.len() as u64,
                Allocation::HardReset(_) => self.hard_resets += 1,
                Allocation::Shelf(_) | Allocation::Reclaimed(_) => {}
            }
            let rect = allocation.rect();
            self.pixels.write_coverage(&rect, coverage);
            self.queue.push(ch);
            rect
        };

        let glyph = Glyph {
            ch,
            rect,
            index: entry.index,
            ascent: entry.ascent,
            wide_punctuation: entry.wide_punctuation,
        };
        self.index.insert(ch, glyph);
        Ok(glyph)
    }

    /// Reset the atlas (clear all glyphs).
    pub fn clear(&mut self) {
        self.index.clear();
        self.queue.clear();
        self.allocator.reset();
        self.pixels.fill_background();
    }
}

// ===================================================================
// Tests
// ===================================================================
