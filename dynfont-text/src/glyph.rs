//! Glyph records, the residency index, and the eviction queue.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::atlas::AtlasRect;

/// A rasterized glyph resident in the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    /// Character this glyph is cached under.
    pub ch: char,
    /// Pixel region in the atlas.
    pub rect: AtlasRect,
    /// Glyph index in the source font (after placeholder substitution).
    pub index: u16,
    /// Top-of-bitmap offset from the draw origin, in pixels.
    pub ascent: i32,
    /// Extra trailing width applies after this glyph.
    pub wide_punctuation: bool,
}

/// Character → resident glyph. Authoritative for residency.
#[derive(Clone, Debug, Default)]
pub struct GlyphIndex {
    glyphs: FxHashMap<char, Glyph>,
}

impl GlyphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Insert or replace the glyph for `ch`.
    pub fn insert(&mut self, ch: char, glyph: Glyph) -> Option<Glyph> {
        self.glyphs.insert(ch, glyph)
    }

    /// Remove the glyph for `ch`. No-op when absent.
    pub fn remove(&mut self, ch: char) -> Option<Glyph> {
        self.glyphs.remove(&ch)
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Resident glyphs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Glyph> + '_ {
        self.glyphs.values()
    }
}

/// Insertion-ordered eviction candidates.
///
/// Not authoritative: entries for characters that are no longer in the
/// [`GlyphIndex`] are skipped when popped.
#[derive(Clone, Debug, Default)]
pub struct EvictionQueue {
    order: VecDeque<char>,
}

impl EvictionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ch: char) {
        self.order.push_back(ch);
    }

    pub fn pop_oldest(&mut self) -> Option<char> {
        self.order.pop_front()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.order.iter().copied()
    }
}

// ===================================================================
// Tests
// ===================================================================
