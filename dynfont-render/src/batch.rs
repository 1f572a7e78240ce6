//! `SpriteBatch` implementation that feeds the glyph pipeline.
//!
//! Sprites are recorded as [`GlyphInstance`]s on the CPU; the latest
//! atlas upload is held until [`Renderer::prepare`](crate::Renderer::prepare)
//! writes it to the texture.

use dynfont_text::{GlyphSprite, SpriteBatch};

use crate::vertex::GlyphInstance;

/// CPU-side glyph batch for one frame.
#[derive(Debug, Default)]
pub struct GpuSpriteBatch {
    instances: Vec<GlyphInstance>,
    pending_atlas: Option<(Vec<u8>, u32)>,
}

impl GpuSpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(glyphs: usize) -> Self {
        Self {
            instances: Vec::with_capacity(glyphs),
            pending_atlas: None,
        }
    }

    pub fn instances(&self) -> &[GlyphInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn has_pending_atlas(&self) -> bool {
        self.pending_atlas.is_some()
    }

    /// Atlas pixels and side length waiting to be written, if any.
    pub fn take_pending_atlas(&mut self) -> Option<(Vec<u8>, u32)> {
        self.pending_atlas.take()
    }

    /// Sort back to front (larger depth first), keeping submission
    /// order among equal depths.
    pub fn sort_by_depth(&mut self) {
        self.instances.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    }

    /// Forget this frame's instances. A pending atlas is kept.
    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

impl SpriteBatch for GpuSpriteBatch {
    fn upload_atlas(&mut self, pixels: &[u8], size: u32) {
        // A later upload in the same frame supersedes an earlier one.
        match &mut self.pending_atlas {
            Some((data, pending_size)) => {
                data.clear();
                data.extend_from_slice(pixels);
                *pending_size = size;
            }
            None => self.pending_atlas = Some((pixels.to_vec(), size)),
        }
    }

    fn draw_glyph(&mut self, sprite: &GlyphSprite) {
        self.instances.push(GlyphInstance::from_sprite(sprite));
    }
}

// ===================================================================
// Tests
// ===================================================================
