//! Sprite-batch seam between text layout and the rendering backend.
//!
//! The backend owns the atlas texture. [`DynamicFont`](crate::DynamicFont)
//! pushes the whole pixel buffer through [`SpriteBatch::upload_atlas`]
//! at most once per draw call, then issues one
//! [`SpriteBatch::draw_glyph`] per visible character with the glyph's
//! atlas rect as the source rectangle.

use bitflags::bitflags;

use crate::atlas::{AtlasRect, AtlasRegion};

bitflags! {
    /// Mirroring applied to a drawn string.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SpriteEffects: u8 {
        const FLIP_HORIZONTALLY = 1;
        const FLIP_VERTICALLY = 1 << 1;
    }
}

/// Optional transform for [`DynamicFont::draw_with`](crate::DynamicFont::draw_with).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    /// Clockwise rotation in radians around `position`.
    pub rotation: f32,
    /// Point of the laid-out string (in unscaled pixels) placed at `position`.
    pub origin: [f32; 2],
    /// Per-axis scale.
    pub scale: [f32; 2],
    pub effects: SpriteEffects,
    /// Sort depth forwarded to the backend.
    pub depth: f32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            origin: [0.0, 0.0],
            scale: [1.0, 1.0],
            effects: SpriteEffects::empty(),
            depth: 0.0,
        }
    }
}

/// One textured rectangle to draw from the atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphSprite {
    /// Screen position of the sprite's top-left corner.
    pub position: [f32; 2],
    /// Source rectangle in the atlas.
    pub source: AtlasRect,
    /// Atlas side length, for UV conversion.
    pub atlas_size: u32,
    /// RGBA tint, each channel in [0.0, 1.0].
    pub color: [f32; 4],
    pub rotation: f32,
    pub scale: [f32; 2],
    pub effects: SpriteEffects,
    pub depth: f32,
}

impl GlyphSprite {
    /// Drawn size in pixels after scaling.
    pub fn size(&self) -> [f32; 2] {
        [
            self.source.width as f32 * self.scale[0],
            self.source.height as f32 * self.scale[1],
        ]
    }

    /// Source UVs with flip effects applied.
    pub fn uv(&self) -> AtlasRegion {
        let mut region = self.source.to_region(self.atlas_size);
        if self.effects.contains(SpriteEffects::FLIP_HORIZONTALLY) {
            std::mem::swap(&mut region.u_min, &mut region.u_max);
        }
        if self.effects.contains(SpriteEffects::FLIP_VERTICALLY) {
            std::mem::swap(&mut region.v_min, &mut region.v_max);
        }
        region
    }
}

/// Rendering backend for glyph sprites.
pub trait SpriteBatch {
    /// Replace the atlas texture contents with `pixels`
    /// (RGBA8, `size × size`, row-major).
    fn upload_atlas(&mut self, pixels: &[u8], size: u32);

    /// Queue one glyph sprite.
    fn draw_glyph(&mut self, sprite: &GlyphSprite);
}

/// In-memory batch that records calls instead of drawing.
///
/// Useful for headless measurement and for checking what a backend
/// would receive.
#[derive(Clone, Debug, Default)]
pub struct RecordingBatch {
    /// Every sprite drawn, in order.
    pub sprites: Vec<GlyphSprite>,
    /// Number of atlas uploads.
    pub uploads: usize,
    /// Copy of the most recent atlas upload.
    pub atlas: Vec<u8>,
}

impl RecordingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget recorded sprites, keeping the upload history.
    pub fn clear_sprites(&mut self) {
        self.sprites.clear();
    }
}

impl SpriteBatch for RecordingBatch {
    fn upload_atlas(&mut self, pixels: &[u8], _size: u32) {
        self.uploads += 1;
        self.atlas.clear();
        self.atlas.extend_from_slice(pixels);
    }

    fn draw_glyph(&mut self, sprite: &GlyphSprite) {
        self.sprites.push(*sprite);
    }
}

// ===================================================================
// Tests
// ===================================================================
