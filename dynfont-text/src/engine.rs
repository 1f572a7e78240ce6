//! Text engine: lays out strings against the dynamic glyph atlas.
//!
//! [`DynamicFont`] resolves each character through the atlas,
//! rasterizing on a miss, and advances a horizontal pen:
//!
//! ```text
//! pen += glyph width + character spacing
//!      (+ space width          if ' ')
//!      (+ wide-punctuation width if flagged)
//!      (+ kerning(ch, next) * scale, truncated, if a next char exists)
//! ```
//!
//! Each glyph's top sits at `font ascent + bbox top` below the draw
//! origin. Drawing flushes the atlas to the backend once, and only if a
//! glyph was added or evicted since the last flush.
//!
//! Changing the font size does not invalidate cached glyphs: characters
//! rasterized at the old size stay resident and keep being drawn until
//! they are evicted or [`DynamicFont::clear_atlas`] is called.

use std::path::Path;

use log::{debug, warn};

use crate::atlas::{AtlasError, GlyphAtlas, GlyphEntry};
use crate::batch::{DrawParams, GlyphSprite, SpriteBatch, SpriteEffects};
use crate::config::{ConfigError, FontConfig};
use crate::error::TextError;
use crate::fonts::{FontdueSource, GlyphRasterSource, MISSING_GLYPH_INDEX};
use crate::glyph::Glyph;

/// Points to pixels at 96 DPI.
const POINTS_TO_PIXELS: f32 = 96.0 / 72.0;

/// A glyph placed relative to the layout origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionedGlyph {
    /// Character from the input string.
    pub ch: char,
    pub glyph: Glyph,
    /// Pen position (left edge), in pixels.
    pub x: i32,
    /// Top edge, in pixels.
    pub y: i32,
}

/// Result of laying out a string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextLayout {
    pub glyphs: Vec<PositionedGlyph>,
    /// Pen position after the last glyph, trailing spacing included.
    pub advance: i32,
    /// Rightmost ink edge, `max(x + width)`.
    pub width: i32,
    /// Lowest ink edge, `max(y + height)`.
    pub height: i32,
    /// Glyphs rasterized during this layout.
    pub new_glyphs: usize,
}

/// A font rendered through a fixed-size, self-evicting glyph atlas.
///
/// Not internally synchronized: every call takes `&mut self`, and
/// callers sharing one font across threads must serialize access.
pub struct DynamicFont<S = FontdueSource> {
    source: S,
    config: FontConfig,
    atlas: GlyphAtlas,
    /// Em-to-pixel scale for the current size.
    scale: f32,
    /// Font ascent in pixels for the current size.
    ascent: i32,
}

impl DynamicFont<FontdueSource> {
    /// Load a font file and build its atlas.
    pub fn from_path(path: impl AsRef<Path>, config: FontConfig) -> Result<Self, TextError> {
        Self::new(FontdueSource::from_path(path)?, config)
    }

    /// Parse font bytes and build the atlas.
    pub fn from_bytes(bytes: &[u8], config: FontConfig) -> Result<Self, TextError> {
        Self::new(FontdueSource::from_bytes(bytes)?, config)
    }
}

impl<S: GlyphRasterSource> DynamicFont<S> {
    /// Create a font over `source`. Fails on an invalid config.
    pub fn new(source: S, config: FontConfig) -> Result<Self, TextError> {
        config.validate()?;
        let atlas = GlyphAtlas::new(config.atlas_size, config.background);
        let mut font = Self {
            source,
            config,
            atlas,
            scale: 0.0,
            ascent: 0,
        };
        font.update_metrics();
        Ok(font)
    }

    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Font size in points.
    pub fn size(&self) -> f32 {
        self.config.font_size
    }

    /// Change the font size. Cached glyphs are kept as they are.
    pub fn set_size(&mut self, points: f32) -> Result<(), ConfigError> {
        if !(points.is_finite() && points > 0.0) {
            return Err(ConfigError::InvalidFontSize(points));
        }
        self.config.font_size = points;
        self.update_metrics();
        Ok(())
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Font ascent in pixels at the current size.
    pub fn ascent(&self) -> i32 {
        self.ascent
    }

    pub fn set_character_spacing(&mut self, pixels: i32) {
        self.config.character_spacing = pixels;
    }

    pub fn set_space_width(&mut self, pixels: i32) {
        self.config.space_width = pixels;
    }

    pub fn set_wide_punctuation_width(&mut self, pixels: i32) {
        self.config.wide_punctuation_width = pixels;
    }

    /// Drop every cached glyph and reset the atlas to the background.
    pub fn clear_atlas(&mut self) {
        self.atlas.clear();
    }

    fn update_metrics(&mut self) {
        let pixels = self.config.font_size * POINTS_TO_PIXELS;
        self.scale = self.source.scale_for_pixel_size(pixels);
        self.ascent = (self.source.vertical_metrics().ascent * self.scale) as i32;
        debug!(
            "Font size {}pt: scale {}, ascent {}px",
            self.config.font_size, self.scale, self.ascent
        );
    }

    /// Lay out `text` on a single line, rasterizing missing glyphs.
    pub fn layout(&mut self, text: &str) -> Result<TextLayout, AtlasError> {
        let mut resolved = Vec::with_capacity(text.len());
        let mut new_glyphs = 0;
        for ch in text.chars() {
            let (glyph, rasterized) = self.resolve(ch)?;
            new_glyphs += usize::from(rasterized);
            resolved.push(glyph);
        }

        let stale = resolved
            .iter()
            .filter(|g| self.atlas.get(g.ch).map(|r| r.rect) != Some(g.rect))
            .count();
        if stale > 0 {
            warn!(
                "{stale} glyph(s) were evicted while laying out the same string; \
                 the {0}×{0} atlas is too small for it",
                self.atlas.size()
            );
        }

        let mut layout = TextLayout {
            glyphs: Vec::with_capacity(resolved.len()),
            new_glyphs,
            ..TextLayout::default()
        };
        let mut pen = 0;
        for (i, glyph) in resolved.iter().enumerate() {
            let (x, y) = (pen, glyph.ascent);
            layout.glyphs.push(PositionedGlyph {
                ch: glyph.ch,
                glyph: *glyph,
                x,
                y,
            });
            layout.width = layout.width.max(x + glyph.rect.width as i32);
            layout.height = layout.height.max(y + glyph.rect.height as i32);
            pen += self.advance(glyph, resolved.get(i + 1));
        }
        layout.advance = pen;
        Ok(layout)
    }

    /// Ink `(width, height)` of `text`.
    pub fn measure(&mut self, text: &str) -> Result<(i32, i32), AtlasError> {
        let layout = self.layout(text)?;
        Ok((layout.width, layout.height))
    }

    /// Draw `text` with its top-left at `position`.
    pub fn draw<B>(
        &mut self,
        batch: &mut B,
        position: [f32; 2],
        text: &str,
        color: [f32; 4],
    ) -> Result<TextLayout, AtlasError>
    where
        B: SpriteBatch + ?Sized,
    {
        self.draw_with(batch, position, text, color, &DrawParams::default())
    }

    /// Draw `text` with rotation, origin, scale, effects, and depth.
    pub fn draw_with<B>(
        &mut self,
        batch: &mut B,
        position: [f32; 2],
        text: &str,
        color: [f32; 4],
        params: &DrawParams,
    ) -> Result<TextLayout, AtlasError>
    where
        B: SpriteBatch + ?Sized,
    {
        let layout = self.layout(text)?;

        if self.atlas.take_dirty() {
            debug!(
                "Uploading glyph atlas ({0}×{0}, {1} glyphs)",
                self.atlas.size(),
                self.atlas.glyph_count()
            );
            batch.upload_atlas(self.atlas.pixels().data(), self.atlas.size());
        }

        let (sin, cos) = params.rotation.sin_cos();
        for placed in &layout.glyphs {
            let rect = placed.glyph.rect;
            if rect.is_empty() {
                continue;
            }

            let mut x = placed.x as f32;
            let mut y = placed.y as f32;
            if params.effects.contains(SpriteEffects::FLIP_HORIZONTALLY) {
                x = (layout.width - placed.x - rect.width as i32) as f32;
            }
            if params.effects.contains(SpriteEffects::FLIP_VERTICALLY) {
                y = (layout.height - placed.y - rect.height as i32) as f32;
            }

            let local_x = (x - params.origin[0]) * params.scale[0];
            let local_y = (y - params.origin[1]) * params.scale[1];
            batch.draw_glyph(&GlyphSprite {
                position: [
                    position[0] + local_x * cos - local_y * sin,
                    position[1] + local_x * sin + local_y * cos,
                ],
                source: rect,
                atlas_size: self.atlas.size(),
                color,
                rotation: params.rotation,
                scale: params.scale,
                effects: params.effects,
                depth: params.depth,
            });
        }

        Ok(layout)
    }

    /// Cached glyph for `ch`, rasterizing it on a miss.
    fn resolve(&mut self, ch: char) -> Result<(Glyph, bool), AtlasError> {
        if let Some(glyph) = self.atlas.get(ch) {
            return Ok((*glyph, false));
        }

        let (drawn, index) = self.find_renderable(ch);
        let bitmap = self.source.rasterize_glyph(index, self.scale, self.scale);
        let bbox = self.source.glyph_bounding_box(drawn, self.scale, self.scale);
        let entry = GlyphEntry {
            index,
            ascent: self.ascent + bbox.y0,
            wide_punctuation: self.config.is_wide_punctuation(ch),
        };

        let glyph = self
            .atlas
            .insert(ch, entry, bitmap.width, bitmap.height, &bitmap.coverage)?;
        Ok((glyph, true))
    }

    /// The character actually rasterized for `ch`, and its glyph index.
    fn find_renderable(&self, ch: char) -> (char, u16) {
        let index = self.source.find_glyph_index(ch);
        if index > MISSING_GLYPH_INDEX {
            return (ch, index);
        }

        for &placeholder in &self.config.placeholders {
            let index = self.source.find_glyph_index(placeholder);
            if index > MISSING_GLYPH_INDEX {
                debug!("No glyph for {ch:?}, substituting {placeholder:?}");
                return (placeholder, index);
            }
        }
        debug!("No glyph for {ch:?} and no placeholder available");
        (ch, index)
    }

    fn advance(&self, glyph: &Glyph, next: Option<&Glyph>) -> i32 {
        let mut advance = glyph.rect.width as i32 + self.config.character_spacing;
        if glyph.ch == ' ' {
            advance += self.config.space_width;
        }
        if glyph.wide_punctuation {
            advance += self.config.wide_punctuation_width;
        }
        if let Some(next) = next {
            let kern = self.source.kerning_advance(glyph.ch, next.ch);
            advance += (kern * self.scale) as i32;
        }
        advance
    }
}

// ===================================================================
// Tests
// ===================================================================
