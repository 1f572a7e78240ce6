//! End-to-end tests for layout, atlas residency, and drawing.
//!
//! A synthetic raster source stands in for a real font: every glyph is
//! a solid block whose size is configured per character, with a 24-unit
//! em so that the default 18pt size maps to a scale of exactly 1.0.

use std::cell::Cell;
use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;

use dynfont_text::fonts::{BoundingBox, GlyphBitmap, VerticalMetrics};
use dynfont_text::{
    AtlasError, AtlasRect, DrawParams, DynamicFont, FontConfig, GlyphRasterSource,
    RecordingBatch, SpriteEffects, WidePunctuation,
};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Default)]
struct BlockSource {
    sizes: HashMap<char, (u32, u32)>,
    missing: Vec<char>,
    kerning: HashMap<(char, char), f32>,
    rasterized: Cell<usize>,
}

impl BlockSource {
    fn new() -> Self {
        Self::default()
    }

    fn with_size(mut self, ch: char, width: u32, height: u32) -> Self {
        self.sizes.insert(ch, (width, height));
        self
    }

    fn with_missing(mut self, ch: char) -> Self {
        self.missing.push(ch);
        self
    }

    fn with_kerning(mut self, left: char, right: char, units: f32) -> Self {
        self.kerning.insert((left, right), units);
        self
    }

    fn scaled_size(&self, ch: char, scale: f32) -> (u32, u32) {
        let (w, h) = self.sizes.get(&ch).copied().unwrap_or((8, 10));
        ((w as f32 * scale) as u32, (h as f32 * scale) as u32)
    }
}

impl GlyphRasterSource for BlockSource {
    fn scale_for_pixel_size(&self, pixels: f32) -> f32 {
        pixels / 24.0
    }

    fn vertical_metrics(&self) -> VerticalMetrics {
        VerticalMetrics {
            ascent: 18.0,
            descent: -6.0,
            line_gap: 0.0,
        }
    }

    fn find_glyph_index(&self, ch: char) -> u16 {
        if self.missing.contains(&ch) {
            0
        } else {
            ch as u32 as u16
        }
    }

    fn rasterize_glyph(&self, index: u16, scale_x: f32, _scale_y: f32) -> GlyphBitmap {
        self.rasterized.set(self.rasterized.get() + 1);
        let ch = char::from_u32(u32::from(index)).unwrap_or('\0');
        let (width, height) = self.scaled_size(ch, scale_x);
        GlyphBitmap {
            width,
            height,
            coverage: vec![255; (width * height) as usize],
        }
    }

    fn glyph_bounding_box(&self, ch: char, scale_x: f32, _scale_y: f32) -> BoundingBox {
        let (width, height) = self.scaled_size(ch, scale_x);
        BoundingBox {
            x0: 0,
            y0: -(height as i32),
            x1: width as i32,
            y1: 0,
        }
    }

    fn kerning_advance(&self, left: char, right: char) -> f32 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0.0)
    }
}

fn font(source: BlockSource, atlas_size: u32) -> DynamicFont<BlockSource> {
    let config = FontConfig {
        atlas_size,
        wide_punctuation_mode: WidePunctuation::Members,
        ..FontConfig::default()
    };
    DynamicFont::new(source, config).unwrap()
}

fn assert_close(actual: [f32; 2], expected: [f32; 2]) {
    assert!(
        (actual[0] - expected[0]).abs() < 1e-3 && (actual[1] - expected[1]).abs() < 1e-3,
        "expected {expected:?}, got {actual:?}"
    );
}

// ── Atlas residency ─────────────────────────────────────────────────

#[test]
fn test_resident_glyphs_never_overlap() {
    let chars: Vec<char> = (0..200)
        .filter_map(|i| char::from_u32(0x4E00 + i))
        .collect();
    let mut source = BlockSource::new();
    for (i, &ch) in chars.iter().enumerate() {
        source = source.with_size(ch, 4 + (i % 9) as u32, 5 + (i % 7) as u32);
    }
    let mut font = font(source, 64);

    for chunk in chars.chunks(5) {
        let text: String = chunk.iter().collect();
        font.layout(&text).unwrap();

        let resident: Vec<_> = font.atlas().index().iter().copied().collect();
        for (i, a) in resident.iter().enumerate() {
            assert!(a.rect.x + a.rect.width <= 64 && a.rect.y + a.rect.height <= 64);
            assert_eq!(
                font.atlas().pixels().pixel(a.rect.x, a.rect.y),
                Some([255; 4]),
                "resident glyph {:?} lost its pixels",
                a.ch
            );
            for b in &resident[i + 1..] {
                assert!(
                    !a.rect.intersects(&b.rect),
                    "{:?} {:?} overlaps {:?} {:?}",
                    a.ch,
                    a.rect,
                    b.ch,
                    b.rect
                );
            }
        }
    }
    assert!(font.atlas().stats().evictions > 0);
}

#[test]
fn test_layout_is_idempotent() {
    let mut font = font(BlockSource::new(), 128);
    let first = font.layout("hello").unwrap();
    assert_eq!(first.new_glyphs, 4);
    let rasterized = font.source().rasterized.get();

    let second = font.layout("hello").unwrap();
    assert_eq!(second.new_glyphs, 0);
    assert_eq!(second.glyphs, first.glyphs);
    assert_eq!(font.source().rasterized.get(), rasterized);
}

#[test]
fn test_fifo_eviction_order() {
    // 32×32 holds exactly twelve 8×10 blocks: four per row, three rows.
    let mut font = font(BlockSource::new(), 32);
    font.layout("abcdefghijkl").unwrap();
    assert_eq!(font.atlas().glyph_count(), 12);
    assert_eq!(font.atlas().stats().evictions, 0);

    font.layout("m").unwrap();
    assert!(font.atlas().get('a').is_none());
    assert!(font.atlas().get('b').is_some());
    assert_eq!(font.atlas().get('m').unwrap().rect, AtlasRect::new(0, 0, 8, 10));
    assert_eq!(font.atlas().stats().evictions, 1);
}

#[test]
fn test_evicted_glyph_is_rasterized_again() {
    let mut font = font(BlockSource::new(), 32);
    font.layout("abcdefghijklm").unwrap();
    let rasterized = font.source().rasterized.get();

    let layout = font.layout("a").unwrap();
    assert_eq!(layout.new_glyphs, 1);
    assert_eq!(font.source().rasterized.get(), rasterized + 1);
    assert!(font.atlas().get('b').is_none());
    assert_eq!(font.atlas().get('a').unwrap().rect, AtlasRect::new(8, 0, 8, 10));
}

#[test]
fn test_zero_area_glyph_takes_no_space() {
    let source = BlockSource::new().with_size(' ', 0, 0);
    let mut font = font(source, 32);
    let layout = font.layout("a b").unwrap();

    let space = font.atlas().get(' ').unwrap();
    assert!(space.rect.is_empty());
    assert_eq!(font.atlas().queue().len(), 2);
    // a: 8 + 1; space: 0 + 1 + 5
    assert_eq!(layout.glyphs[2].x, 15);
}

#[test]
fn test_oversized_glyph_is_an_error() {
    let source = BlockSource::new().with_size('W', 20, 10);
    let mut font = font(source, 16);
    let err = font.layout("aW").unwrap_err();
    assert_eq!(
        err,
        AtlasError::OversizedGlyph {
            ch: 'W',
            width: 20,
            height: 10,
            atlas_size: 16,
        }
    );
    assert!(font.atlas().get('a').is_some());
}

#[test]
fn test_hard_reset_when_nothing_fits() {
    let source = BlockSource::new().with_size('#', 32, 12);
    let mut font = font(source, 32);
    font.layout("abcdefghijkl").unwrap();

    font.layout("#").unwrap();
    let stats = font.atlas().stats();
    assert_eq!(stats.hard_resets, 1);
    assert_eq!(font.atlas().glyph_count(), 1);
    assert!(font.atlas().get('a').is_none());
    assert_eq!(font.atlas().get('#').unwrap().rect, AtlasRect::new(0, 0, 32, 12));
    assert!(font
        .atlas()
        .pixels()
        .is_background(&AtlasRect::new(0, 12, 32, 20)));
    assert!(font.atlas().allocator().free_rects().is_empty());
}

// ── Layout ──────────────────────────────────────────────────────────

#[test]
fn test_pen_advance_with_kerning() {
    let source = BlockSource::new()
        .with_size('A', 10, 10)
        .with_size('V', 12, 10)
        .with_kerning('A', 'V', -2.0);
    let mut font = font(source, 128);

    let layout = font.layout("AV").unwrap();
    assert_eq!(layout.glyphs[0].x, 0);
    assert_eq!(layout.glyphs[1].x, 9);
    assert_eq!(layout.width, 21);
    assert_eq!(layout.advance, 22);
}

#[test]
fn test_kerning_scales_with_font_size() {
    let source = BlockSource::new()
        .with_size('A', 10, 10)
        .with_size('V', 12, 10)
        .with_kerning('A', 'V', -2.0);
    let config = FontConfig {
        font_size: 36.0,
        wide_punctuation_mode: WidePunctuation::Members,
        ..FontConfig::default()
    };
    let mut font = DynamicFont::new(source, config).unwrap();
    assert_eq!(font.scale(), 2.0);

    let layout = font.layout("AV").unwrap();
    assert_eq!(layout.glyphs[1].x, 20 + 1 - 4);
    assert_eq!(layout.width, 41);
}

#[test]
fn test_wide_punctuation_always_applies_by_default() {
    let mut font = DynamicFont::new(BlockSource::new(), FontConfig::default()).unwrap();
    let layout = font.layout("ab").unwrap();
    assert_eq!(layout.glyphs[1].x, 8 + 1 + 10);
}

#[test]
fn test_wide_punctuation_members_only() {
    let mut font = font(BlockSource::new(), 128);
    let layout = font.layout("，a,b").unwrap();
    assert_eq!(layout.glyphs[1].x, 8 + 1 + 10);
    assert_eq!(layout.glyphs[3].x, 19 + 9 + 9);
}

#[test]
fn test_spacing_setters() {
    let mut font = font(BlockSource::new(), 128);
    font.set_character_spacing(3);
    font.set_space_width(0);
    let layout = font.layout("a b").unwrap();
    assert_eq!(layout.glyphs[1].x, 11);
    assert_eq!(layout.glyphs[2].x, 22);
}

#[test]
fn test_missing_glyph_cached_under_original() {
    let source = BlockSource::new().with_missing('★').with_size('□', 6, 6);
    let mut font = font(source, 128);

    let layout = font.layout("★★").unwrap();
    assert_eq!(font.source().rasterized.get(), 1);
    let glyph = layout.glyphs[0].glyph;
    assert_eq!(glyph.ch, '★');
    assert_eq!(glyph.index, '□' as u16);
    assert_eq!(glyph.rect.width, 6);
    // Ascent comes from the placeholder's box.
    assert_eq!(layout.glyphs[0].y, 18 - 6);
    assert!(font.atlas().get('□').is_none());
}

#[test]
fn test_second_placeholder_used_when_first_missing() {
    let source = BlockSource::new().with_missing('★').with_missing('□');
    let mut font = font(source, 128);
    let layout = font.layout("★").unwrap();
    assert_eq!(layout.glyphs[0].glyph.index, '_' as u16);
}

#[test]
fn test_size_change_keeps_stale_glyphs() {
    let mut font = font(BlockSource::new(), 128);
    font.layout("a").unwrap();

    font.set_size(36.0).unwrap();
    assert_eq!(font.ascent(), 36);
    let layout = font.layout("ab").unwrap();
    assert_eq!(layout.glyphs[0].glyph.rect.width, 8);
    assert_eq!(layout.glyphs[1].glyph.rect.width, 16);
    assert_eq!(layout.glyphs[1].y, 36 - 20);

    font.clear_atlas();
    let layout = font.layout("a").unwrap();
    assert_eq!(layout.glyphs[0].glyph.rect.width, 16);
}

#[test]
fn test_measure_matches_layout() {
    let mut font = font(BlockSource::new(), 128);
    let layout = font.layout("abc").unwrap();
    assert_eq!(font.measure("abc").unwrap(), (layout.width, layout.height));
}

// ── Drawing ─────────────────────────────────────────────────────────

#[test]
fn test_draw_uploads_only_when_dirty() {
    let mut font = font(BlockSource::new(), 128);
    let mut batch = RecordingBatch::new();

    font.draw(&mut batch, [0.0, 0.0], "ab", WHITE).unwrap();
    assert_eq!(batch.uploads, 1);
    font.draw(&mut batch, [0.0, 0.0], "ba", WHITE).unwrap();
    assert_eq!(batch.uploads, 1);
    font.draw(&mut batch, [0.0, 0.0], "abc", WHITE).unwrap();
    assert_eq!(batch.uploads, 2);
    assert_eq!(batch.sprites.len(), 7);
}

#[test]
fn test_uploaded_atlas_is_premultiplied_white() {
    let mut font = font(BlockSource::new(), 32);
    let mut batch = RecordingBatch::new();
    font.draw(&mut batch, [0.0, 0.0], "a", WHITE).unwrap();

    assert_eq!(batch.atlas.len(), 32 * 32 * 4);
    assert_eq!(&batch.atlas[0..4], &[255, 255, 255, 255]);
    let outside = (12 * 32 + 20) * 4;
    assert_eq!(&batch.atlas[outside..outside + 4], &font.config().background);
}

#[test]
fn test_draw_positions_and_color() {
    let mut font = font(BlockSource::new(), 128);
    let mut batch = RecordingBatch::new();
    let color = [1.0, 0.0, 0.0, 0.5];
    font.draw(&mut batch, [30.0, 10.0], "ab", color).unwrap();

    assert_close(batch.sprites[0].position, [30.0, 18.0]);
    assert_close(batch.sprites[1].position, [39.0, 18.0]);
    assert_eq!(batch.sprites[1].color, color);
    assert_eq!(batch.sprites[1].source, font.atlas().get('b').unwrap().rect);
}

#[test]
fn test_draw_with_scale_and_origin() {
    let mut font = font(BlockSource::new(), 128);
    let mut batch = RecordingBatch::new();
    let params = DrawParams {
        origin: [4.0, 8.0],
        scale: [2.0, 2.0],
        depth: 0.5,
        ..DrawParams::default()
    };
    font.draw_with(&mut batch, [100.0, 100.0], "ab", WHITE, &params)
        .unwrap();

    assert_close(batch.sprites[0].position, [92.0, 100.0]);
    assert_close(batch.sprites[1].position, [110.0, 100.0]);
    assert_eq!(batch.sprites[1].size(), [16.0, 20.0]);
    assert_eq!(batch.sprites[1].depth, 0.5);
}

#[test]
fn test_draw_with_rotation() {
    let mut font = font(BlockSource::new(), 128);
    let mut batch = RecordingBatch::new();
    let params = DrawParams {
        rotation: FRAC_PI_2,
        ..DrawParams::default()
    };
    font.draw_with(&mut batch, [50.0, 50.0], "ab", WHITE, &params)
        .unwrap();

    // (9, 8) rotated a quarter turn clockwise in y-down space.
    assert_close(batch.sprites[1].position, [42.0, 59.0]);
    assert_eq!(batch.sprites[1].rotation, FRAC_PI_2);
}

#[test]
fn test_draw_flipped_horizontally() {
    let mut font = font(BlockSource::new(), 128);
    let mut batch = RecordingBatch::new();
    let params = DrawParams {
        effects: SpriteEffects::FLIP_HORIZONTALLY,
        ..DrawParams::default()
    };
    font.draw_with(&mut batch, [0.0, 0.0], "ab", WHITE, &params)
        .unwrap();

    assert_close(batch.sprites[0].position, [9.0, 8.0]);
    assert_close(batch.sprites[1].position, [0.0, 8.0]);
    let uv = batch.sprites[0].uv();
    assert!(uv.u_min > uv.u_max);
}
