//! Glyph raster sources: font loading, metrics, and rasterization.
//!
//! [`GlyphRasterSource`] is the seam between the atlas/layout code and
//! the font library. Metrics follow the TrueType convention: vertical
//! metrics and kerning are reported in font units and the caller
//! multiplies them by the scale from
//! [`scale_for_pixel_size`](GlyphRasterSource::scale_for_pixel_size).
//!
//! [`FontdueSource`] implements it on top of `fontdue`.

use std::fmt;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use log::info;
use thiserror::Error;

/// Glyph indices at or below this value mean "no glyph for this codepoint".
pub const MISSING_GLYPH_INDEX: u16 = 1;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse font: {0}")]
    Parse(String),
}

// ── Metrics ─────────────────────────────────────────────────────────

/// Unscaled vertical metrics, in font units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

/// Scaled glyph bounding box in pixels, y growing downward.
///
/// `y0` is the top of the ink relative to the baseline, so it is
/// negative for glyphs that rise above the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// An alpha-coverage bitmap, row-major, one byte per pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

// ── Source trait ────────────────────────────────────────────────────

/// Font backend consumed by [`DynamicFont`](crate::DynamicFont).
pub trait GlyphRasterSource {
    /// Scale that maps one em to `pixels` pixels.
    fn scale_for_pixel_size(&self, pixels: f32) -> f32;

    /// Ascent, descent and line gap in font units.
    fn vertical_metrics(&self) -> VerticalMetrics;

    /// Glyph index for `ch`; values `<= MISSING_GLYPH_INDEX` mean absent.
    fn find_glyph_index(&self, ch: char) -> u16;

    /// Rasterize glyph `index` at the given scale.
    fn rasterize_glyph(&self, index: u16, scale_x: f32, scale_y: f32) -> GlyphBitmap;

    /// Pixel bounding box of `ch` at the given scale.
    fn glyph_bounding_box(&self, ch: char, scale_x: f32, scale_y: f32) -> BoundingBox;

    /// Kerning adjustment between `left` and `right`, in font units.
    fn kerning_advance(&self, left: char, right: char) -> f32;
}

// ── fontdue backend ─────────────────────────────────────────────────

/// A TrueType/OpenType font rasterized with `fontdue`.
pub struct FontdueSource {
    font: Font,
    units_per_em: f32,
}

impl fmt::Debug for FontdueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontdueSource")
            .field("units_per_em", &self.units_per_em)
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl FontdueSource {
    /// Parse a font from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        let units_per_em = font.units_per_em();
        info!(
            "Loaded font: {} glyphs, {} units/em",
            font.glyph_count(),
            units_per_em
        );
        Ok(Self { font, units_per_em })
    }

    /// Read and parse a font file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    /// fontdue sizes glyphs by pixels per em rather than by scale.
    fn px(&self, scale: f32) -> f32 {
        scale * self.units_per_em
    }
}

impl GlyphRasterSource for FontdueSource {
    fn scale_for_pixel_size(&self, pixels: f32) -> f32 {
        self.font.scale_factor(pixels)
    }

    fn vertical_metrics(&self) -> VerticalMetrics {
        // Line metrics at px == units_per_em are the raw font-unit values.
        match self.font.horizontal_line_metrics(self.units_per_em) {
            Some(m) => VerticalMetrics {
                ascent: m.ascent,
                descent: m.descent,
                line_gap: m.line_gap,
            },
            None => VerticalMetrics {
                ascent: self.units_per_em,
                descent: 0.0,
                line_gap: 0.0,
            },
        }
    }

    fn find_glyph_index(&self, ch: char) -> u16 {
        self.font.lookup_glyph_index(ch)
    }

    fn rasterize_glyph(&self, index: u16, _scale_x: f32, scale_y: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize_indexed(index, self.px(scale_y));
        GlyphBitmap {
            width: metrics.width as u32,
            height: metrics.height as u32,
            coverage,
        }
    }

    fn glyph_bounding_box(&self, ch: char, _scale_x: f32, scale_y: f32) -> BoundingBox {
        let m = self.font.metrics(ch, self.px(scale_y));
        let top = m.ymin + m.height as i32;
        BoundingBox {
            x0: m.xmin,
            y0: -top,
            x1: m.xmin + m.width as i32,
            y1: -m.ymin,
        }
    }

    fn kerning_advance(&self, left: char, right: char) -> f32 {
        self.font
            .horizontal_kern(left, right, self.units_per_em)
            .unwrap_or(0.0)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        let err = FontdueSource::from_bytes(b"definitely not a font").unwrap_err();
        assert!(matches!(err, FontError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = FontdueSource::from_path("/nonexistent/dynfont/missing.ttf").unwrap_err();
        match err {
            FontError::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/dynfont/missing.ttf"));
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    /// Common Latin system fonts; tests using them skip when none exist.
    const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    fn system_font() -> Option<FontdueSource> {
        SYSTEM_FONTS
            .iter()
            .find_map(|path| FontdueSource::from_path(path).ok())
    }

    #[test]
    fn test_scale_maps_em_to_pixels() {
        let Some(source) = system_font() else {
            return;
        };
        let upem = source.units_per_em();
        assert!(upem > 0.0);
        assert!((source.scale_for_pixel_size(upem) - 1.0).abs() < 1e-6);
        assert!((source.scale_for_pixel_size(24.0) * upem - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_metrics_are_in_font_units() {
        let Some(source) = system_font() else {
            return;
        };
        let px = 32.0;
        let scale = source.scale_for_pixel_size(px);
        let metrics = source.vertical_metrics();
        assert!(metrics.ascent > 0.0);
        assert!(metrics.descent <= 0.0);

        let scaled = source.font.horizontal_line_metrics(px).unwrap();
        assert!((metrics.ascent * scale - scaled.ascent).abs() < 1e-2);
        assert!((metrics.descent * scale - scaled.descent).abs() < 1e-2);

        let kern = source.kerning_advance('A', 'V') * scale;
        let expected = source.font.horizontal_kern('A', 'V', px).unwrap_or(0.0);
        assert!((kern - expected).abs() < 1e-2);
    }

    #[test]
    fn test_bounding_box_is_y_down() {
        let Some(source) = system_font() else {
            return;
        };
        let scale = source.scale_for_pixel_size(48.0);
        for ch in ['A', 'g', 'x'] {
            let index = source.find_glyph_index(ch);
            assert!(index > MISSING_GLYPH_INDEX, "{ch:?} missing");
            let bitmap = source.rasterize_glyph(index, scale, scale);
            let bbox = source.glyph_bounding_box(ch, scale, scale);
            assert_eq!((bbox.x1 - bbox.x0) as u32, bitmap.width, "{ch:?}");
            assert_eq!((bbox.y1 - bbox.y0) as u32, bitmap.height, "{ch:?}");
            assert!(bbox.y0 < 0, "{ch:?} should rise above the baseline");
        }
        // Capitals sit on the baseline; descenders hang below it.
        assert!(source.glyph_bounding_box('A', scale, scale).y1.abs() <= 1);
        assert!(source.glyph_bounding_box('g', scale, scale).y1 > 0);
    }

    #[test]
    fn test_error_messages() {
        let err = FontError::Parse("bad table".into());
        assert_eq!(err.to_string(), "Failed to parse font: bad table");
    }
}
