//! # dynfont-text
//!
//! Dynamic sprite fonts: TrueType glyphs rasterized on demand into a
//! fixed-size RGBA atlas that evicts the oldest glyphs when it fills up.
//!
//! ## Architecture
//!
//! ```text
//! DynamicFont (GlyphRasterSource + FontConfig)
//!     │
//!     ▼
//! layout(str) ──► TextLayout { Vec<PositionedGlyph> }
//!     │                            │
//!     ▼                            ▼
//! GlyphAtlas ◄── coverage ──  draw(SpriteBatch)
//!   ├─ ShelfAllocator (shelf → free list → FIFO eviction → reset)
//!   ├─ GlyphIndex / EvictionQueue
//!   └─ PixelBuffer ──────────► upload_atlas (once per dirty draw)
//! ```
//!
//! - **`engine`**: Layout, pen advance, placeholder substitution, drawing.
//! - **`atlas`**: Shelf packing, reclamation, and residency.
//! - **`glyph`**: Glyph records, the residency index, the FIFO queue.
//! - **`pixels`**: The CPU-side RGBA8 atlas image.
//! - **`fonts`**: Raster-source trait and the `fontdue` backend.
//! - **`batch`**: Sprite-batch seam to the renderer.
//! - **`config`**: Construction options, JSON-loadable.

pub mod atlas;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod glyph;
pub mod pixels;

// Re-exports for ergonomic use.
pub use atlas::{AtlasError, AtlasRect, AtlasRegion, AtlasStats, GlyphAtlas, GlyphEntry};
pub use batch::{DrawParams, GlyphSprite, RecordingBatch, SpriteBatch, SpriteEffects};
pub use config::{ConfigError, FontConfig, WidePunctuation, MAX_ATLAS_SIZE};
pub use engine::{DynamicFont, PositionedGlyph, TextLayout};
pub use error::TextError;
pub use fonts::{FontError, FontdueSource, GlyphRasterSource};
pub use glyph::{EvictionQueue, Glyph, GlyphIndex};
pub use pixels::PixelBuffer;
