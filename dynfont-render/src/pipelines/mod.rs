//! wgpu render pipelines.

pub mod glyph;

pub use glyph::{GlyphPipeline, MAX_GLYPH_INSTANCES};
