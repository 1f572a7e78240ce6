//! # dynfont-render
//!
//! GPU backend for `dynfont-text` sprite fonts, built on `wgpu`.
//!
//! ## Architecture
//!
//! ```text
//!  DynamicFont::draw (dynfont-text)
//!       │  upload_atlas / draw_glyph
//!       ▼
//!  GpuSpriteBatch                   ◀─── GlyphSprite → GlyphInstance
//!       │
//!       ▼
//!  Renderer.prepare(batch)          ◀─── atlas write_texture (if pending)
//!       │                                + instance upload
//!       ▼
//!  Renderer.render_to_surface()     ◀─── single instanced draw call
//! ```
//!
//! ## Crate modules
//!
//! - [`context`]: GPU device/queue/surface initialisation
//! - [`vertex`]: vertex, instance, and camera data types
//! - [`pipelines`]: the glyph render pipeline
//! - [`batch`]: `SpriteBatch` implementation recording GPU instances
//! - [`renderer`]: high-level frame orchestration

pub mod batch;
pub mod context;
pub mod pipelines;
pub mod renderer;
pub mod vertex;

// Re-exports for convenience
pub use batch::GpuSpriteBatch;
pub use context::{GpuContext, GpuError};
pub use renderer::{FrameStats, RenderError, Renderer};
pub use vertex::{CameraUniform, GlyphInstance, QuadVertex};
