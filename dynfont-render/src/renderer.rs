//! High-level renderer that ties the GPU context, the glyph pipeline,
//! and a frame's [`GpuSpriteBatch`] together.

use log::debug;
use thiserror::Error;
use wgpu::{
    Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureViewDescriptor,
};

use crate::batch::GpuSpriteBatch;
use crate::context::GpuContext;
use crate::pipelines::GlyphPipeline;
use crate::vertex::CameraUniform;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("No surface configured (headless mode)")]
    NoSurface,
}

/// Frame statistics returned after each render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Glyph instances drawn.
    pub glyph_count: u32,
    pub draw_calls: u32,
    /// Atlas texture writes since the previous frame.
    pub atlas_uploads: u32,
}

/// Dark slate gray.
const DEFAULT_CLEAR: Color = Color {
    r: 47.0 / 255.0,
    g: 79.0 / 255.0,
    b: 79.0 / 255.0,
    a: 1.0,
};

/// Draws batched glyph sprites.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = Renderer::new(&gpu, font.atlas().size());
/// font.draw(&mut batch, [30.0, 10.0], "text", WHITE)?;
/// renderer.prepare(&gpu, &mut batch, &camera);
/// let stats = renderer.render_to_surface(&gpu)?;
/// ```
pub struct Renderer {
    glyph_pipeline: GlyphPipeline,
    clear_color: Color,
    quad_uploaded: bool,
    atlas_uploads: u32,
}

impl Renderer {
    /// Create a renderer whose atlas texture starts at `atlas_size`.
    pub fn new(gpu: &GpuContext, atlas_size: u32) -> Self {
        Self {
            glyph_pipeline: GlyphPipeline::new(&gpu.device, gpu.surface_format, atlas_size),
            clear_color: DEFAULT_CLEAR,
            quad_uploaded: false,
            atlas_uploads: 0,
        }
    }

    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = Color { r, g, b, a };
    }

    /// Upload the frame's atlas (if pending), instances, and camera, then
    /// clear the batch's instances.
    ///
    /// Call once per frame before `render_to_surface()` or
    /// `render_to_texture()`.
    pub fn prepare(&mut self, gpu: &GpuContext, batch: &mut GpuSpriteBatch, camera: &CameraUniform) {
        if !self.quad_uploaded {
            self.glyph_pipeline.upload_quad(&gpu.queue);
            self.quad_uploaded = true;
        }

        if let Some((pixels, size)) = batch.take_pending_atlas() {
            if self
                .glyph_pipeline
                .upload_atlas(&gpu.device, &gpu.queue, &pixels, size)
            {
                self.atlas_uploads += 1;
                debug!("Atlas texture updated ({size}×{size})");
            }
        }

        batch.sort_by_depth();
        self.glyph_pipeline.upload_instances(&gpu.queue, batch.instances());
        self.glyph_pipeline.upload_camera(&gpu.queue, camera);
        batch.clear();
    }

    /// Render to the window surface.
    pub fn render_to_surface(&mut self, gpu: &GpuContext) -> Result<FrameStats, RenderError> {
        let surface = gpu.surface.as_ref().ok_or(RenderError::NoSurface)?;
        let output = surface.get_current_texture()?;
        let view = output.texture.create_view(&TextureViewDescriptor::default());

        self.encode(gpu, &view, "dynfont_frame");
        output.present();
        Ok(self.finish_frame())
    }

    /// Render to an off-screen texture (headless mode).
    ///
    /// `target_view` must use the context's `surface_format`.
    pub fn render_to_texture(&mut self, gpu: &GpuContext, target_view: &wgpu::TextureView) -> FrameStats {
        self.encode(gpu, target_view, "dynfont_offscreen");
        self.finish_frame()
    }

    pub fn glyph_pipeline(&self) -> &GlyphPipeline {
        &self.glyph_pipeline
    }

    fn encode(&self, gpu: &GpuContext, view: &wgpu::TextureView, label: &str) {
        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some(label),
        });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.glyph_pipeline.draw(&mut pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn finish_frame(&mut self) -> FrameStats {
        let glyph_count = self.glyph_pipeline.instance_count();
        FrameStats {
            glyph_count,
            draw_calls: u32::from(glyph_count > 0),
            atlas_uploads: std::mem::take(&mut self.atlas_uploads),
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
