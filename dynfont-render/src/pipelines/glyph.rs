//! Glyph render pipeline: instanced rendering of atlas-textured quads.
//!
//! Uses a shared unit quad with per-instance glyph data (position, size,
//! UV region in the atlas, color, rotation).  One draw call renders all
//! glyphs.

use log::{debug, warn};
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry,
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingResource, BindingType, BlendState, Buffer, BufferBindingType,
    BufferDescriptor, BufferUsages, ColorTargetState, ColorWrites, Device,
    Extent3d, FilterMode, FragmentState, FrontFace, IndexFormat,
    MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor,
    PolygonMode, PrimitiveState, PrimitiveTopology, Queue, RenderPass,
    RenderPipeline, RenderPipelineDescriptor, SamplerBindingType,
    SamplerDescriptor, ShaderModuleDescriptor, ShaderStages, Texture,
    TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureViewDimension, VertexState,
};

use crate::vertex::{CameraUniform, GlyphInstance, QuadVertex};

/// Maximum glyph instances per draw call.
pub const MAX_GLYPH_INSTANCES: usize = 65_536;

/// Linear coverage, not sRGB: the bytes are alpha values.
const ATLAS_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// Owns the wgpu pipeline, buffers, atlas texture, and bind groups.
pub struct GlyphPipeline {
    pipeline: RenderPipeline,

    // Geometry (shared unit quad).
    vertex_buffer: Buffer,
    index_buffer: Buffer,

    // Instancing.
    instance_buffer: Buffer,
    instance_count: u32,

    // Camera.
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,

    // Atlas texture.
    atlas_texture: Texture,
    atlas_bind_group: BindGroup,
    atlas_bgl: BindGroupLayout,
    atlas_size: u32,
}

impl GlyphPipeline {
    /// Create the glyph pipeline and allocate GPU buffers.
    ///
    /// `atlas_size` is the width=height of the glyph atlas texture.
    pub fn new(device: &Device, surface_format: TextureFormat, atlas_size: u32) -> Self {
        // ── Shader ──────────────────────────────────────────────
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("glyph_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/glyph.wgsl").into()),
        });

        // ── Camera bind group layout (group 0) ──────────────────
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("glyph_camera_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Atlas bind group layout (group 1) ───────────────────
        let atlas_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("glyph_atlas_bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("glyph_pipeline_layout"),
            bind_group_layouts: &[&camera_bgl, &atlas_bgl],
            push_constant_ranges: &[],
        });

        // ── Render pipeline ─────────────────────────────────────
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("glyph_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[QuadVertex::layout(), GlyphInstance::layout()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ── Buffers ─────────────────────────────────────────────
        let vertex_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("glyph_quad_vb"),
            size: std::mem::size_of::<[QuadVertex; 4]>() as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("glyph_quad_ib"),
            size: std::mem::size_of::<[u16; 6]>() as u64,
            usage: BufferUsages::INDEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let instance_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("glyph_instances"),
            size: (MAX_GLYPH_INSTANCES * std::mem::size_of::<GlyphInstance>()) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("glyph_camera_ub"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("glyph_camera_bg"),
            layout: &camera_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // ── Atlas texture (blank until the first upload) ────────
        let (atlas_texture, atlas_bind_group) = create_atlas(device, &atlas_bgl, atlas_size);

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            instance_count: 0,
            camera_buffer,
            camera_bind_group,
            atlas_texture,
            atlas_bind_group,
            atlas_bgl,
            atlas_size,
        }
    }

    // ───────────────────── Upload ─────────────────────────────────

    /// Upload the static quad geometry. Call once after creation.
    pub fn upload_quad(&self, queue: &Queue) {
        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&QuadVertex::VERTICES),
        );
        queue.write_buffer(
            &self.index_buffer,
            0,
            bytemuck::cast_slice(&QuadVertex::INDICES),
        );
    }

    /// Upload glyph instance data for this frame.
    ///
    /// Instances past [`MAX_GLYPH_INSTANCES`] are dropped.
    pub fn upload_instances(&mut self, queue: &Queue, instances: &[GlyphInstance]) -> u32 {
        let count = instances.len().min(MAX_GLYPH_INSTANCES);
        if count < instances.len() {
            warn!(
                "Dropping {} glyph instances over the per-frame limit of {MAX_GLYPH_INSTANCES}",
                instances.len() - count
            );
        }
        if count == 0 {
            self.instance_count = 0;
            return 0;
        }

        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&instances[..count]),
        );
        self.instance_count = count as u32;
        self.instance_count
    }

    pub fn upload_camera(&self, queue: &Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    /// Replace the atlas texture with `data` (RGBA8, `size × size`).
    ///
    /// The texture is recreated when `size` differs from the current one.
    /// Returns `false` if `data` is too short and nothing was written.
    pub fn upload_atlas(&mut self, device: &Device, queue: &Queue, data: &[u8], size: u32) -> bool {
        let expected = size as usize * size as usize * 4;
        if size == 0 || data.len() < expected {
            warn!(
                "Ignoring atlas upload: {} bytes for a {size}×{size} texture",
                data.len()
            );
            return false;
        }

        if size != self.atlas_size {
            debug!("Recreating atlas texture: {0}×{0} → {size}×{size}", self.atlas_size);
            let (texture, bind_group) = create_atlas(device, &self.atlas_bgl, size);
            self.atlas_texture = texture;
            self.atlas_bind_group = bind_group;
            self.atlas_size = size;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.atlas_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data[..expected],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size * 4),
                rows_per_image: Some(size),
            },
            Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
        true
    }

    // ───────────────────── Draw ───────────────────────────────────

    /// Record draw commands into the render pass: one instanced draw.
    pub fn draw<'a>(&'a self, pass: &mut RenderPass<'a>) {
        if self.instance_count == 0 {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(1, &self.atlas_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), IndexFormat::Uint16);
        pass.draw_indexed(0..6, 0, 0..self.instance_count);
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn atlas_size(&self) -> u32 {
        self.atlas_size
    }
}

/// Atlas texture plus the bind group that samples it.
///
/// Nearest filtering: glyph rects border background-filled texels.
fn create_atlas(device: &Device, layout: &BindGroupLayout, size: u32) -> (Texture, BindGroup) {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("glyph_atlas"),
        size: Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: ATLAS_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("glyph_atlas_sampler"),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        mag_filter: FilterMode::Nearest,
        min_filter: FilterMode::Nearest,
        ..Default::default()
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("glyph_atlas_bg"),
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(&view),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::Sampler(&sampler),
            },
        ],
    });

    (texture, bind_group)
}
