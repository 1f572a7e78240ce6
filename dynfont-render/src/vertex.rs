//! GPU vertex and instance data types for glyph sprites.
//!
//! All types derive `bytemuck::Pod` + `Zeroable` for zero-copy upload
//! to GPU buffers.

use bytemuck::{Pod, Zeroable};
use dynfont_text::GlyphSprite;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

// ───────────────────────────────────────────────────────────────────
// Vertex (unit quad)
// ───────────────────────────────────────────────────────────────────

/// A single vertex of the unit quad (0,0)→(1,1).
///
/// The quad is shared across all glyph instances.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    /// Position in [0, 1] space.
    pub position: [f32; 2],
}

impl QuadVertex {
    pub const VERTICES: [QuadVertex; 4] = [
        QuadVertex { position: [0.0, 0.0] }, // top-left
        QuadVertex { position: [1.0, 0.0] }, // top-right
        QuadVertex { position: [0.0, 1.0] }, // bottom-left
        QuadVertex { position: [1.0, 1.0] }, // bottom-right
    ];

    /// Two triangles covering the unit quad.
    pub const INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x2,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Instance data
// ───────────────────────────────────────────────────────────────────

/// Per-instance data for one glyph quad.
///
/// 64 bytes per instance. The quad is rotated about its top-left
/// corner, which sits at `position`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Screen position of the quad's top-left corner, in pixels.
    pub position: [f32; 2],
    /// Drawn width and height in pixels.
    pub size: [f32; 2],
    /// Atlas UV at the quad's top-left (flips swap min and max).
    pub uv_min: [f32; 2],
    /// Atlas UV at the quad's bottom-right.
    pub uv_max: [f32; 2],
    /// RGBA tint, each channel in [0.0, 1.0].
    pub color: [f32; 4],
    /// Clockwise rotation in radians.
    pub rotation: f32,
    /// Sort depth, written to clip-space z.
    pub depth: f32,
    pub _pad: [f32; 2],
}

impl GlyphInstance {
    pub fn from_sprite(sprite: &GlyphSprite) -> Self {
        let uv = sprite.uv();
        Self {
            position: sprite.position,
            size: sprite.size(),
            uv_min: [uv.u_min, uv.v_min],
            uv_max: [uv.u_max, uv.v_max],
            color: sprite.color,
            rotation: sprite.rotation,
            depth: sprite.depth,
            _pad: [0.0; 2],
        }
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(1) = position
            VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: VertexFormat::Float32x2,
            },
            // location(2) = size
            VertexAttribute {
                offset: 8,
                shader_location: 2,
                format: VertexFormat::Float32x2,
            },
            // location(3) = uv_min
            VertexAttribute {
                offset: 16,
                shader_location: 3,
                format: VertexFormat::Float32x2,
            },
            // location(4) = uv_max
            VertexAttribute {
                offset: 24,
                shader_location: 4,
                format: VertexFormat::Float32x2,
            },
            // location(5) = color
            VertexAttribute {
                offset: 32,
                shader_location: 5,
                format: VertexFormat::Float32x4,
            },
            // location(6) = rotation
            VertexAttribute {
                offset: 48,
                shader_location: 6,
                format: VertexFormat::Float32,
            },
            // location(7) = depth
            VertexAttribute {
                offset: 52,
                shader_location: 7,
                format: VertexFormat::Float32,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphInstance>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Camera uniform
// ───────────────────────────────────────────────────────────────────

/// Camera/viewport uniform sent to the GPU once per frame.
///
/// 64 bytes: fits in a single uniform buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// 4×4 orthographic projection matrix (column-major).
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Orthographic projection for a `width × height` pixel viewport
    /// with pan and zoom. (0,0) is the top-left corner and Y grows
    /// downward.
    pub fn orthographic(width: f32, height: f32, pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        // ndc_x = (world_x - pan_x) * (2 * zoom / width) - 1
        // ndc_y = 1 - (world_y - pan_y) * (2 * zoom / height)
        let sx = 2.0 * zoom / width;
        let sy = -2.0 * zoom / height;
        let tx = -pan_x * sx - 1.0;
        let ty = -pan_y * sy + 1.0;

        Self {
            view_proj: [
                [sx,  0.0, 0.0, 0.0],
                [0.0, sy,  0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [tx,  ty,  0.0, 1.0],
            ],
        }
    }

    /// 1px = 1 unit, no pan, no zoom.
    pub fn identity(width: f32, height: f32) -> Self {
        Self::orthographic(width, height, 0.0, 0.0, 1.0)
    }
}

// ===================================================================
// Tests
// ===================================================================
