use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::{offset_of, size_of};

/// One corner of a sprite quad, already in eye space.
///
/// ```text
/// Offset | Field     | Size
/// -------|-----------|---------
/// 0      | position  | 12 bytes (3 x f32)
/// 12     | tint      | 16 bytes (4 x f32)
/// 28     | tex_coord |  8 bytes (2 x f32)
/// Total: 36 bytes
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub tint: [f32; 4],
    /// Normalized, exceeds 1 when a repeating sprite tiles its frame.
    pub tex_coord: [f32; 2],
}

const_assert_eq!(size_of::<SpriteVertex>(), 36);
const_assert_eq!(offset_of!(SpriteVertex, tint), 12);
const_assert_eq!(offset_of!(SpriteVertex, tex_coord), 28);

/// Vertices emitted per sprite: two triangles, no index buffer.
pub const VERTICES_PER_SPRITE: usize = 6;

impl SpriteVertex {
    pub const STRIDE: u64 = size_of::<SpriteVertex>() as u64;

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4,
        2 => Float32x2,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
