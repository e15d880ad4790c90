use bytemuck::{Pod, Zeroable};
use std::mem;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    /// Texture slot sampled by the fragment shader, stored as a float so the
    /// whole record stays a flat run of `f32`s.
    pub texture_index: f32,
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4,
        2 => Float32x2,
        3 => Float32
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[inline]
pub fn v(pos: [f32; 3], color: [f32; 4], uv: [f32; 2], texture_index: f32) -> Vertex {
    Vertex {
        pos,
        color,
        uv,
        texture_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn vertex_stride_matches_struct_size() {
        assert_eq!(
            Vertex::layout().array_stride,
            std::mem::size_of::<Vertex>() as wgpu::BufferAddress
        );
    }

    #[test]
    fn vertex_is_ten_floats() {
        // 3 position + 4 color + 2 uv + 1 texture index
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
    }

    #[test]
    fn attribute_offsets_follow_field_order() {
        let offsets: Vec<_> = Vertex::ATTRS.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 28, 36]);
    }
}
