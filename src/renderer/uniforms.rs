// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-scene data in the shared storage buffer at group 0, binding 0.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl FrameUniform {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<Self>() as wgpu::BufferAddress;

    pub fn new() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }

    pub fn from_matrix(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn frame_uniform_is_64_bytes() {
        // mat4x4<f32> = 16 * 4 bytes
        assert_eq!(FrameUniform::SIZE, 64);
    }

    #[test]
    fn matrix_is_stored_column_major() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let u = FrameUniform::from_matrix(m);
        assert_eq!(u.view_proj[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
