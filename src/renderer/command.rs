use bytemuck::{Pod, Zeroable};

/// Bookkeeping for one closed batch.
///
/// `base_vertex` counts every vertex of the batches closed before this one in
/// the current frame, so it keeps growing across arena flushes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawCommand {
    pub vertex_count: u32,
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: u32,
    pub base_instance: u32,
}

/// GPU layout of an indexed indirect draw (`draw_indexed_indirect`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<Self>() as wgpu::BufferAddress;
}

/// Converts a frame's closed commands into GPU arguments for the arena as it is
/// currently filled.
///
/// `arena_vertex_base` is the frame-wide vertex base at the moment the arena was
/// last reset; subtracting it turns the running `base_vertex` into an offset
/// into the uploaded vertex buffer. Batches sit back to back in the index buffer,
/// so each command's GPU `first_index` is the sum of the index counts before it.
pub fn to_indirect_args(
    commands: &[DrawCommand],
    arena_vertex_base: u32,
) -> Vec<DrawIndexedIndirectArgs> {
    let mut first_index = 0u32;
    commands
        .iter()
        .map(|cmd| {
            let args = DrawIndexedIndirectArgs {
                index_count: cmd.index_count,
                instance_count: cmd.instance_count,
                first_index: cmd.first_index + first_index,
                base_vertex: (cmd.base_vertex - arena_vertex_base) as i32,
                first_instance: cmd.base_instance,
            };
            first_index += cmd.index_count;
            args
        })
        .collect()
}
