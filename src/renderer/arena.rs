// renderer/arena.rs
use std::mem;

use bytemuck::Zeroable;

use crate::renderer::Vertex;

/// Fixed-capacity staging storage for vertices and indices.
///
/// Both sequences are allocated once with their final capacity and never grow.
/// Appends are unchecked: the accumulator is responsible for checking
/// [`remaining_vertices`](Self::remaining_vertices) /
/// [`remaining_indices`](Self::remaining_indices) before writing.
pub struct BufferArena {
    vertices: Box<[Vertex]>,
    indices: Box<[u32]>,
    vertex_len: usize,
    index_len: usize,
}

impl BufferArena {
    pub fn new(max_vertex_count: usize, max_index_count: usize) -> Self {
        Self {
            vertices: vec![Vertex::zeroed(); max_vertex_count].into_boxed_slice(),
            indices: vec![0u32; max_index_count].into_boxed_slice(),
            vertex_len: 0,
            index_len: 0,
        }
    }

    pub fn vertex_layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        Vertex::layout()
    }

    #[inline]
    pub fn push_vertex(&mut self, vertex: Vertex) {
        debug_assert!(self.vertex_len < self.vertices.len(), "vertex arena overflow");
        self.vertices[self.vertex_len] = vertex;
        self.vertex_len += 1;
    }

    #[inline]
    pub fn push_index(&mut self, index: u32) {
        debug_assert!(self.index_len < self.indices.len(), "index arena overflow");
        self.indices[self.index_len] = index;
        self.index_len += 1;
    }

    /// Rewinds both write cursors. Previously written slots are left as-is and
    /// overwritten by later appends.
    pub fn reset(&mut self) {
        self.vertex_len = 0;
        self.index_len = 0;
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_capacity(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_len
    }

    pub fn index_count(&self) -> usize {
        self.index_len
    }

    pub fn remaining_vertices(&self) -> usize {
        self.vertices.len() - self.vertex_len
    }

    pub fn remaining_indices(&self) -> usize {
        self.indices.len() - self.index_len
    }

    /// Written prefix of the vertex storage.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices[..self.vertex_len]
    }

    /// Written prefix of the index storage.
    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.index_len]
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices())
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices())
    }
}

/// GPU half of the arena: vertex and index buffers sized to match the staging
/// capacity byte for byte.
pub struct ArenaBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
}

impl ArenaBuffers {
    pub fn new(device: &wgpu::Device, max_vertex_count: usize, max_index_count: usize) -> Self {
        let vertex = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ArenaVertexBuffer"),
            size: Self::vertex_buffer_size(max_vertex_count),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ArenaIndexBuffer"),
            size: Self::index_buffer_size(max_index_count),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self { vertex, index }
    }

    pub fn vertex_buffer_size(max_vertex_count: usize) -> wgpu::BufferAddress {
        (max_vertex_count.max(1) * mem::size_of::<Vertex>()) as wgpu::BufferAddress
    }

    pub fn index_buffer_size(max_index_count: usize) -> wgpu::BufferAddress {
        (max_index_count.max(1) * mem::size_of::<u32>()) as wgpu::BufferAddress
    }

    /// Writes the written prefixes of `vertices` and `indices` to the start of
    /// the GPU buffers.
    pub fn upload(&self, queue: &wgpu::Queue, vertices: &[u8], indices: &[u8]) {
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex, 0, vertices);
        }
        if !indices.is_empty() {
            queue.write_buffer(&self.index, 0, indices);
        }
    }
}
