use glam::{Mat4, Vec3};

use crate::renderer::Vertex;

/// CPU-side geometry handed to the batcher.
///
/// Indices are local to this mesh: index `0` refers to `vertices[0]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Bakes `transform` into every vertex position.
    pub fn transform(&mut self, transform: Mat4) {
        for vertex in &mut self.vertices {
            let p = transform.transform_point3(Vec3::from_array(vertex.pos));
            vertex.pos = p.to_array();
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        for vertex in &mut self.vertices {
            vertex.color = color;
        }
        self
    }

    /// Points every vertex at texture slot `slot`.
    pub fn with_texture_slot(mut self, slot: u32) -> Self {
        for vertex in &mut self.vertices {
            vertex.texture_index = slot as f32;
        }
        self
    }
}
