// renderer/backend.rs
use glam::Mat4;

use crate::renderer::command::DrawIndexedIndirectArgs;
use crate::renderer::texture_slots::TextureId;
use crate::renderer::Vertex;

/// Everything one `render` call hands to the GPU: the written part of the
/// arena, the indirect arguments for every closed batch, and the textures
/// bound to each sampler slot.
pub struct PreparedFrame<'a> {
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
    pub commands: &'a [DrawIndexedIndirectArgs],
    pub textures: &'a [Option<TextureId>],
}

impl PreparedFrame<'_> {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Where the accumulator sends finished batches.
pub trait BatchBackend {
    /// Writes the frame's view-projection matrix to the shared storage buffer.
    fn upload_view_projection(&mut self, view_proj: Mat4);

    /// Uploads the frame data and issues one multi-draw-indirect covering
    /// `frame.commands`.
    fn draw(&mut self, frame: &PreparedFrame<'_>);
}

/// One `draw` as seen by [`HeadlessBackend`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub commands: Vec<DrawIndexedIndirectArgs>,
    pub textures: Vec<Option<TextureId>>,
    pub view_proj: Mat4,
}

/// Backend that keeps a copy of everything it is asked to draw instead of
/// talking to a GPU.
#[derive(Default)]
pub struct HeadlessBackend {
    view_proj: Mat4,
    draws: Vec<RecordedDraw>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn draw_call_count(&self) -> usize {
        self.draws.len()
    }

    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    pub fn clear(&mut self) {
        self.draws.clear();
    }
}

impl BatchBackend for HeadlessBackend {
    fn upload_view_projection(&mut self, view_proj: Mat4) {
        self.view_proj = view_proj;
    }

    fn draw(&mut self, frame: &PreparedFrame<'_>) {
        if frame.is_empty() {
            return;
        }
        self.draws.push(RecordedDraw {
            vertices: frame.vertices.to_vec(),
            indices: frame.indices.to_vec(),
            commands: frame.commands.to_vec(),
            textures: frame.textures.to_vec(),
            view_proj: self.view_proj,
        });
    }
}
