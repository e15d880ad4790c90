pub mod accumulator;
pub mod arena;
pub mod backend;
pub mod command;
pub mod context;
pub mod depth;
pub mod error;
pub mod gpu;
pub mod primitives;
pub mod scene_renderer;
pub mod texture;
pub mod texture_slots;
pub mod uniforms;
pub mod vertex;

pub use accumulator::{Admission, BatchAccumulator, BatchStats};
pub use arena::{ArenaBuffers, BufferArena};
pub use backend::{BatchBackend, HeadlessBackend, PreparedFrame, RecordedDraw};
pub use command::{DrawCommand, DrawIndexedIndirectArgs};
pub use context::RenderContext;
pub use depth::Depth;
pub use error::{BatchError, GpuError, RenderError, Sequencing};
pub use gpu::GpuBatchBackend;
pub use scene_renderer::SceneRenderer;
pub use texture::Texture;
pub use texture_slots::{TextureId, TextureSlots, MAX_TEXTURE_SLOTS};
pub use uniforms::FrameUniform;
pub use vertex::Vertex;
