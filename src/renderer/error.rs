use thiserror::Error;

/// Misuse of the batch accumulator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("a split submission is pending; the same mesh must be submitted again before any other")]
    SplitMismatch,
    #[error("draw command table is full ({capacity} commands)")]
    CommandTableFull { capacity: usize },
}

/// Which scene call was made in the wrong state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequencing {
    BeginWhileAccumulating,
    SubmitOutsideScene,
    EndOutsideScene,
    TextureOutsideScene,
}

impl std::fmt::Display for Sequencing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Sequencing::BeginWhileAccumulating => "begin_scene called while a scene is active",
            Sequencing::SubmitOutsideScene => "submit called outside begin_scene/end_scene",
            Sequencing::EndOutsideScene => "end_scene called without begin_scene",
            Sequencing::TextureOutsideScene => "texture_slot called outside begin_scene/end_scene",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(
        "mesh with {vertices} vertices / {indices} indices does not fit a batch of \
         {max_vertices} vertices / {max_indices} indices"
    )]
    CapacityExceeded {
        vertices: usize,
        indices: usize,
        max_vertices: usize,
        max_indices: usize,
    },
    #[error("sequencing violation: {0}")]
    SequencingViolation(Sequencing),
    #[error("texture table is full even after a flush")]
    TextureSlotsExhausted,
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Fatal failures while bringing up the GPU.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to find a suitable adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
