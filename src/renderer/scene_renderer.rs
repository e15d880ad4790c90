// renderer/scene_renderer.rs
use glam::Mat4;

use crate::asset::Mesh;
use crate::renderer::accumulator::{Admission, BatchAccumulator, BatchStats};
use crate::renderer::backend::BatchBackend;
use crate::renderer::error::{RenderError, Sequencing};
use crate::renderer::texture_slots::TextureId;
use crate::scene::SceneCamera;
use crate::settings::BatchLimits;

#[derive(Clone, Copy, Debug, PartialEq)]
enum SceneState {
    Idle,
    Accumulating { view_proj: Mat4 },
}

/// `begin_scene` / `submit` / `end_scene` front end over a [`BatchAccumulator`].
///
/// Submissions that do not fit the current batch flush it and retry once in a
/// fresh one, so callers never see a split.
pub struct SceneRenderer<B: BatchBackend> {
    accumulator: BatchAccumulator,
    backend: B,
    state: SceneState,
}

impl<B: BatchBackend> SceneRenderer<B> {
    pub fn new(backend: B, limits: BatchLimits) -> Self {
        Self {
            accumulator: BatchAccumulator::new(
                limits.max_vertex_count,
                limits.max_index_count,
                limits.max_draw_commands,
            ),
            backend,
            state: SceneState::Idle,
        }
    }

    pub fn begin_scene(&mut self, camera: &impl SceneCamera) -> Result<(), RenderError> {
        if self.is_accumulating() {
            return Err(self.violation(Sequencing::BeginWhileAccumulating));
        }

        let view_proj = camera.projection() * camera.view();
        self.state = SceneState::Accumulating { view_proj };
        self.accumulator.begin_frame();
        Ok(())
    }

    pub fn submit(&mut self, mesh: &Mesh) -> Result<(), RenderError> {
        let SceneState::Accumulating { view_proj } = self.state else {
            return Err(self.violation(Sequencing::SubmitOutsideScene));
        };

        if self.accumulator.submit(mesh)? == Admission::Complete {
            return Ok(());
        }

        // Keep the sampler slots the mesh's vertices already point at.
        let bound = self.accumulator.textures().clone();
        if let Err(err) = self.flush(view_proj) {
            self.accumulator.abandon_split();
            self.accumulator.record_dropped_mesh();
            log::error!("Flush failed, dropping mesh: {}", err);
            return Err(err);
        }
        self.accumulator.setup();
        self.accumulator.restore_textures(bound);

        if self.accumulator.submit(mesh)? == Admission::Complete {
            return Ok(());
        }

        self.accumulator.abandon_split();
        self.accumulator.record_dropped_mesh();
        let arena = self.accumulator.arena();
        let err = RenderError::CapacityExceeded {
            vertices: mesh.vertex_count(),
            indices: mesh.index_count(),
            max_vertices: arena.vertex_capacity(),
            max_indices: arena.index_capacity(),
        };
        log::error!("Mesh submitted to renderer is too large: {}", err);
        Err(err)
    }

    pub fn end_scene(&mut self) -> Result<(), RenderError> {
        let SceneState::Accumulating { view_proj } = self.state else {
            return Err(self.violation(Sequencing::EndOutsideScene));
        };

        self.state = SceneState::Idle;
        self.flush(view_proj)
    }

    /// Sampler slot for `texture` in the current batch. A full table flushes
    /// the batch and retries in a fresh one.
    pub fn texture_slot(&mut self, texture: TextureId) -> Result<u32, RenderError> {
        let SceneState::Accumulating { view_proj } = self.state else {
            return Err(self.violation(Sequencing::TextureOutsideScene));
        };

        if let Some(slot) = self.accumulator.texture_slot(texture) {
            return Ok(slot);
        }

        log::debug!("texture slots full, flushing batch");
        self.flush(view_proj)?;
        self.accumulator.setup();
        self.accumulator
            .texture_slot(texture)
            .ok_or(RenderError::TextureSlotsExhausted)
    }

    /// Closes the current batch (if it holds anything), uploads the frame
    /// uniform and renders.
    fn flush(&mut self, view_proj: Mat4) -> Result<(), RenderError> {
        if self.accumulator.has_pending_geometry() {
            self.accumulator.make_command()?;
            self.accumulator.next_command();
        }
        self.backend.upload_view_projection(view_proj);
        self.accumulator.render(&mut self.backend);
        log::trace!(
            "flushed batch {} ({} vertices so far)",
            self.accumulator.stats().batches,
            self.accumulator.vertex_base()
        );
        Ok(())
    }

    fn violation(&self, what: Sequencing) -> RenderError {
        log::error!("{}", what);
        RenderError::SequencingViolation(what)
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, SceneState::Accumulating { .. })
    }

    /// View-projection cached by the active scene.
    pub fn view_proj(&self) -> Option<Mat4> {
        match self.state {
            SceneState::Accumulating { view_proj } => Some(view_proj),
            SceneState::Idle => None,
        }
    }

    pub fn stats(&self) -> BatchStats {
        self.accumulator.stats()
    }

    pub fn accumulator(&self) -> &BatchAccumulator {
        &self.accumulator
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::HeadlessBackend;
    use crate::renderer::error::BatchError;
    use crate::renderer::vertex::v;
    use crate::scene::Camera;

    fn limits(v: usize, i: usize) -> BatchLimits {
        BatchLimits {
            max_vertex_count: v,
            max_index_count: i,
            max_draw_commands: 8,
        }
    }

    fn quad() -> Mesh {
        Mesh::new(
            (0..4)
                .map(|i| v([i as f32, 0.0, 0.0], [1.0; 4], [0.0, 0.0], 0.0))
                .collect(),
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn begin_scene_caches_projection_times_view() {
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits(16, 16));
        let camera = Camera::default();
        renderer.begin_scene(&camera).unwrap();

        let expected = camera.projection() * camera.view();
        assert!(renderer.view_proj().unwrap().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn sequencing_violations_are_reported_and_ignored() {
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits(16, 16));
        let camera = Camera::default();

        assert_eq!(
            renderer.submit(&quad()),
            Err(RenderError::SequencingViolation(Sequencing::SubmitOutsideScene))
        );
        assert_eq!(
            renderer.end_scene(),
            Err(RenderError::SequencingViolation(Sequencing::EndOutsideScene))
        );

        renderer.begin_scene(&camera).unwrap();
        renderer.submit(&quad()).unwrap();
        assert_eq!(
            renderer.begin_scene(&camera),
            Err(RenderError::SequencingViolation(
                Sequencing::BeginWhileAccumulating
            ))
        );
        // The rejected begin_scene must not have reset the batch.
        assert_eq!(renderer.accumulator().batch_vertex_count(), 4);
        assert!(renderer.backend().draws().is_empty());
    }

    #[test]
    fn end_scene_returns_to_idle_and_draws_once() {
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits(16, 16));
        renderer.begin_scene(&Camera::default()).unwrap();
        renderer.submit(&quad()).unwrap();
        renderer.submit(&quad()).unwrap();
        renderer.end_scene().unwrap();

        assert!(!renderer.is_accumulating());
        assert_eq!(renderer.backend().draw_call_count(), 1);
        assert_eq!(renderer.stats().batches, 1);
    }

    #[test]
    fn zero_command_table_still_splits_and_resumes() {
        let limits = BatchLimits {
            max_vertex_count: 4,
            max_index_count: 6,
            max_draw_commands: 0,
        };
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits);
        renderer.begin_scene(&Camera::default()).unwrap();

        let first = Mesh::new(quad().vertices()[..3].to_vec(), vec![0, 1, 2]);
        let second = first.clone().with_color([0.5; 4]);
        renderer.submit(&first).unwrap();
        renderer.submit(&second).unwrap();
        assert!(!renderer.accumulator().is_split_pending());
        renderer.submit(&quad()).unwrap();
        renderer.end_scene().unwrap();

        assert_eq!(renderer.stats().dropped_meshes, 0);
        assert_eq!(renderer.stats().vertices, 10);
    }

    #[test]
    fn failed_flush_abandons_the_split() {
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits(4, 6));
        renderer.begin_scene(&Camera::default()).unwrap();
        let small = Mesh::new(quad().vertices()[..3].to_vec(), vec![0, 1, 2]);
        renderer.submit(&small).unwrap();
        // Fill the command table behind the renderer's back.
        for _ in 0..8 {
            renderer.accumulator.make_command().unwrap();
            renderer.accumulator.next_command();
        }

        let err = renderer.submit(&small.clone()).unwrap_err();

        assert!(matches!(
            err,
            RenderError::Batch(BatchError::CommandTableFull { capacity: 8 })
        ));
        assert!(!renderer.accumulator().is_split_pending());
        assert_eq!(renderer.stats().dropped_meshes, 1);
        assert_eq!(renderer.submit(&Mesh::default()), Ok(()));
    }

    #[test]
    fn split_retry_keeps_texture_slots() {
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits(6, 12));
        renderer.begin_scene(&Camera::default()).unwrap();
        let slot = renderer.texture_slot(TextureId::new(5)).unwrap();
        renderer.submit(&quad().with_texture_slot(slot)).unwrap();
        renderer.submit(&quad().with_texture_slot(slot)).unwrap();
        renderer.end_scene().unwrap();

        let draws = renderer.backend().draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[1].textures, vec![Some(TextureId::new(5))]);
    }

    #[test]
    fn full_texture_table_flushes_and_restarts() {
        use crate::renderer::texture_slots::MAX_TEXTURE_SLOTS;

        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), limits(64, 64));
        renderer.begin_scene(&Camera::default()).unwrap();
        for i in 0..MAX_TEXTURE_SLOTS {
            renderer.texture_slot(TextureId::new(i)).unwrap();
        }
        renderer.submit(&quad()).unwrap();

        let slot = renderer.texture_slot(TextureId::new(100)).unwrap();

        assert_eq!(slot, 0);
        assert_eq!(renderer.backend().draw_call_count(), 1);
        assert_eq!(
            renderer.backend().draws()[0].textures.len(),
            MAX_TEXTURE_SLOTS
        );
    }
}
