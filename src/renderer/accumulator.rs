// renderer/accumulator.rs
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use crate::asset::Mesh;
use crate::renderer::arena::BufferArena;
use crate::renderer::backend::{BatchBackend, PreparedFrame};
use crate::renderer::command::{to_indirect_args, DrawCommand};
use crate::renderer::error::BatchError;
use crate::renderer::texture_slots::{TextureId, TextureSlots};

pub const DEFAULT_MAX_DRAW_COMMANDS: usize = 64;

/// Outcome of one [`BatchAccumulator::submit`] attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Every remaining vertex and index of the mesh was written.
    Complete,
    /// Only part of the mesh fit. The same mesh must be submitted again after
    /// the batch is flushed.
    Split,
    /// The mesh is larger than an empty arena; nothing was written.
    Rejected,
}

/// Identity of a caller-owned mesh, used to check that a split is resumed
/// with the mesh it started with.
///
/// Storage addresses alone are not enough: a freed mesh's allocation can be
/// reused by a different mesh of the same shape. The key also carries a hash
/// of the mesh contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MeshKey {
    vertices: usize,
    vertex_count: usize,
    indices: usize,
    index_count: usize,
    content: u64,
}

impl MeshKey {
    fn of(mesh: &Mesh) -> Self {
        Self {
            vertices: mesh.vertices().as_ptr() as usize,
            vertex_count: mesh.vertex_count(),
            indices: mesh.indices().as_ptr() as usize,
            index_count: mesh.index_count(),
            content: content_hash(mesh),
        }
    }

    fn same_storage(&self, mesh: &Mesh) -> bool {
        self.vertices == mesh.vertices().as_ptr() as usize
            && self.vertex_count == mesh.vertex_count()
            && self.indices == mesh.indices().as_ptr() as usize
            && self.index_count == mesh.index_count()
    }

    fn matches(&self, mesh: &Mesh) -> bool {
        self.same_storage(mesh) && self.content == content_hash(mesh)
    }
}

fn content_hash(mesh: &Mesh) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write(bytemuck::cast_slice(mesh.vertices()));
    hasher.write(bytemuck::cast_slice(mesh.indices()));
    hasher.finish()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SplitState {
    Clean,
    PendingSplit { mesh: MeshKey, vs: usize, is: usize },
}

/// Per-frame counters, reset by [`BatchAccumulator::begin_frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Batches closed with `next_command`.
    pub batches: u32,
    /// Multi-draw-indirect calls handed to the backend.
    pub draw_calls: u32,
    pub vertices: u64,
    pub indices: u64,
    /// Meshes that had to be split across a flush.
    pub splits: u32,
    pub dropped_meshes: u32,
    /// Indices of split meshes that refer to a vertex living in a different
    /// batch than the index itself.
    pub straddling_indices: u64,
}

/// Packs meshes into a [`BufferArena`] and turns each closed batch into a
/// [`DrawCommand`].
pub struct BatchAccumulator {
    arena: BufferArena,
    split: SplitState,
    batch_vertices: u32,
    batch_indices: u32,
    draw_count: u32,
    vertex_base: u32,
    arena_vertex_base: u32,
    commands: Vec<DrawCommand>,
    max_draw_commands: usize,
    textures: TextureSlots,
    stats: BatchStats,
}

impl BatchAccumulator {
    /// Zero limits are raised to 1.
    pub fn new(max_vertex_count: usize, max_index_count: usize, max_draw_commands: usize) -> Self {
        if max_vertex_count == 0 || max_index_count == 0 || max_draw_commands == 0 {
            log::warn!(
                "batch limits {}/{}/{} contain zero, raising to 1",
                max_vertex_count,
                max_index_count,
                max_draw_commands
            );
        }
        let max_vertex_count = max_vertex_count.max(1);
        let max_index_count = max_index_count.max(1);
        let max_draw_commands = max_draw_commands.max(1);

        Self {
            arena: BufferArena::new(max_vertex_count, max_index_count),
            split: SplitState::Clean,
            batch_vertices: 0,
            batch_indices: 0,
            draw_count: 0,
            vertex_base: 0,
            arena_vertex_base: 0,
            commands: Vec::with_capacity(max_draw_commands),
            max_draw_commands,
            textures: TextureSlots::new(),
            stats: BatchStats::default(),
        }
    }

    /// Opens a fresh batch: rewinds the arena and clears the batch counters,
    /// the command table and the texture table.
    ///
    /// A pending split survives so the mesh can be resumed after a flush.
    pub fn setup(&mut self) {
        self.arena.reset();
        self.batch_vertices = 0;
        self.batch_indices = 0;
        self.draw_count = 0;
        self.commands.clear();
        self.textures.clear();
        self.arena_vertex_base = self.vertex_base;
    }

    /// Starts a new frame. Unlike [`setup`](Self::setup) this also restarts the
    /// running vertex base, forgets any pending split and zeroes the stats.
    pub fn begin_frame(&mut self) {
        self.split = SplitState::Clean;
        self.vertex_base = 0;
        self.stats = BatchStats::default();
        self.setup();
    }

    pub fn submit(&mut self, mesh: &Mesh) -> Result<Admission, BatchError> {
        let (vs, is, key) = match self.split {
            SplitState::Clean => (0, 0, None),
            SplitState::PendingSplit { mesh: key, vs, is } if key.matches(mesh) => {
                (vs, is, Some(key))
            }
            SplitState::PendingSplit { .. } => return Err(BatchError::SplitMismatch),
        };

        if mesh.vertex_count() > self.arena.vertex_capacity()
            || mesh.index_count() > self.arena.index_capacity()
        {
            return Ok(Admission::Rejected);
        }

        let remaining_v = mesh.vertex_count() - vs;
        let remaining_i = mesh.index_count() - is;
        let fits = remaining_v <= self.arena.remaining_vertices()
            && remaining_i <= self.arena.remaining_indices();

        let write_v = remaining_v.min(self.arena.remaining_vertices());
        let write_i = remaining_i.min(self.arena.remaining_indices());
        self.write(mesh, vs, write_v, is, write_i);

        if fits {
            self.split = SplitState::Clean;
            return Ok(Admission::Complete);
        }

        // A mesh that got nothing written is simply deferred, not split.
        if self.split == SplitState::Clean && (write_v > 0 || write_i > 0) {
            self.stats.splits += 1;
        }
        self.split = SplitState::PendingSplit {
            mesh: key.unwrap_or_else(|| MeshKey::of(mesh)),
            vs: vs + write_v,
            is: is + write_i,
        };
        log::debug!(
            "mesh split at {}/{} vertices, {}/{} indices",
            vs + write_v,
            mesh.vertex_count(),
            is + write_i,
            mesh.index_count()
        );
        Ok(Admission::Split)
    }

    /// Writes `mesh.vertices[vs..vs + write_v]` and `mesh.indices[is..is + write_i]`.
    ///
    /// Indices are stored relative to the start of the current batch so several
    /// meshes can share one draw command.
    fn write(&mut self, mesh: &Mesh, vs: usize, write_v: usize, is: usize, write_i: usize) {
        // Batch position of the mesh's vertex 0. Negative when the head of a
        // split mesh went out with the previous batch.
        let origin = i64::from(self.batch_vertices) - vs as i64;

        for vertex in &mesh.vertices()[vs..vs + write_v] {
            self.arena.push_vertex(*vertex);
        }
        self.batch_vertices += write_v as u32;

        let batch_end = i64::from(self.batch_vertices);
        let mut straddling = 0u64;
        for &index in &mesh.indices()[is..is + write_i] {
            let rebased = origin + i64::from(index);
            if !(0..batch_end).contains(&rebased) {
                straddling += 1;
            }
            // Straddling indices are pinned inside the batch so the GPU never
            // fetches past the uploaded vertices.
            self.arena.push_index(rebased.min(batch_end - 1).max(0) as u32);
        }
        self.batch_indices += write_i as u32;

        if straddling > 0 {
            log::warn!(
                "{} indices of a split mesh reference vertices outside their batch",
                straddling
            );
            self.stats.straddling_indices += straddling;
        }
        self.stats.vertices += write_v as u64;
        self.stats.indices += write_i as u64;
    }

    /// Forgets a pending split without writing anything. Data already written
    /// for the mesh stays in the arena.
    pub fn abandon_split(&mut self) {
        self.split = SplitState::Clean;
    }

    /// Records the current batch in the command table at position `draw_count`.
    pub fn make_command(&mut self) -> Result<(), BatchError> {
        let slot = self.draw_count as usize;
        if slot >= self.max_draw_commands {
            return Err(BatchError::CommandTableFull {
                capacity: self.max_draw_commands,
            });
        }

        self.commands.truncate(slot);
        self.commands.push(DrawCommand {
            vertex_count: self.batch_vertices,
            index_count: self.batch_indices,
            instance_count: 1,
            first_index: 0,
            base_vertex: self.vertex_base,
            base_instance: self.draw_count,
        });
        Ok(())
    }

    /// Closes the current batch and starts counting the next one.
    pub fn next_command(&mut self) {
        self.draw_count += 1;
        self.vertex_base += self.batch_vertices;
        self.batch_vertices = 0;
        self.batch_indices = 0;
        self.stats.batches += 1;
    }

    /// Hands every recorded command and the written part of the arena to
    /// `backend` as a single multi-draw.
    pub fn render<B: BatchBackend + ?Sized>(&mut self, backend: &mut B) {
        let args = to_indirect_args(&self.commands, self.arena_vertex_base);
        if args.is_empty() {
            return;
        }

        let frame = PreparedFrame {
            vertices: self.arena.vertices(),
            indices: self.arena.indices(),
            commands: &args,
            textures: self.textures.active(),
        };
        backend.draw(&frame);
        self.stats.draw_calls += 1;
    }

    pub fn texture_slot(&mut self, texture: TextureId) -> Option<u32> {
        self.textures.slot_for(texture)
    }

    /// Reinstalls a texture table saved before [`setup`](Self::setup), so slot
    /// indices already baked into vertices stay valid in the new batch.
    pub fn restore_textures(&mut self, textures: TextureSlots) {
        self.textures = textures;
    }

    pub fn record_dropped_mesh(&mut self) {
        self.stats.dropped_meshes += 1;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    pub fn vertex_base(&self) -> u32 {
        self.vertex_base
    }

    pub fn batch_vertex_count(&self) -> u32 {
        self.batch_vertices
    }

    pub fn batch_index_count(&self) -> u32 {
        self.batch_indices
    }

    pub fn has_pending_geometry(&self) -> bool {
        self.batch_vertices > 0 || self.batch_indices > 0
    }

    pub fn is_split_pending(&self) -> bool {
        matches!(self.split, SplitState::PendingSplit { .. })
    }

    /// `(vs, is)` already written for the mesh being split.
    pub fn split_progress(&self) -> Option<(usize, usize)> {
        match self.split {
            SplitState::Clean => None,
            SplitState::PendingSplit { vs, is, .. } => Some((vs, is)),
        }
    }

    pub fn textures(&self) -> &TextureSlots {
        &self.textures
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn arena(&self) -> &BufferArena {
        &self.arena
    }

    pub fn max_draw_commands(&self) -> usize {
        self.max_draw_commands
    }
}
