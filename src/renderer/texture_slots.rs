use crate::asset::Handle;
use crate::renderer::Texture;

/// Number of sampler slots the batch shader exposes.
///
/// Kept at the wgpu default for `max_sampled_textures_per_shader_stage` so the
/// pipeline works without extra device limits.
pub const MAX_TEXTURE_SLOTS: usize = 16;

pub type TextureId = Handle<Texture>;

/// Fixed table mapping sampler slots to textures for the current batch.
#[derive(Clone, Debug)]
pub struct TextureSlots {
    slots: [Option<TextureId>; MAX_TEXTURE_SLOTS],
    len: usize,
}

impl TextureSlots {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_TEXTURE_SLOTS],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.slots = [None; MAX_TEXTURE_SLOTS];
        self.len = 0;
    }

    /// Returns the slot holding `texture`, claiming the next free slot if it is
    /// not bound yet. `None` once every slot is taken by other textures.
    pub fn slot_for(&mut self, texture: TextureId) -> Option<u32> {
        if let Some(slot) = self.position(texture) {
            return Some(slot);
        }
        if self.len == MAX_TEXTURE_SLOTS {
            return None;
        }
        self.slots[self.len] = Some(texture);
        self.len += 1;
        Some((self.len - 1) as u32)
    }

    pub fn position(&self, texture: TextureId) -> Option<u32> {
        self.active()
            .iter()
            .position(|slot| *slot == Some(texture))
            .map(|i| i as u32)
    }

    /// Slots claimed since the last clear, in slot order.
    pub fn active(&self) -> &[Option<TextureId>] {
        &self.slots[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == MAX_TEXTURE_SLOTS
    }
}

impl Default for TextureSlots {
    fn default() -> Self {
        Self::new()
    }
}
