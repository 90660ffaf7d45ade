use crate::asset::{Handle, TextureAsset};

/// Texture units available to a single sprite draw call.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Sampler unit for each slot, uploaded as the `uTextures` uniform.
pub const SAMPLER_UNITS: [i32; MAX_TEXTURE_SLOTS] =
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// Textures resident in one batch's draw call.
///
/// Slots are 1-based as seen by the shader: slot `0` means "no texture", slot
/// `n` samples the n-th entry of the table.
#[derive(Debug, Clone)]
pub struct TextureSlots {
    entries: [Option<Handle<TextureAsset>>; MAX_TEXTURE_SLOTS],
    len: usize,
    limit: usize,
}

impl TextureSlots {
    pub fn new(limit: usize) -> Self {
        if limit > MAX_TEXTURE_SLOTS {
            log::warn!(
                "Texture slot limit {} exceeds {}; clamping",
                limit,
                MAX_TEXTURE_SLOTS
            );
        }
        Self {
            entries: [None; MAX_TEXTURE_SLOTS],
            len: 0,
            limit: limit.clamp(1, MAX_TEXTURE_SLOTS),
        }
    }

    pub fn contains(&self, texture: Handle<TextureAsset>) -> bool {
        self.slot_of(texture).is_some()
    }

    pub fn has_room(&self) -> bool {
        self.len < self.limit
    }

    /// 1-based slot of `texture`, if it is resident.
    pub fn slot_of(&self, texture: Handle<TextureAsset>) -> Option<u32> {
        self.entries[..self.len]
            .iter()
            .position(|entry| *entry == Some(texture))
            .map(|index| index as u32 + 1)
    }

    /// Returns the slot holding `texture`, claiming the next free one if it
    /// is not resident yet. `None` when the table is full.
    pub fn insert(&mut self, texture: Handle<TextureAsset>) -> Option<u32> {
        if let Some(slot) = self.slot_of(texture) {
            return Some(slot);
        }
        if !self.has_room() {
            return None;
        }
        self.entries[self.len] = Some(texture);
        self.len += 1;
        Some(self.len as u32)
    }

    pub fn clear(&mut self) {
        self.entries = [None; MAX_TEXTURE_SLOTS];
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Resident textures in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Handle<TextureAsset>> + '_ {
        self.entries[..self.len].iter().flatten().copied()
    }
}

impl Default for TextureSlots {
    fn default() -> Self {
        Self::new(MAX_TEXTURE_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_one_based_and_deduplicated() {
        let mut slots = TextureSlots::default();
        assert_eq!(slots.insert(Handle::new(7)), Some(1));
        assert_eq!(slots.insert(Handle::new(3)), Some(2));
        assert_eq!(slots.insert(Handle::new(7)), Some(1));
        assert_eq!(slots.len(), 2);
        assert_eq!(
            slots.iter().collect::<Vec<_>>(),
            vec![Handle::new(7), Handle::new(3)]
        );
    }

    #[test]
    fn full_table_rejects_new_textures_but_keeps_known_ones() {
        let mut slots = TextureSlots::new(2);
        slots.insert(Handle::new(0));
        slots.insert(Handle::new(1));

        assert!(!slots.has_room());
        assert_eq!(slots.insert(Handle::new(2)), None);
        assert_eq!(slots.insert(Handle::new(1)), Some(2));
    }

    #[test]
    fn clear_frees_every_slot() {
        let mut slots = TextureSlots::default();
        for id in 0..MAX_TEXTURE_SLOTS as u32 {
            slots.insert(Handle::new(id));
        }
        assert!(!slots.has_room());

        slots.clear();
        assert!(slots.is_empty());
        assert!(!slots.contains(Handle::new(0)));
        assert_eq!(slots.insert(Handle::new(42)), Some(1));
    }

    #[test]
    fn limit_is_clamped_to_hardware_units() {
        assert_eq!(TextureSlots::new(64).limit(), MAX_TEXTURE_SLOTS);
        assert_eq!(TextureSlots::new(0).limit(), 1);
    }
}
