use glam::Vec2;

use super::{Handle, TextureAsset};
use crate::scene::{Sprite, Spritesheet};

/// Monospaced bitmap font: a texture cut into equal glyph cells, one per
/// character in the contiguous range starting at `first`.
#[derive(Debug, Clone)]
pub struct FontAsset {
    pub label: String,
    glyphs: Spritesheet,
    glyph_size: Vec2,
    first: char,
}

impl FontAsset {
    pub fn new(
        label: impl Into<String>,
        texture: Handle<TextureAsset>,
        texture_size: Vec2,
        glyph_size: Vec2,
        first: char,
        count: usize,
    ) -> Self {
        let glyphs = Spritesheet::new(texture, texture_size, glyph_size.x, glyph_size.y, count, 0.0);
        Self {
            label: label.into(),
            glyphs,
            glyph_size,
            first,
        }
    }

    pub fn texture(&self) -> Handle<TextureAsset> {
        self.glyphs.texture()
    }

    /// Size of one glyph cell in texels.
    pub fn glyph_size(&self) -> Vec2 {
        self.glyph_size
    }

    /// The glyph for `c`, or `None` when the font has no cell for it.
    pub fn glyph(&self, c: char) -> Option<Sprite> {
        let index = (c as u32).checked_sub(self.first as u32)?;
        self.glyphs.sprite(index as usize)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}
