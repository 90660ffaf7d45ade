use glam::{Vec2, Vec4};

use crate::asset::{Handle, TextureAsset};

/// Sub-rectangle of a texture in normalised coordinates, `min` at the
/// top-left texel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvRect {
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// A rectangular visual: an optional texture, the region of it to show and
/// the quad's size in world units. `texture == None` draws a flat quad in the
/// renderer's tint colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub texture: Option<Handle<TextureAsset>>,
    pub uv: UvRect,
    pub size: Vec2,
}

impl Sprite {
    pub const DEFAULT_SIZE: Vec2 = Vec2::splat(32.0);

    pub fn untextured(size: Vec2) -> Self {
        Self {
            texture: None,
            uv: UvRect::FULL,
            size,
        }
    }

    pub fn textured(texture: Handle<TextureAsset>, size: Vec2) -> Self {
        Self {
            texture: Some(texture),
            uv: UvRect::FULL,
            size,
        }
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::untextured(Self::DEFAULT_SIZE)
    }
}

/// Component that makes an entity visible to the sprite renderer.
///
/// Draw order follows `z_index`: higher values are drawn later and therefore
/// end up on top of lower ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteRenderer {
    pub color: Vec4,
    pub z_index: i32,
    pub sprite: Sprite,
}

impl SpriteRenderer {
    pub fn new(color: Vec4) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = sprite;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn texture(&self) -> Option<Handle<TextureAsset>> {
        self.sprite.texture
    }
}

impl Default for SpriteRenderer {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            z_index: 0,
            sprite: Sprite::default(),
        }
    }
}

/// Cuts a texture into equally sized sprites laid out left to right, top to
/// bottom, with `spacing` pixels between cells.
#[derive(Debug, Clone)]
pub struct Spritesheet {
    texture: Handle<TextureAsset>,
    sprites: Vec<Sprite>,
}

impl Spritesheet {
    pub fn new(
        texture: Handle<TextureAsset>,
        texture_size: Vec2,
        sprite_width: f32,
        sprite_height: f32,
        count: usize,
        spacing: f32,
    ) -> Self {
        let mut sprites = Vec::with_capacity(count);
        let mut x = 0.0;
        let mut y = 0.0;

        for _ in 0..count {
            if x + sprite_width > texture_size.x {
                x = 0.0;
                y += sprite_height + spacing;
            }
            if y + sprite_height > texture_size.y {
                log::warn!(
                    "Spritesheet ran out of rows after {} of {} sprites",
                    sprites.len(),
                    count
                );
                break;
            }

            let min = Vec2::new(x, y) / texture_size;
            let max = Vec2::new(x + sprite_width, y + sprite_height) / texture_size;
            sprites.push(Sprite {
                texture: Some(texture),
                uv: UvRect::new(min, max),
                size: Vec2::new(sprite_width, sprite_height),
            });

            x += sprite_width + spacing;
        }

        Self { texture, sprites }
    }

    pub fn texture(&self) -> Handle<TextureAsset> {
        self.texture
    }

    pub fn sprite(&self, index: usize) -> Option<Sprite> {
        self.sprites.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_renderer_is_white_untextured() {
        let spr = SpriteRenderer::default();
        assert_eq!(spr.color, Vec4::ONE);
        assert_eq!(spr.z_index, 0);
        assert!(spr.texture().is_none());
    }

    #[test]
    fn spritesheet_wraps_rows_and_honours_spacing() {
        let tex = Handle::new(3);
        let sheet = Spritesheet::new(tex, Vec2::new(34.0, 34.0), 16.0, 16.0, 4, 2.0);

        assert_eq!(sheet.len(), 4);
        let second = sheet.sprite(1).unwrap();
        assert!(second.uv.min.abs_diff_eq(Vec2::new(18.0 / 34.0, 0.0), 1e-6));

        let third = sheet.sprite(2).unwrap();
        assert!(third.uv.min.abs_diff_eq(Vec2::new(0.0, 18.0 / 34.0), 1e-6));
        assert!(third.uv.max.abs_diff_eq(Vec2::new(16.0 / 34.0, 1.0), 1e-6));
        assert_eq!(third.texture, Some(tex));
    }

    #[test]
    fn spritesheet_stops_when_texture_is_exhausted() {
        let sheet = Spritesheet::new(Handle::new(0), Vec2::new(16.0, 16.0), 16.0, 16.0, 3, 0.0);
        assert_eq!(sheet.len(), 1);
    }
}
