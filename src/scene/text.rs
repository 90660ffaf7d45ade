use glam::{Vec2, Vec4};

use crate::asset::{FontAsset, Handle};
use crate::scene::{SpriteRenderer, Transform};

/// Component that draws a line-broken string with a bitmap font.
///
/// The entity's position is the top-left corner of the first line; lines
/// run downwards. Every visible glyph becomes one sprite quad at the
/// renderer's z-index, so text batches alongside ordinary sprites.
#[derive(Debug, Clone, PartialEq)]
pub struct FontRenderer {
    pub font: Option<Handle<FontAsset>>,
    pub text: String,
    pub color: Vec4,
    pub z_index: i32,
    /// Line height in world units.
    pub font_size: f32,
}

impl FontRenderer {
    pub const DEFAULT_FONT_SIZE: f32 = 32.0;

    pub fn new(font: Handle<FontAsset>, text: impl Into<String>) -> Self {
        Self {
            font: Some(font),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Lays the text out as one sprite per glyph. Whitespace and characters
    /// missing from `font` take up a cell but produce no quad.
    pub fn glyphs(&self, transform: &Transform, font: &FontAsset) -> Vec<(Transform, SpriteRenderer)> {
        let cell = font.glyph_size();
        if cell.y <= 0.0 {
            return Vec::new();
        }
        let cell = cell * (self.font_size / cell.y);

        let mut glyphs = Vec::with_capacity(self.text.len());
        let mut pen = Vec2::ZERO;
        for c in self.text.chars() {
            if c == '\n' {
                pen = Vec2::new(0.0, pen.y - cell.y);
                continue;
            }

            if let Some(mut sprite) = font.glyph(c).filter(|_| !c.is_whitespace()) {
                sprite.size = cell;
                let center = pen + Vec2::new(cell.x, -cell.y) * 0.5;
                let renderer = SpriteRenderer::new(self.color)
                    .with_sprite(sprite)
                    .with_z_index(self.z_index);
                glyphs.push((transform.mul_transform(&Transform::from_position(center)), renderer));
            }
            pen.x += cell.x;
        }
        glyphs
    }
}

impl Default for FontRenderer {
    fn default() -> Self {
        Self {
            font: None,
            text: String::new(),
            color: Vec4::ONE,
            z_index: 0,
            font_size: Self::DEFAULT_FONT_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontAsset {
        // ' ' through 'Z', 4x8 texel cells in one row
        FontAsset::new("tiny", Handle::new(1), Vec2::new(59.0 * 4.0, 8.0), Vec2::new(4.0, 8.0), ' ', 59)
    }

    #[test]
    fn glyphs_advance_per_cell_and_skip_spaces() {
        let text = FontRenderer::new(Handle::new(0), "AB C").with_font_size(16.0).with_z_index(4);

        let glyphs = text.glyphs(&Transform::from_position(Vec2::new(100.0, 50.0)), &font());

        assert_eq!(glyphs.len(), 3);
        let centers: Vec<Vec2> = glyphs.iter().map(|(t, _)| t.position).collect();
        assert_eq!(
            centers,
            vec![Vec2::new(104.0, 42.0), Vec2::new(112.0, 42.0), Vec2::new(128.0, 42.0)]
        );
        for (_, spr) in &glyphs {
            assert_eq!(spr.z_index, 4);
            assert_eq!(spr.sprite.size, Vec2::new(8.0, 16.0));
            assert_eq!(spr.texture(), Some(Handle::new(1)));
        }
    }

    #[test]
    fn newline_starts_a_lower_line_and_unknown_chars_leave_a_gap() {
        let text = FontRenderer::new(Handle::new(0), "A\na~B").with_font_size(8.0);

        let glyphs = text.glyphs(&Transform::IDENTITY, &font());

        let centers: Vec<Vec2> = glyphs.iter().map(|(t, _)| t.position).collect();
        assert_eq!(centers, vec![Vec2::new(2.0, -4.0), Vec2::new(10.0, -12.0)]);
    }
}
