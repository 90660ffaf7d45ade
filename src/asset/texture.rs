use std::path::Path;

use crate::error::TextureError;

/// CPU copy of a texture. The renderer uploads it on first use; the asset
/// itself never touches the GPU.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureAsset {
    pub fn from_rgba8(
        label: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            label: label.into(),
            width,
            height,
            pixels,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        log::info!("Loading texture: {:?}", path);

        let img = image::open(path).map_err(|source| TextureError::Image {
            path: path.display().to_string(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Self::from_rgba8(path.display().to_string(), width, height, rgba.into_raw())
    }

    pub fn solid(
        label: impl Into<String>,
        width: u32,
        height: u32,
        color: [u8; 4],
    ) -> Result<Self, TextureError> {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_rgba8(label, width, height, pixels)
    }

    /// Two-colour checkerboard with square cells of `cell` pixels.
    pub fn checkerboard(
        label: impl Into<String>,
        size: u32,
        cell: u32,
        a: [u8; 4],
        b: [u8; 4],
    ) -> Result<Self, TextureError> {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }
        Self::from_rgba8(label, size, size, pixels)
    }

    pub fn size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.width as f32, self.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_length_is_validated() {
        assert!(TextureAsset::from_rgba8("ok", 2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            TextureAsset::from_rgba8("bad", 2, 2, vec![0; 15]),
            Err(TextureError::SizeMismatch { actual: 15, .. })
        ));
    }

    #[test]
    fn zero_sized_textures_are_rejected() {
        assert!(matches!(
            TextureAsset::from_rgba8("empty", 0, 0, Vec::new()),
            Err(TextureError::Empty { width: 0, height: 0 })
        ));
        assert!(matches!(
            TextureAsset::solid("flat", 4, 0, [255; 4]),
            Err(TextureError::Empty { width: 4, height: 0 })
        ));
        assert!(TextureAsset::checkerboard("none", 0, 2, [0; 4], [255; 4]).is_err());
        assert_eq!(TextureAsset::solid("dot", 1, 1, [9; 4]).unwrap().pixels, vec![9; 4]);
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let tex = TextureAsset::checkerboard("c", 4, 2, [255; 4], [0, 0, 0, 255]).unwrap();
        assert_eq!(tex.pixels.len(), 64);
        assert_eq!(&tex.pixels[0..4], &[255; 4]);
        // pixel (2, 0) is in the second cell
        assert_eq!(&tex.pixels[8..12], &[0, 0, 0, 255]);
    }
}
