pub mod cache;
pub mod font;
pub mod handle;
pub mod texture;

pub use cache::AssetCache;
pub use font::FontAsset;
pub use handle::Handle;
pub use texture::TextureAsset;

pub struct Assets {
    pub textures: AssetCache<TextureAsset>,
    pub fonts: AssetCache<FontAsset>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            textures: AssetCache::new(),
            fonts: AssetCache::new(),
        }
    }

    pub fn add_texture(&mut self, texture: TextureAsset) -> Handle<TextureAsset> {
        log::debug!(
            "Registering texture '{}' ({}x{})",
            texture.label,
            texture.width,
            texture.height
        );
        self.textures.insert(texture)
    }

    /// Turns a persisted asset id back into a live texture handle.
    pub fn resolve(&self, asset_id: i64) -> Option<Handle<TextureAsset>> {
        let handle = self.textures.resolve(asset_id);
        if handle.is_none() && asset_id >= 0 {
            log::warn!("Asset id {} does not name a loaded texture", asset_id);
        }
        handle
    }

    pub fn add_font(&mut self, font: FontAsset) -> Handle<FontAsset> {
        log::debug!("Registering font '{}' ({} glyphs)", font.label, font.glyph_count());
        self.fonts.insert(font)
    }

    /// Font counterpart of [`Assets::resolve`].
    pub fn resolve_font(&self, asset_id: i64) -> Option<Handle<FontAsset>> {
        let handle = self.fonts.resolve(asset_id);
        if handle.is_none() && asset_id >= 0 {
            log::warn!("Asset id {} does not name a loaded font", asset_id);
        }
        handle
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}
