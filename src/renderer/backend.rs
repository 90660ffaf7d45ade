use glam::Mat4;

use crate::asset::{Handle, TextureAsset};
use crate::renderer::SpriteVertex;

/// GPU side of sprite rendering: the sprite shader program plus the buffers
/// each batch draws from.
///
/// A batch receives its [`Buffers`](SpriteBackend::Buffers) from
/// [`create_buffers`](SpriteBackend::create_buffers) and owns them until it is
/// dropped; dropping them must release the GPU memory.
pub trait SpriteBackend {
    type Buffers;

    /// Allocates vertex storage for `max_sprites` quads and uploads the
    /// static `indices` once.
    fn create_buffers(&mut self, max_sprites: usize, indices: &[u32]) -> Self::Buffers;

    fn bind(&mut self);

    fn unbind(&mut self);

    fn upload_mat4(&mut self, name: &str, value: Mat4);

    fn upload_int_array(&mut self, name: &str, values: &[i32]);

    /// Uploads `vertices` into `buffers` and draws the first `index_count`
    /// indices with `textures` bound to slots `1..=textures.len()`.
    fn draw(
        &mut self,
        buffers: &mut Self::Buffers,
        vertices: &[SpriteVertex],
        index_count: u32,
        textures: &[Handle<TextureAsset>],
    );
}
