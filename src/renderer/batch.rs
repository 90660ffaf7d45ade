// renderer/batch.rs
use std::cmp::Ordering;

use glam::Vec2;

use crate::asset::{Handle, TextureAsset};
use crate::renderer::texture_slots::TextureSlots;
use crate::renderer::vertex::quad_indices;
use crate::renderer::{SpriteBackend, SpriteVertex};
use crate::scene::{SpriteRenderer, Transform};

/// Up to `max_sprites` sprites sharing one z-index, drawn with a single
/// indexed draw call.
///
/// The index pattern never changes, so it is built once in [`start`]; only
/// the vertex data is rewritten as sprites are added each frame.
///
/// [`start`]: RenderBatch::start
pub struct RenderBatch<B: SpriteBackend> {
    z_index: i32,
    max_sprites: usize,
    sprite_count: usize,
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    textures: TextureSlots,
    buffers: Option<B::Buffers>,
}

impl<B: SpriteBackend> RenderBatch<B> {
    pub fn new(max_sprites: usize, texture_slots: usize, z_index: i32) -> Self {
        Self {
            z_index,
            max_sprites: max_sprites.max(1),
            sprite_count: 0,
            vertices: Vec::new(),
            indices: Vec::new(),
            textures: TextureSlots::new(texture_slots),
            buffers: None,
        }
    }

    /// Allocates CPU and GPU storage for the full capacity.
    pub fn start(&mut self, backend: &mut B) {
        self.indices = quad_indices(self.max_sprites);
        self.vertices = vec![
            SpriteVertex::default();
            self.max_sprites * SpriteVertex::VERTICES_PER_SPRITE
        ];
        self.buffers = Some(backend.create_buffers(self.max_sprites, &self.indices));
    }

    pub fn is_started(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn has_room(&self) -> bool {
        self.sprite_count < self.max_sprites
    }

    pub fn has_texture(&self, texture: Handle<TextureAsset>) -> bool {
        self.textures.contains(texture)
    }

    pub fn has_texture_room(&self) -> bool {
        self.textures.has_room()
    }

    /// Whether [`add`](Self::add) may be called with `sprite`.
    pub fn accepts(&self, sprite: &SpriteRenderer) -> bool {
        self.has_room()
            && sprite.z_index == self.z_index
            && sprite
                .texture()
                .map_or(true, |tex| self.has_texture(tex) || self.has_texture_room())
    }

    /// Appends a sprite and writes its four vertices.
    ///
    /// # Panics
    ///
    /// If the batch was not started, is full, or the sprite brings a new
    /// texture while the texture table is full. Callers check
    /// [`accepts`](Self::accepts) first.
    pub fn add(&mut self, transform: &Transform, sprite: &SpriteRenderer) {
        assert!(self.is_started(), "RenderBatch::add called before start");
        assert!(self.has_room(), "RenderBatch::add called on a full batch");

        let slot = match sprite.texture() {
            None => 0,
            Some(texture) => self
                .textures
                .insert(texture)
                .expect("RenderBatch::add called without texture room"),
        };

        self.load_vertex_properties(self.sprite_count, transform, sprite, slot);
        self.sprite_count += 1;
    }

    fn load_vertex_properties(
        &mut self,
        index: usize,
        transform: &Transform,
        sprite: &SpriteRenderer,
        slot: u32,
    ) {
        let half = sprite.sprite.size * 0.5;
        let uv = sprite.sprite.uv;
        let color = sprite.color.to_array();

        // top-right, bottom-right, bottom-left, top-left
        let corners = [
            (Vec2::new(half.x, half.y), [uv.max.x, uv.min.y]),
            (Vec2::new(half.x, -half.y), [uv.max.x, uv.max.y]),
            (Vec2::new(-half.x, -half.y), [uv.min.x, uv.max.y]),
            (Vec2::new(-half.x, half.y), [uv.min.x, uv.min.y]),
        ];

        let base = index * SpriteVertex::VERTICES_PER_SPRITE;
        for (offset, (local, uv)) in corners.into_iter().enumerate() {
            let world = transform.transform_point(local);
            self.vertices[base + offset] = SpriteVertex {
                position: [world.x, world.y, 0.0],
                color,
                uv,
                tex_slot: slot as f32,
            };
        }
    }

    /// Uploads the live vertices and issues one draw. Empty batches draw
    /// nothing.
    pub fn render(&mut self, backend: &mut B) -> bool {
        if self.sprite_count == 0 {
            return false;
        }
        let Some(buffers) = self.buffers.as_mut() else {
            log::warn!("Skipping batch at z-index {}: not started", self.z_index);
            return false;
        };

        let textures: Vec<Handle<TextureAsset>> = self.textures.iter().collect();
        let vertex_count = self.sprite_count * SpriteVertex::VERTICES_PER_SPRITE;
        let index_count = (self.sprite_count * SpriteVertex::INDICES_PER_SPRITE) as u32;

        backend.draw(
            buffers,
            &self.vertices[..vertex_count],
            index_count,
            &textures,
        );
        true
    }

    /// Forgets this frame's sprites and textures; allocations are kept.
    pub fn clear(&mut self) {
        self.sprite_count = 0;
        self.textures.clear();
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn sprite_count(&self) -> usize {
        self.sprite_count
    }

    pub fn max_sprites(&self) -> usize {
        self.max_sprites
    }

    pub fn is_empty(&self) -> bool {
        self.sprite_count == 0
    }

    pub fn textures(&self) -> &TextureSlots {
        &self.textures
    }

    /// Vertices of the sprites added since the last clear.
    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices[..self.sprite_count * SpriteVertex::VERTICES_PER_SPRITE]
    }

    /// Indices covering the sprites added since the last clear.
    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.sprite_count * SpriteVertex::INDICES_PER_SPRITE]
    }

    pub fn buffers(&self) -> Option<&B::Buffers> {
        self.buffers.as_ref()
    }

    pub fn compare(a: &Self, b: &Self) -> Ordering {
        a.z_index.cmp(&b.z_index)
    }
}
