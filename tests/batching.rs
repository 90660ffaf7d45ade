//! Routing and draw-order properties of the sprite render system, checked
//! through a backend that only counts what it is asked to do.
//!
//! Conventions used in this codebase:
//! - Higher z-index draws later, i.e. on top.
//! - Texture slot 0 means "untextured"; real textures use slots 1..=16.
//!
use glam::{Mat4, Vec2, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use wgpu_sprites::asset::{Assets, Handle, TextureAsset};
use wgpu_sprites::renderer::{RenderSystem, SpriteBackend, SpriteVertex, MAX_TEXTURE_SLOTS};
use wgpu_sprites::scene::{Camera2D, Sprite, SpriteRenderer, Transform};

#[derive(Debug, Clone, PartialEq)]
struct DrawCall {
    buffers: usize,
    sprites: usize,
    first_slot: f32,
    textures: Vec<Handle<TextureAsset>>,
}

#[derive(Default)]
struct CountingBackend {
    allocations: usize,
    draws: Vec<DrawCall>,
    uniforms: Vec<String>,
}

impl SpriteBackend for CountingBackend {
    type Buffers = usize;

    fn create_buffers(&mut self, _max_sprites: usize, _indices: &[u32]) -> usize {
        self.allocations += 1;
        self.allocations - 1
    }

    fn bind(&mut self) {
        self.draws.clear();
        self.uniforms.clear();
    }

    fn unbind(&mut self) {}

    fn upload_mat4(&mut self, name: &str, _value: Mat4) {
        self.uniforms.push(name.to_string());
    }

    fn upload_int_array(&mut self, name: &str, _values: &[i32]) {
        self.uniforms.push(name.to_string());
    }

    fn draw(
        &mut self,
        buffers: &mut usize,
        vertices: &[SpriteVertex],
        index_count: u32,
        textures: &[Handle<TextureAsset>],
    ) {
        assert_eq!(vertices.len() / SpriteVertex::VERTICES_PER_SPRITE * 6, index_count as usize);
        self.draws.push(DrawCall {
            buffers: *buffers,
            sprites: vertices.len() / SpriteVertex::VERTICES_PER_SPRITE,
            first_slot: vertices[0].tex_slot,
            textures: textures.to_vec(),
        });
    }
}

fn texture_handles(count: usize) -> Vec<Handle<TextureAsset>> {
    let mut assets = Assets::new();
    (0..count)
        .map(|i| assets.add_texture(TextureAsset::solid(format!("t{i}"), 1, 1, [255; 4]).unwrap()))
        .collect()
}

fn sprite(z: i32, texture: Option<Handle<TextureAsset>>) -> SpriteRenderer {
    let sprite = match texture {
        Some(handle) => Sprite::textured(handle, Vec2::splat(8.0)),
        None => Sprite::default(),
    };
    SpriteRenderer::new(Vec4::ONE).with_sprite(sprite).with_z_index(z)
}

fn random_sprites(seed: u64, count: usize, textures: &[Handle<TextureAsset>]) -> Vec<SpriteRenderer> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let z = rng.gen_range(-2..=2);
            let texture = if rng.gen_bool(0.25) {
                None
            } else {
                Some(textures[rng.gen_range(0..textures.len())])
            };
            sprite(z, texture)
        })
        .collect()
}

fn layout(system: &RenderSystem<CountingBackend>) -> Vec<(i32, usize, Vec<Handle<TextureAsset>>)> {
    system
        .batches()
        .iter()
        .map(|b| (b.z_index(), b.sprite_count(), b.textures().iter().collect()))
        .collect()
}

#[test]
fn routed_batches_respect_capacity_texture_limit_and_z_order() {
    let textures = texture_handles(40);
    let sprites = random_sprites(7, 5000, &textures);
    let mut system = RenderSystem::with_limits(CountingBackend::default(), 300, MAX_TEXTURE_SLOTS);

    for spr in &sprites {
        system.add_entity(&Transform::IDENTITY, spr);
    }

    let batches = system.batches();
    let total: usize = batches.iter().map(|b| b.sprite_count()).sum();
    assert_eq!(total, sprites.len());

    for batch in batches {
        assert!(batch.sprite_count() <= 300);
        assert!(batch.textures().len() <= MAX_TEXTURE_SLOTS);
    }
    for pair in batches.windows(2) {
        assert!(pair[0].z_index() <= pair[1].z_index());
    }
}

#[test]
fn routing_is_deterministic_for_the_same_input() {
    let textures = texture_handles(24);
    let sprites = random_sprites(99, 2000, &textures);

    let route = || {
        let mut system = RenderSystem::with_limits(CountingBackend::default(), 250, MAX_TEXTURE_SLOTS);
        for spr in &sprites {
            system.add_entity(&Transform::IDENTITY, spr);
        }
        layout(&system)
    };

    assert_eq!(route(), route());
}

#[test]
fn fifteen_hundred_sprites_fill_one_batch_and_spill() {
    let mut system = RenderSystem::with_limits(CountingBackend::default(), 1000, MAX_TEXTURE_SLOTS);
    let spr = sprite(0, None);
    for _ in 0..1500 {
        system.add_entity(&Transform::IDENTITY, &spr);
    }

    let counts: Vec<usize> = system.batches().iter().map(|b| b.sprite_count()).collect();
    assert_eq!(counts, vec![1000, 500]);
}

#[test]
fn same_z_sprites_are_drawn_before_higher_z() {
    let mut system = RenderSystem::new(CountingBackend::default());
    let sprites = [sprite(0, None), sprite(1, None), sprite(0, None)];

    let stats = system.render(sprites.iter().map(|s| (Transform::IDENTITY, s)), &Camera2D::default());

    assert_eq!(stats.draw_calls, 2);
    let drawn: Vec<usize> = system.backend().draws.iter().map(|d| d.sprites).collect();
    assert_eq!(drawn, vec![2, 1]);
    assert_eq!(system.backend().uniforms, vec!["uProjection", "uView", "uTextures"]);
}

#[test]
fn seventeenth_texture_starts_a_second_batch() {
    let textures = texture_handles(17);
    let mut system = RenderSystem::new(CountingBackend::default());
    let sprites: Vec<SpriteRenderer> = textures.iter().map(|&t| sprite(0, Some(t))).collect();

    system.render(sprites.iter().map(|s| (Transform::IDENTITY, s)), &Camera2D::default());

    let draws = &system.backend().draws;
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].textures, textures[..16].to_vec());
    assert_eq!(draws[1].textures, vec![textures[16]]);
    // slots are 1-based within each batch
    assert_eq!(draws[0].first_slot, 1.0);
    assert_eq!(draws[1].first_slot, 1.0);
}

#[test]
fn later_frames_reuse_batch_allocations() {
    let textures = texture_handles(4);
    let sprites = random_sprites(3, 900, &textures);
    let mut system = RenderSystem::with_limits(CountingBackend::default(), 100, MAX_TEXTURE_SLOTS);
    let camera = Camera2D::default();

    let first = system.render(sprites.iter().map(|s| (Transform::IDENTITY, s)), &camera);
    let allocated = system.backend().allocations;
    let second = system.render(sprites.iter().map(|s| (Transform::IDENTITY, s)), &camera);

    assert_eq!(first, second);
    assert_eq!(system.backend().allocations, allocated);
    assert_eq!(allocated, first.batches);

    let buffers: Vec<usize> = system.backend().draws.iter().map(|d| d.buffers).collect();
    let mut unique = buffers.clone();
    unique.dedup();
    assert_eq!(buffers, unique, "each batch draws from its own buffers");
}
