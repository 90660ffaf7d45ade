// scene/scene.rs
use std::collections::HashMap;

use hecs::{Entity, World};

use super::components::*;
use super::hierarchy::{self, TreeNode};
use super::propagate::propagate_transforms;
use super::save_data::{self, SaveData};
use crate::asset::Assets;
use crate::error::HierarchyError;
use crate::renderer::{RenderStats, Renderer};
use crate::scene::{Camera2D, FontRenderer, SpriteRenderer, Transform};

pub struct Scene {
    pub world: World,
    pub assets: Assets,
    time: f64,
    camera: Camera2D,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_assets(Assets::default())
    }

    pub fn with_assets(assets: Assets) -> Self {
        Self {
            world: World::new(),
            assets,
            time: 0.0,
            camera: Camera2D::default(),
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn set_camera(&mut self, camera: Camera2D) {
        self.camera = camera;
    }

    pub fn spawn_sprite(
        &mut self,
        name: &str,
        transform: Transform,
        sprite: SpriteRenderer,
    ) -> Entity {
        self.world.spawn((Name::new(name), transform, sprite))
    }

    pub fn spawn_text(&mut self, name: &str, transform: Transform, text: FontRenderer) -> Entity {
        self.world.spawn((Name::new(name), transform, text))
    }

    /// An invisible entity that only positions its children.
    pub fn spawn_group(&mut self, name: &str, transform: Transform) -> Entity {
        self.world.spawn((Name::new(name), transform))
    }

    /// Spawns a sprite and attaches it as the last child of `parent`.
    pub fn spawn_child(
        &mut self,
        parent: Entity,
        name: &str,
        transform: Transform,
        sprite: SpriteRenderer,
    ) -> Result<Entity, HierarchyError> {
        let child = self.spawn_sprite(name, transform, sprite);
        if let Err(err) = hierarchy::attach(&mut self.world, parent, child) {
            let _ = self.world.despawn(child);
            return Err(err);
        }
        Ok(child)
    }

    pub fn update(&mut self, dt: f64) {
        self.time += dt;

        self.system_rotate_animation(dt);

        // Always propagate after anything that moves entities
        propagate_transforms(&mut self.world);
    }

    /// Every visible sprite with its effective transform, in entity order.
    /// Text contributes one sprite per glyph.
    ///
    /// The effective transform is the propagated world transform when one
    /// exists and the local one otherwise.
    pub fn sprite_pairs(&self) -> Vec<(Transform, SpriteRenderer)> {
        let mut sprites: Vec<(u32, Transform, SpriteRenderer)> = self
            .world
            .query::<(&Transform, &SpriteRenderer, Option<&GlobalTransform>)>()
            .iter()
            .map(|(entity, (local, sprite, global))| {
                let transform = global.map_or(*local, |g| g.0);
                (entity.id(), transform, *sprite)
            })
            .collect();

        for (entity, (local, text, global)) in self
            .world
            .query::<(&Transform, &FontRenderer, Option<&GlobalTransform>)>()
            .iter()
        {
            let Some(font) = text.font.and_then(|handle| self.assets.fonts.get(handle)) else {
                continue;
            };
            let transform = global.map_or(*local, |g| g.0);
            sprites.extend(
                text.glyphs(&transform, font)
                    .into_iter()
                    .map(|(glyph_transform, glyph)| (entity.id(), glyph_transform, glyph)),
            );
        }

        // Stable, so glyphs stay in reading order.
        sprites.sort_by_key(|(id, _, _)| *id);
        sprites
            .into_iter()
            .map(|(_, transform, sprite)| (transform, sprite))
            .collect()
    }

    pub fn render(&self, renderer: &mut Renderer) -> Result<RenderStats, wgpu::SurfaceError> {
        let sprites = self.sprite_pairs();
        renderer.render(&self.assets, &self.camera, &sprites)
    }

    /// Display model for a hierarchy panel.
    pub fn hierarchy(&self) -> Vec<TreeNode> {
        hierarchy::build_tree(&self.world)
    }

    /// Serializes every entity in hierarchy pre-order, so loading the
    /// records back in order restores each parent's child order.
    pub fn save(&self) -> SaveData {
        let mut save = SaveData::new();

        let mut stack: Vec<Entity> = hierarchy::roots(&self.world);
        stack.reverse();
        while let Some(entity) = stack.pop() {
            self.save_entity(&mut save, entity);
            let children = hierarchy::children_of(&self.world, entity);
            stack.extend(children.into_iter().rev());
        }

        // Renderers without a Transform are not part of the hierarchy.
        let mut loose: Vec<Entity> = self
            .world
            .query::<hecs::Or<&SpriteRenderer, &FontRenderer>>()
            .without::<&Transform>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        loose.sort_by_key(|entity| entity.id());
        for entity in loose {
            self.save_entity(&mut save, entity);
        }

        log::debug!("Serialized scene into {} records", save.size());
        save
    }

    fn save_entity(&self, save: &mut SaveData, entity: Entity) {
        let id = entity.id();

        if let Ok(transform) = self.world.get::<&Transform>(entity) {
            let name = self.world.get::<&Name>(entity).ok().map(|n| n.0.clone());
            let parent = hierarchy::parent_of(&self.world, entity).map(|p| p.id());
            save_data::serialize_transform(save, id, &transform, name.as_deref(), parent);
        }

        if let Ok(sprite) = self.world.get::<&SpriteRenderer>(entity) {
            save_data::serialize_sprite_renderer(save, id, &sprite);
        }

        if let Ok(text) = self.world.get::<&FontRenderer>(entity) {
            save_data::serialize_font_renderer(save, id, &text);
        }
    }

    /// Rebuilds a scene from save data. Every distinct `Entity` id becomes
    /// one new entity; parents are linked once all records are read.
    /// Unknown or malformed records are skipped.
    pub fn load(save: &SaveData, assets: Assets) -> Self {
        let mut scene = Self::with_assets(assets);
        let mut entities: HashMap<u32, Entity> = HashMap::new();
        let mut links: Vec<(Entity, u32)> = Vec::new();

        for record in save.components() {
            let Some((kind, body)) = save_data::record_kind(record) else {
                log::warn!("Skipping malformed component record {}", record);
                continue;
            };
            if ![save_data::TRANSFORM, save_data::SPRITE_RENDERER, save_data::FONT_RENDERER].contains(&kind) {
                log::warn!("Skipping unknown component kind {}", kind);
                continue;
            }
            let Some(id) = save_data::record_entity(body) else {
                log::warn!("Skipping {} record without an Entity id", kind);
                continue;
            };

            let world = &mut scene.world;
            let entity = *entities.entry(id).or_insert_with(|| world.spawn(()));

            if kind == save_data::TRANSFORM {
                let restored = save_data::deserialize_transform(record);
                insert_component(world, entity, restored.transform);
                if let Some(name) = restored.name {
                    insert_component(world, entity, Name(name));
                }
                if let Some(parent) = restored.parent {
                    links.push((entity, parent));
                }
            } else if kind == save_data::SPRITE_RENDERER {
                let sprite = save_data::deserialize_sprite_renderer(record, &scene.assets);
                insert_component(world, entity, sprite);
            } else {
                let text = save_data::deserialize_font_renderer(record, &scene.assets);
                insert_component(world, entity, text);
            }
        }

        for (child, parent_id) in links {
            let Some(&parent) = entities.get(&parent_id) else {
                log::warn!("Parent entity {} missing from save data", parent_id);
                continue;
            };
            if let Err(err) = hierarchy::attach(&mut scene.world, parent, child) {
                log::warn!("Could not restore parent link: {}", err);
            }
        }

        propagate_transforms(&mut scene.world);

        log::info!(
            "Loaded scene with {} entities from {} records",
            entities.len(),
            save.size()
        );
        scene
    }

    fn system_rotate_animation(&mut self, dt: f64) {
        for (_, (transform, anim)) in self
            .world
            .query_mut::<(&mut Transform, &RotateAnimation)>()
        {
            transform.rotation += anim.speed * dt as f32;
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_component<C: hecs::Component>(world: &mut World, entity: Entity, component: C) {
    if let Err(err) = world.insert_one(entity, component) {
        log::error!("Failed to restore component on {:?}: {:?}", entity, err);
    }
}
