// renderer/render_system.rs
use crate::renderer::batch::RenderBatch;
use crate::renderer::texture_slots::{MAX_TEXTURE_SLOTS, SAMPLER_UNITS};
use crate::renderer::SpriteBackend;
use crate::asset::FontAsset;
use crate::scene::{Camera2D, FontRenderer, SpriteRenderer, Transform};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub sprites: usize,
    pub batches: usize,
    pub draw_calls: usize,
}

/// Routes sprites into z-ordered batches and draws them.
///
/// Batches are kept sorted by z-index (ties keep creation order) and survive
/// between frames only as allocations: every frame re-routes the full sprite
/// set and clears each batch after drawing it.
pub struct RenderSystem<B: SpriteBackend> {
    backend: B,
    batches: Vec<RenderBatch<B>>,
    max_batch_size: usize,
    texture_slots: usize,
}

impl<B: SpriteBackend> RenderSystem<B> {
    pub fn new(backend: B) -> Self {
        Self::with_limits(backend, DEFAULT_MAX_BATCH_SIZE, MAX_TEXTURE_SLOTS)
    }

    pub fn with_limits(backend: B, max_batch_size: usize, texture_slots: usize) -> Self {
        log::info!(
            "Sprite render system: {} sprites per batch, {} texture slots",
            max_batch_size,
            texture_slots
        );
        Self {
            backend,
            batches: Vec::new(),
            max_batch_size: max_batch_size.max(1),
            texture_slots: texture_slots.clamp(1, MAX_TEXTURE_SLOTS),
        }
    }

    /// First-fit: the sprite goes into the first batch (in draw order) that
    /// has room, matches its z-index and can take its texture. Otherwise a
    /// new batch is started for it.
    pub fn add_entity(&mut self, transform: &Transform, sprite: &SpriteRenderer) {
        if let Some(batch) = self.batches.iter_mut().find(|b| b.accepts(sprite)) {
            batch.add(transform, sprite);
            return;
        }

        let mut batch = RenderBatch::new(self.max_batch_size, self.texture_slots, sprite.z_index);
        batch.start(&mut self.backend);
        batch.add(transform, sprite);
        self.batches.push(batch);
        // Stable sort: equal z-indices keep creation order.
        self.batches.sort_by(RenderBatch::compare);

        log::debug!(
            "Started batch for z-index {} ({} batches allocated)",
            sprite.z_index,
            self.batches.len()
        );
    }

    /// Routes one quad per visible glyph of `text`. Glyphs added before
    /// [`render`](Self::render) are drawn in that frame. Returns the number
    /// of glyph quads routed.
    pub fn add_text(&mut self, transform: &Transform, text: &FontRenderer, font: &FontAsset) -> usize {
        let glyphs = text.glyphs(transform, font);
        for (glyph_transform, glyph) in &glyphs {
            self.add_entity(glyph_transform, glyph);
        }
        glyphs.len()
    }

    /// Routes `sprites`, then draws every non-empty batch from the lowest
    /// z-index to the highest and clears them all.
    pub fn render<'a, I>(&mut self, sprites: I, camera: &Camera2D) -> RenderStats
    where
        I: IntoIterator<Item = (Transform, &'a SpriteRenderer)>,
    {
        for (transform, sprite) in sprites {
            self.add_entity(&transform, sprite);
        }
        let mut stats = RenderStats {
            sprites: self.batches.iter().map(RenderBatch::sprite_count).sum(),
            ..RenderStats::default()
        };

        self.backend.bind();
        self.backend.upload_mat4("uProjection", camera.projection());
        self.backend.upload_mat4("uView", camera.view());
        self.backend.upload_int_array("uTextures", &SAMPLER_UNITS);

        for batch in &mut self.batches {
            if batch.render(&mut self.backend) {
                stats.draw_calls += 1;
            }
            batch.clear();
        }

        self.backend.unbind();

        stats.batches = self.batches.len();
        log::trace!("Sprite pass: {:?}", stats);
        stats
    }

    pub fn batches(&self) -> &[RenderBatch<B>] {
        &self.batches
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn texture_slots(&self) -> usize {
        self.texture_slots
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
