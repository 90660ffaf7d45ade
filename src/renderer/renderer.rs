// renderer/renderer.rs
use std::sync::Arc;

use winit::{dpi::PhysicalSize, window::Window};

use crate::asset::Assets;
use crate::error::RendererError;
use crate::renderer::render_system::{RenderStats, RenderSystem};
use crate::renderer::sprite_backend::WgpuSpriteBackend;
use crate::renderer::texture_slots::MAX_TEXTURE_SLOTS;
use crate::renderer::vertex::max_sprites_per_buffer;
use crate::scene::{Camera2D, SpriteRenderer, Transform};
use crate::settings::RenderSettings;

/// Owns the window surface and the sprite render system drawing into it.
pub struct Renderer {
    system: RenderSystem<WgpuSpriteBackend>,
    settings: RenderSettings,
    last_stats: RenderStats,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, settings: RenderSettings) -> Result<Self, RendererError> {
        let backend = WgpuSpriteBackend::new(window, &settings).await?;
        let limit = max_sprites_per_buffer(backend.limits().max_buffer_size);
        let max_batch_size = if settings.max_batch_size > limit {
            log::warn!(
                "Batch size {} exceeds this device's buffer limit. Clamping to {}.",
                settings.max_batch_size,
                limit
            );
            limit
        } else {
            settings.max_batch_size
        };
        let system = RenderSystem::with_limits(backend, max_batch_size, MAX_TEXTURE_SLOTS);

        Ok(Self {
            system,
            settings,
            last_stats: RenderStats::default(),
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.system.backend_mut().resize(new_size);
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.system.backend().size()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let size = self.size();
        size.width.max(1) as f32 / size.height.max(1) as f32
    }

    /// Draws one frame of `sprites` as seen from `camera` and presents it.
    ///
    /// `Lost` and `Outdated` surfaces are reconfigured here before the error
    /// is handed back, so the caller only has to skip the frame.
    pub fn render(
        &mut self,
        assets: &Assets,
        camera: &Camera2D,
        sprites: &[(Transform, SpriteRenderer)],
    ) -> Result<RenderStats, wgpu::SurfaceError> {
        let backend = self.system.backend_mut();
        backend.sync_textures(assets);

        let output = match backend.begin_frame() {
            Ok(output) => output,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {:?}, reconfiguring", err);
                backend.reconfigure();
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let stats = self
            .system
            .render(sprites.iter().map(|(t, s)| (*t, s)), camera);

        self.system.backend_mut().end_frame();
        output.present();

        self.last_stats = stats;
        Ok(stats)
    }

    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn system(&self) -> &RenderSystem<WgpuSpriteBackend> {
        &self.system
    }
}
