pub mod backend;
pub mod batch;
pub(crate) mod context;
pub mod pipeline_builder;
pub mod render_system;
#[allow(clippy::module_inception)]
pub mod renderer;
pub mod sprite_backend;
pub mod texture;
pub mod texture_slots;
pub mod uniforms;
pub mod vertex;

pub use backend::SpriteBackend;
pub use batch::RenderBatch;
pub use render_system::{RenderStats, RenderSystem, DEFAULT_MAX_BATCH_SIZE};
pub use renderer::Renderer;
pub use sprite_backend::{SpriteBuffers, WgpuSpriteBackend};
pub use texture::GpuTexture;
pub use texture_slots::{TextureSlots, MAX_TEXTURE_SLOTS};
pub use uniforms::SpriteUniform;
pub use vertex::{max_sprites_per_buffer, SpriteVertex};
