// renderer/sprite_backend.rs
use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::asset::{Assets, Handle, TextureAsset};
use crate::error::RendererError;
use crate::renderer::context::RenderContext;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::texture::GpuTexture;
use crate::renderer::texture_slots::MAX_TEXTURE_SLOTS;
use crate::renderer::uniforms::SpriteUniform;
use crate::renderer::{SpriteBackend, SpriteVertex};
use crate::settings::RenderSettings;

/// Vertex and index buffers owned by one batch. Dropping them releases the
/// GPU memory.
pub struct SpriteBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    max_sprites: usize,
    textures: Option<TextureBinding<wgpu::BindGroup>>,
}

impl SpriteBuffers {
    pub fn max_sprites(&self) -> usize {
        self.max_sprites
    }
}

/// A batch's texture bind group together with the texture list it was
/// built from. It is rebuilt when the list changes or when a texture was
/// still missing on the GPU at build time.
struct TextureBinding<G> {
    textures: Vec<Handle<TextureAsset>>,
    complete: bool,
    group: G,
}

impl<G> TextureBinding<G> {
    fn get_or_rebuild<'a>(
        slot: &'a mut Option<Self>,
        textures: &[Handle<TextureAsset>],
        build: impl FnOnce() -> (G, bool),
    ) -> &'a G {
        let binding = match slot.take() {
            Some(binding) if binding.complete && binding.textures == textures => binding,
            _ => {
                let (group, complete) = build();
                Self {
                    textures: textures.to_vec(),
                    complete,
                    group,
                }
            }
        };
        &slot.insert(binding).group
    }
}

struct FrameTarget {
    encoder: wgpu::CommandEncoder,
    view: wgpu::TextureView,
    cleared: bool,
}

/// [`SpriteBackend`] drawing through wgpu.
///
/// Every batch draw records its own render pass into the frame's encoder;
/// the first pass clears the target. Uniform and vertex writes go through
/// the queue and land before the frame is submitted in [`end_frame`].
///
/// [`end_frame`]: WgpuSpriteBackend::end_frame
pub struct WgpuSpriteBackend {
    context: RenderContext,
    pipeline: wgpu::RenderPipeline,
    textures_layout: wgpu::BindGroupLayout,
    uniform: SpriteUniform,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    // Indexed like the asset cache it mirrors.
    textures: Vec<GpuTexture>,
    clear_color: wgpu::Color,
    frame: Option<FrameTarget>,
    bound: bool,
}

impl WgpuSpriteBackend {
    pub async fn new(window: Arc<Window>, settings: &RenderSettings) -> Result<Self, RendererError> {
        let context = RenderContext::new(window, settings).await?;
        let device = &context.device;

        let uniform = SpriteUniform::new();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sprite Uniforms"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut texture_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS as u32)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: MAX_TEXTURE_SLOTS as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });

        let textures_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Texture Layout"),
            entries: &texture_entries,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sprite.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &textures_layout],
            push_constant_ranges: &[],
        });

        let pipeline = PipelineBuilder::new(device, &pipeline_layout, &shader)
            .with_label("Sprite Pipeline")
            .with_vertex_buffer(SpriteVertex::layout())
            .with_color_target(
                context.config.format,
                Some(wgpu::BlendState::ALPHA_BLENDING),
            )
            .with_no_culling()
            .build();

        let sampler = GpuTexture::sprite_sampler(device);
        let white = GpuTexture::white(device, &context.queue);

        Ok(Self {
            pipeline,
            textures_layout,
            uniform,
            uniform_buffer,
            uniform_bind_group,
            sampler,
            white,
            textures: Vec::new(),
            clear_color: settings.wgpu_clear_color(),
            frame: None,
            bound: false,
            context,
        })
    }

    /// Uploads textures added to `assets` since the last call.
    pub fn sync_textures(&mut self, assets: &Assets) {
        let uploaded = self.textures.len();
        for (_, asset) in assets.textures.iter().skip(uploaded) {
            // Keep indices aligned with the cache even for unusable assets.
            let gpu = if asset.width == 0 || asset.height == 0 {
                log::warn!("Texture '{}' has no pixels, drawing white", asset.label);
                GpuTexture::white(&self.context.device, &self.context.queue)
            } else {
                GpuTexture::from_asset(&self.context.device, &self.context.queue, asset)
            };
            self.textures.push(gpu);
        }
        if self.textures.len() > uploaded {
            log::info!(
                "Uploaded {} sprite textures ({} total)",
                self.textures.len() - uploaded,
                self.textures.len()
            );
        }
    }

    /// Acquires the next surface texture and opens a command encoder for it.
    pub fn begin_frame(&mut self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sprite Encoder"),
            });

        self.frame = Some(FrameTarget {
            encoder,
            view,
            cleared: false,
        });
        Ok(output)
    }

    /// Submits the frame's commands. A frame with no draws is still cleared.
    pub fn end_frame(&mut self) {
        let Some(mut frame) = self.frame.take() else {
            log::warn!("end_frame called without begin_frame");
            return;
        };

        if !frame.cleared {
            let _pass = Self::begin_pass(&mut frame, self.clear_color);
        }

        self.context.queue.submit(Some(frame.encoder.finish()));
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size);
    }

    pub fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.context.device.limits()
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    fn begin_pass(frame: &mut FrameTarget, clear_color: wgpu::Color) -> wgpu::RenderPass<'_> {
        let load = if frame.cleared {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(clear_color)
        };
        frame.cleared = true;

        frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Sprite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    /// Builds the bind group for one batch's textures. The flag is false when
    /// a texture had not been uploaded yet and white stands in for it.
    fn texture_bind_group(&self, textures: &[Handle<TextureAsset>]) -> (wgpu::BindGroup, bool) {
        let mut complete = true;
        let views: Vec<&wgpu::TextureView> = (0..MAX_TEXTURE_SLOTS)
            .map(|slot| {
                let gpu = textures.get(slot).and_then(|handle| {
                    let found = self.textures.get(handle.index());
                    if found.is_none() {
                        log::warn!("Texture {:?} was never uploaded, drawing white", handle);
                        complete = false;
                    }
                    found
                });
                &gpu.unwrap_or(&self.white).view
            })
            .collect();

        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: MAX_TEXTURE_SLOTS as u32,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });

        let bind_group = self
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Sprite Texture Bind Group"),
                layout: &self.textures_layout,
                entries: &entries,
            });
        (bind_group, complete)
    }

    fn write_uniform(&self) {
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }
}

impl SpriteBackend for WgpuSpriteBackend {
    type Buffers = SpriteBuffers;

    fn create_buffers(&mut self, max_sprites: usize, indices: &[u32]) -> SpriteBuffers {
        let vertex_bytes = (max_sprites
            * SpriteVertex::VERTICES_PER_SPRITE
            * std::mem::size_of::<SpriteVertex>()) as wgpu::BufferAddress;

        let vertex = self.context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Batch Vertices"),
            size: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sprite Batch Indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        log::debug!(
            "Allocated sprite buffers: {} sprites, {} bytes of vertices",
            max_sprites,
            vertex_bytes
        );

        SpriteBuffers {
            vertex,
            index,
            max_sprites,
            textures: None,
        }
    }

    fn bind(&mut self) {
        self.bound = true;
    }

    fn unbind(&mut self) {
        self.bound = false;
    }

    fn upload_mat4(&mut self, name: &str, value: Mat4) {
        if !self.uniform.set_mat4(name, value) {
            log::warn!("Sprite shader has no mat4 uniform named {}", name);
            return;
        }
        self.write_uniform();
    }

    fn upload_int_array(&mut self, name: &str, values: &[i32]) {
        if !self.uniform.set_int_array(name, values) {
            log::warn!("Sprite shader has no int array uniform named {}", name);
            return;
        }
        self.write_uniform();
    }

    fn draw(
        &mut self,
        buffers: &mut SpriteBuffers,
        vertices: &[SpriteVertex],
        index_count: u32,
        textures: &[Handle<TextureAsset>],
    ) {
        if !self.bound {
            log::warn!("Sprite draw issued outside bind/unbind, skipping");
            return;
        }

        if vertices.len() > buffers.max_sprites() * SpriteVertex::VERTICES_PER_SPRITE {
            log::error!(
                "{} vertices do not fit a batch of {} sprites, skipping",
                vertices.len(),
                buffers.max_sprites()
            );
            return;
        }

        let bind_group = TextureBinding::get_or_rebuild(&mut buffers.textures, textures, || {
            self.texture_bind_group(textures)
        });

        self.context
            .queue
            .write_buffer(&buffers.vertex, 0, bytemuck::cast_slice(vertices));

        let Some(frame) = self.frame.as_mut() else {
            log::warn!("Sprite draw issued without a frame target, skipping");
            return;
        };

        let mut pass = Self::begin_pass(frame, self.clear_color);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, bind_group, &[]);
        pass.set_vertex_buffer(0, buffers.vertex.slice(..));
        pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..index_count, 0, 0..1);
    }
}
