// app.rs
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::settings::RenderSettings;

const STATS_INTERVAL_FRAMES: u64 = 600;

pub struct App {
    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,
    window_id: Option<WindowId>,
    scene: Scene,
    settings: RenderSettings,
    title: String,
    save_path: Option<PathBuf>,
    last_frame: Option<Instant>,
    frame_count: u64,
}

impl App {
    pub fn new(scene: Scene, settings: RenderSettings) -> Self {
        Self {
            renderer: None,
            window: None,
            window_id: None,
            scene,
            settings,
            title: "wgpu sprites".to_string(),
            save_path: None,
            last_frame: None,
            frame_count: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Where the S key writes the scene. Saving is disabled without one.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn save_scene(&self) {
        let Some(path) = &self.save_path else {
            return;
        };
        let save = self.scene.save();
        match save.write_to(path) {
            Ok(()) => log::info!("Saved {} records to {:?}", save.size(), path),
            Err(err) => log::error!("Failed to save scene to {:?}: {}", path, err),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f64());
        self.last_frame = Some(now);

        self.scene.update(dt);

        match self.scene.render(renderer) {
            Ok(stats) => {
                self.frame_count += 1;
                if self.frame_count % STATS_INTERVAL_FRAMES == 0 {
                    log::info!(
                        "frame {}: {} sprites in {} draw calls ({} batches, {:.2} ms)",
                        self.frame_count,
                        stats.sprites,
                        stats.draw_calls,
                        stats.batches,
                        dt * 1000.0
                    );
                }
            }
            // Already reconfigured by the renderer; the next frame retries.
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {}
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(err) => log::warn!("Skipping frame: {:?}", err),
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        renderer.resize(size);
        if size.width > 0 && size.height > 0 {
            let aspect = renderer.aspect_ratio();
            self.scene.camera_mut().fit_aspect(aspect);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let resolution = &self.settings.resolution;
        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        let renderer =
            match pollster::block_on(Renderer::new(Arc::clone(&window), self.settings.clone())) {
                Ok(renderer) => renderer,
                Err(err) => {
                    log::error!("Failed to initialise renderer: {}", err);
                    event_loop.exit();
                    return;
                }
            };

        self.scene.camera_mut().fit_aspect(renderer.aspect_ratio());

        self.window_id = Some(window.id());
        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.resize(size);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.resize(size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);

                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Character(text),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if text.eq_ignore_ascii_case("s") => {
                self.save_scene();
            }
            _ => {}
        }
    }
}
