// app.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::renderer::{GpuBatchBackend, RenderContext, SceneRenderer, Texture};
use crate::scene::DemoScene;
use crate::settings::RenderSettings;

const STATS_INTERVAL: Duration = Duration::from_secs(2);

struct RenderState {
    context: RenderContext,
    renderer: SceneRenderer<GpuBatchBackend>,
}

pub struct App {
    settings: RenderSettings,
    window: Option<Arc<Window>>,
    state: Option<RenderState>,
    scene: DemoScene,
    last_frame: Instant,
    last_stats: Instant,
    frames: u32,
}

impl App {
    pub fn new(settings: RenderSettings, scene: DemoScene) -> Self {
        let now = Instant::now();
        Self {
            settings,
            window: None,
            state: None,
            scene,
            last_frame: now,
            last_stats: now,
            frames: 0,
        }
    }

    fn init_renderer(&mut self, window: Arc<Window>) -> Result<RenderState, crate::renderer::GpuError> {
        let context = pollster::block_on(RenderContext::new(window, &self.settings))?;

        let mut backend = GpuBatchBackend::new(
            &context.device,
            &context.queue,
            context.config.format,
            self.settings.batch,
            self.settings.clear_color(),
        );
        let checker = Texture::checkerboard(
            backend.device(),
            backend.queue(),
            256,
            32,
            [255, 255, 255, 255],
            [40, 40, 40, 255],
            Some("Checkerboard"),
        );
        self.scene.set_texture(backend.add_texture(checker));
        self.scene.camera_mut().set_aspect(context.config.width, context.config.height);

        Ok(RenderState {
            renderer: SceneRenderer::new(backend, self.settings.batch),
            context,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.scene.update(dt);

        let frame = match state.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = state.context.size;
                state.context.resize(size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(err) => {
                log::warn!("Skipping frame: {}", err);
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        state
            .renderer
            .backend_mut()
            .begin_frame(view, &state.context.depth.view);
        if let Err(err) = self.scene.render(&mut state.renderer) {
            log::error!("Scene render failed: {}", err);
        }
        state.renderer.backend_mut().end_frame();
        frame.present();

        self.frames += 1;
        if now - self.last_stats >= STATS_INTERVAL {
            let stats = state.renderer.stats();
            let fps = self.frames as f32 / (now - self.last_stats).as_secs_f32();
            log::info!(
                "{:.1} fps | {} meshes, {} vertices, {} indices in {} batches / {} draw calls ({} splits, {} dropped)",
                fps,
                self.scene.len(),
                stats.vertices,
                stats.indices,
                stats.batches,
                stats.draw_calls,
                stats.splits,
                stats.dropped_meshes
            );
            self.frames = 0;
            self.last_stats = now;
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
            .with_title("wgpu batch renderer")
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        match self.init_renderer(window.clone()) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Failed to initialise renderer: {}", err);
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = self.state.as_mut() {
                    state.context.resize(size);
                }
                self.scene.camera_mut().set_aspect(size.width, size.height);
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
            _ => {}
        }
    }
}
