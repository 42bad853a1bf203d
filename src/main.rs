mod bridge;
mod offscreen;

use anyhow::Result;
use arwm_config::AppConfig;
use arwm_geometry::Ray;
use arwm_input::{Command, Gesture, InteractionRouter};
use arwm_scene::{Camera, PanelRegistry};
use bridge::{AiBridge, AiEvent};
use glam::Vec2;
use offscreen::{LoggingEmbeddedHost, OffscreenRenderer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Application state. Desktop pointer mode: the mouse stands in for the XR
/// controller ray and the camera sits at the origin.
struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    window_size: (f32, f32),
    camera: Camera,
    registry: PanelRegistry,
    router: InteractionRouter,
    renderer: OffscreenRenderer,
    host: LoggingEmbeddedHost,
    bridge: AiBridge,
    started: Instant,
    pointer: Option<Ray>,
    frame_count: u64,
    demo_counter: u32,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let bridge = AiBridge::new(&config);
        Self {
            config,
            window: None,
            window_size: (1920.0, 1080.0),
            camera: Camera::new(),
            registry: PanelRegistry::new(),
            router: InteractionRouter::new(),
            renderer: OffscreenRenderer::new(),
            host: LoggingEmbeddedHost,
            bridge,
            started: Instant::now(),
            pointer: None,
            frame_count: 0,
            demo_counter: 0,
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn cursor_ray(&self, x: f64, y: f64) -> Ray {
        let (w, h) = self.window_size;
        let ndc = Vec2::new(2.0 * x as f32 / w - 1.0, 1.0 - 2.0 * y as f32 / h);
        Ray::from_ndc(ndc, self.camera.inverse_view_proj())
    }

    fn handle_ai_event(&mut self, event: AiEvent) {
        match event {
            AiEvent::RenderContent { content, title } => {
                self.bridge.open_content(
                    &content,
                    title.as_deref(),
                    &mut self.registry,
                    &self.camera.pose(),
                    &self.config,
                    &self.renderer,
                    &self.host,
                );
            }
            AiEvent::ExecuteTask {
                task,
                structured_task,
            } => {
                let bridge = self.bridge.clone();
                tokio::spawn(async move {
                    let outcome = bridge.execute_task(task, structured_task).await;
                    if outcome.success {
                        info!(result = ?outcome.result, "task completed");
                    } else {
                        warn!(error = ?outcome.error, "task failed");
                    }
                });
            }
        }
    }

    fn apply_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Move { panel, position } => {
                    if let Some(p) = self.registry.find_mut(panel) {
                        p.apply_drag(position);
                    }
                }
                Command::Resize { panel, size } => {
                    if let Some(p) = self.registry.find_mut(panel) {
                        p.apply_resize(size, &self.config.style);
                    }
                }
                Command::DepthScroll { panel, delta } => {
                    let viewer = self.camera.pose();
                    if let Some(p) = self.registry.find_mut(panel) {
                        p.apply_depth_scroll(delta, viewer.position, &self.config.interact);
                    }
                }
                Command::Close { panel } => {
                    self.registry.remove(panel, &self.renderer);
                }
                Command::ContentClick { panel, x, y } => {
                    if let Some(p) = self.registry.find_mut(panel) {
                        p.dispatch_content_click(x, y, &self.renderer);
                    }
                }
            }
        }
    }

    /// Once-per-frame scene advance: pump pending content, re-render panels
    /// whose backing changed, run the gesture update, then billboard.
    fn tick(&mut self) {
        for panel in self.registry.iter_mut() {
            panel.poll_content(&self.config.style);
            if panel.take_needs_refresh() {
                panel.refresh_content(&self.renderer, &self.config.style);
            }
        }

        let viewer = self.camera.pose();
        let commands = self.router.update(&viewer, &self.registry, &self.config);
        self.apply_commands(commands);

        if self.config.interact.billboard {
            let skip = match self.router.gesture() {
                Gesture::Dragging(id) if !self.config.interact.billboard_while_dragging => {
                    Some(id)
                }
                _ => None,
            };
            for panel in self.registry.iter_mut() {
                if Some(panel.id()) == skip {
                    continue;
                }
                panel.face_towards(viewer.position);
            }
        }

        self.frame_count += 1;
        if self.frame_count % 300 == 0 {
            debug!(
                frames = self.frame_count,
                panels = self.registry.len(),
                "tick heartbeat"
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("AR Window Workspace")
            .with_inner_size(PhysicalSize::new(1920, 1080));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!(?e, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.window_size = (size.width as f32, size.height as f32);
        self.camera.aspect_ratio = size.width as f32 / size.height as f32;

        window.request_redraw();
        self.window = Some(window);
        info!("application initialized");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Err(e) = arwm_config::save_config(&self.config) {
                    error!(?e, "failed to save config");
                }
                self.registry.destroy_all(&self.renderer);
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    self.window_size = (size.width as f32, size.height as f32);
                    self.camera.aspect_ratio = size.width as f32 / size.height as f32;
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::KeyT) => {
                            self.demo_counter += 1;
                            let n = self.demo_counter;
                            self.handle_ai_event(AiEvent::RenderContent {
                                content: format!("<h1>Panel {n}</h1><p>demo content</p>"),
                                title: Some(format!("Demo {n}")),
                            });
                        }
                        PhysicalKey::Code(KeyCode::KeyU) => {
                            self.handle_ai_event(AiEvent::RenderContent {
                                content: "https://example.com".to_string(),
                                title: Some("Example".to_string()),
                            });
                        }
                        PhysicalKey::Code(KeyCode::KeyB) => {
                            self.handle_ai_event(AiEvent::ExecuteTask {
                                task: Some("summarize the open panels".to_string()),
                                structured_task: None,
                            });
                        }
                        PhysicalKey::Code(KeyCode::Escape) => {
                            event_loop.exit();
                        }
                        _ => {}
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let ray = self.cursor_ray(position.x, position.y);
                self.pointer = Some(ray);
                self.router.on_move(ray);
            }

            WindowEvent::MouseInput { button, state, .. } => {
                if button != MouseButton::Left {
                    return;
                }
                match state {
                    ElementState::Pressed => {
                        if let Some(ray) = self.pointer {
                            let viewer = self.camera.pose();
                            let commands = self.router.on_press(
                                ray,
                                self.now_ms(),
                                &viewer,
                                &self.registry,
                                &self.config,
                            );
                            self.apply_commands(commands);
                        }
                    }
                    ElementState::Released => {
                        let commands = self.router.on_release(self.now_ms(), &self.config);
                        self.apply_commands(commands);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.tick();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arwm=info,arwm_scene=info,arwm_tasks=info".into()),
        )
        .init();

    info!("AR window workspace starting");

    let config = arwm_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "failed to load config, using defaults");
        AppConfig::default()
    });

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
