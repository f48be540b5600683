//! The winit application: window, GPU context, input and the render loop.

use std::path::Path;
use std::sync::Arc;

use orrery_config::Config;
use orrery_input::{InputMap, KeyboardState, MouseState};
use orrery_render::{
    Camera, ContextOptions, PostProcessFlags, RenderConfig, RenderContext, ShadingMode,
    SurfaceError, init_render_context_blocking,
};
use orrery_scene::{Clock, SceneGraph, SolarSystemDesc, SystemClock};
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::controls::{self, ControlSettings};
use crate::error::AppError;
use crate::platform::{PlatformDirs, preferred_backends};
use crate::renderer::SceneRenderer;

/// Window attributes from the `window` config section.
pub fn window_attributes(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Startup render settings from the `graphics` config section.
pub fn initial_render_config(config: &Config) -> RenderConfig {
    let graphics = &config.graphics;
    RenderConfig {
        post: PostProcessFlags {
            grayscale: graphics.grayscale,
            mirror_horizontal: graphics.mirror_horizontal,
            mirror_vertical: graphics.mirror_vertical,
            blur: graphics.blur,
        },
        shading: if graphics.cel_shading {
            ShadingMode::Cel
        } else {
            ShadingMode::Standard
        },
        orbit_rings: graphics.orbit_rings,
    }
}

/// Starting camera from the `camera` config section.
pub fn initial_camera(config: &Config) -> Camera {
    let cam = &config.camera;
    let mut camera = Camera::looking_at_origin(cam.start_distance);
    camera.fov_y = cam.fov_degrees.to_radians();
    camera.near = cam.near;
    camera.far = cam.far;
    camera.set_aspect_ratio(config.window.width as f32, config.window.height as f32);
    camera
}

/// Asset locations for the solar-system builder.
pub fn scene_desc(config: &Config, base: &Path) -> SolarSystemDesc {
    let resource_dir = config.resource_dir(base);
    let mut desc = SolarSystemDesc::new(&resource_dir);
    desc.mesh = config
        .assets
        .sphere_model
        .as_ref()
        .map(|model| resource_dir.join(model));
    if !config.assets.skybox {
        desc.skybox_dir = None;
    }
    desc
}

/// Application state. GPU resources are declared before the window so they
/// drop first.
pub struct App {
    renderer: Option<SceneRenderer>,
    gpu: Option<RenderContext>,
    window: Option<Arc<Window>>,
    graph: Option<SceneGraph>,
    config: Config,
    dirs: PlatformDirs,
    input_map: InputMap,
    keyboard: KeyboardState,
    mouse: MouseState,
    camera: Camera,
    controls: ControlSettings,
    clock: SystemClock,
    /// Edited by input; copied once per frame.
    pending: RenderConfig,
    startup_error: Option<AppError>,
}

impl App {
    pub fn new(config: Config, dirs: PlatformDirs) -> Self {
        let input_map = InputMap::with_overrides(&config.input.keybindings);
        for conflict in input_map.detect_conflicts() {
            warn!(
                "{:?} is bound to several actions: {:?}",
                conflict.binding, conflict.actions
            );
        }
        let clock = if config.simulation.start_paused {
            SystemClock::paused(config.simulation.time_scale)
        } else {
            SystemClock::new(config.simulation.time_scale)
        };

        Self {
            renderer: None,
            gpu: None,
            window: None,
            graph: None,
            input_map,
            keyboard: KeyboardState::new(),
            mouse: MouseState::new(),
            camera: initial_camera(&config),
            controls: ControlSettings::from_config(&config.camera, &config.input),
            clock,
            pending: initial_render_config(&config),
            startup_error: None,
            config,
            dirs,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn pending_render_config(&self) -> RenderConfig {
        self.pending
    }

    /// Opens the window, brings up the GPU and builds the scene.
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes(&self.config))?);
        let gpu = init_render_context_blocking(
            window.clone(),
            ContextOptions {
                backends: preferred_backends(),
                vsync: self.config.window.vsync,
            },
        )?;
        let (width, height) = gpu.size();
        self.camera.set_aspect_ratio(width as f32, height as f32);

        let mut renderer = SceneRenderer::new(&gpu, &self.config)?;
        let graph = renderer.load_scene(&gpu, &scene_desc(&self.config, Path::new(".")))?;
        if self.config.debug.print_scene_graph {
            info!("Scene graph:\n{graph}");
        }
        info!(
            "Started: {}x{}, config {}, logs {}",
            width,
            height,
            self.dirs.config_dir.display(),
            self.dirs.log_dir.display()
        );

        self.graph = Some(graph);
        self.renderer = Some(renderer);
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        // Minimized windows report zero; keep the old targets.
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect_ratio(width as f32, height as f32);
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(gpu, width, height);
            }
        }
        info!("Window resized to {width}x{height}");
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let actions = self.input_map.resolve(&self.keyboard);
        let outcome = controls::apply(
            &actions,
            self.mouse.steps(),
            &self.controls,
            &mut self.camera,
            &mut self.pending,
        );
        self.keyboard.clear_transients();
        self.mouse.clear_transients();

        if outcome.quit {
            info!("Quit requested");
            event_loop.exit();
            return;
        }
        if outcome.toggle_pause {
            self.clock.toggle_pause();
            info!(
                "Simulation {} at t = {:.2}s",
                if self.clock.is_paused() { "paused" } else { "resumed" },
                self.clock.elapsed_secs()
            );
        }
        if outcome.print_graph
            && let Some(graph) = &self.graph
        {
            info!("Scene graph:\n{graph}");
        }

        let settings = self.pending;
        if let (Some(gpu), Some(renderer), Some(graph)) =
            (&mut self.gpu, &mut self.renderer, &self.graph)
        {
            match renderer.render(gpu, graph, &self.camera, &self.clock, settings) {
                Ok(()) => {}
                Err(SurfaceError::Lost) => {
                    let (width, height) = gpu.size();
                    gpu.resize(width, height);
                }
                Err(SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory");
                    event_loop.exit();
                    return;
                }
                Err(SurfaceError::Timeout) => warn!("Surface timeout, skipping frame"),
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("Startup failed: {e}");
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.keyboard.process_event(&event),
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorEntered { .. } => self.mouse.on_cursor_entered(),
            WindowEvent::CursorLeft { .. } => self.mouse.on_cursor_left(),
            WindowEvent::Focused(false) => self.keyboard.reset(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event
            && self.mouse.cursor_in_window()
        {
            self.mouse.on_raw_motion(delta.0, delta.1);
        }
    }
}

/// Runs the viewer until the window closes. Blocks.
#[instrument(skip_all)]
pub fn run(config: Config, dirs: PlatformDirs) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, dirs);
    event_loop.run_app(&mut app)?;
    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
