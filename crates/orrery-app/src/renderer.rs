//! Per-frame rendering of the scene graph.
//!
//! The scene is drawn into an offscreen color + depth target (sky, bodies,
//! orbit rings, stars) and then resolved onto the swapchain by the
//! post-process pass. If no offscreen target can be created the same scene
//! pass draws straight into the swapchain and post-processing is skipped.

use std::time::Instant;

use orrery_config::Config;
use orrery_render::{
    BodyPipeline, Camera, DepthBuffer, FrameEncoder, FrameUniforms, MeshStore, OffscreenTarget,
    OrbitPipeline, PostProcessPass, RenderConfig, RenderContext, RenderPassBuilder, ShaderLibrary,
    SurfaceError, TextureStore,
};
use orrery_scene::{
    Clock, DrawList, FrameTransforms, NodePayload, SceneBuildError, SceneGraph, SolarSystemDesc,
    build_solar_system,
};
use orrery_space::{SkyboxRenderer, StarfieldGenerator, StarfieldRenderer};
use tracing::{debug, info, instrument, warn};

use crate::assets::GpuAssets;
use crate::error::AppError;

/// Rolling frame-rate counter, reported every `interval` frames.
#[derive(Debug, Clone)]
pub struct FrameStats {
    interval: u32,
    frames: u32,
    window_start: Instant,
    total_frames: u64,
}

impl FrameStats {
    /// `interval == 0` disables reporting.
    pub fn new(interval: u32, now: Instant) -> Self {
        Self {
            interval,
            frames: 0,
            window_start: now,
            total_frames: 0,
        }
    }

    /// Counts a frame ending at `now`. Returns `(fps, mean frame ms)` when a
    /// reporting window closes.
    pub fn record(&mut self, now: Instant) -> Option<(f64, f64)> {
        self.total_frames += 1;
        if self.interval == 0 {
            return None;
        }
        self.frames += 1;
        if self.frames < self.interval {
            return None;
        }
        let secs = now.duration_since(self.window_start).as_secs_f64();
        let frames = f64::from(self.frames);
        self.frames = 0;
        self.window_start = now;
        if secs <= 0.0 {
            return None;
        }
        Some((frames / secs, secs * 1000.0 / frames))
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

/// Owns every GPU resource the viewer draws with.
pub struct SceneRenderer {
    shaders: ShaderLibrary,
    meshes: MeshStore,
    textures: TextureStore,
    frame: FrameUniforms,
    bodies: BodyPipeline,
    orbits: OrbitPipeline,
    skybox: SkyboxRenderer,
    stars: StarfieldRenderer,
    post: PostProcessPass,
    offscreen: Option<OffscreenTarget>,
    offscreen_enabled: bool,
    /// Depth for the direct-to-surface path.
    depth: DepthBuffer,
    draw_list: DrawList,
    stats: FrameStats,
}

impl SceneRenderer {
    /// Builds the pipelines and the starfield. Scene assets are loaded
    /// separately by [`load_scene`](Self::load_scene).
    #[instrument(skip_all)]
    pub fn new(ctx: &RenderContext, config: &Config) -> Result<Self, AppError> {
        let device = &ctx.device;
        let format = ctx.surface_format;
        let (width, height) = ctx.size();

        let mut shaders = ShaderLibrary::new();
        if let Some(dir) = &config.assets.shader_dir {
            shaders = shaders.with_shader_dir(dir.clone());
        }

        let textures = TextureStore::new(device, &ctx.queue)?;
        let frame = FrameUniforms::new(device);
        let bodies = BodyPipeline::new(device, &mut shaders, &frame, format);
        let orbits = OrbitPipeline::new(device, &mut shaders, &frame, format);
        let skybox = SkyboxRenderer::new(device, &mut shaders, &frame, format);

        let graphics = &config.graphics;
        let star_data = StarfieldGenerator::new(
            graphics.star_seed,
            graphics.star_count,
            graphics.star_min_radius,
            graphics.star_max_radius,
        )
        .generate();
        let stars = StarfieldRenderer::new(device, &mut shaders, &frame, format, &star_data);

        let mut renderer = Self {
            post: PostProcessPass::new(device, &mut shaders, format),
            shaders,
            meshes: MeshStore::new(),
            textures,
            frame,
            bodies,
            orbits,
            skybox,
            stars,
            offscreen: None,
            offscreen_enabled: graphics.offscreen,
            depth: DepthBuffer::new(device, width, height),
            draw_list: DrawList::default(),
            stats: FrameStats::new(config.debug.frame_log_interval, Instant::now()),
        };
        renderer.ensure_offscreen(ctx, width, height);
        info!(
            "Renderer ready: {} shaders, {}x{} ({:?}), post-process {}",
            renderer.shaders.len(),
            width,
            height,
            format,
            if renderer.offscreen.is_some() { "on" } else { "off" }
        );
        Ok(renderer)
    }

    /// Builds the solar system, uploading its assets, and binds the skybox.
    #[instrument(skip_all)]
    pub fn load_scene(
        &mut self,
        ctx: &RenderContext,
        desc: &SolarSystemDesc,
    ) -> Result<SceneGraph, SceneBuildError> {
        let mut assets = GpuAssets {
            device: &ctx.device,
            queue: &ctx.queue,
            meshes: &mut self.meshes,
            textures: &mut self.textures,
        };
        let graph = build_solar_system(&mut assets, desc)?;

        if let Some((_, node)) = graph.find_skybox()
            && let NodePayload::Skybox { cubemap: handle } = node.payload
            && let Some(cubemap) = self.textures.get(handle)
        {
            self.skybox.set_cubemap(&ctx.device, cubemap);
        }
        info!(
            "Scene '{}' loaded: {} meshes, {} textures",
            graph.name(),
            self.meshes.len(),
            self.textures.len()
        );
        Ok(graph)
    }

    /// Creates or resizes the offscreen target. Failure falls back to direct
    /// rendering until the next resize.
    fn ensure_offscreen(&mut self, ctx: &RenderContext, width: u32, height: u32) {
        if !self.offscreen_enabled {
            return;
        }
        let result = if let Some(target) = &mut self.offscreen {
            target.resize(&ctx.device, width, height)
        } else {
            OffscreenTarget::new(&ctx.device, &ctx.adapter, ctx.surface_format, width, height)
                .map(|target| self.offscreen = Some(target))
        };
        match result {
            Ok(()) => {
                if let Some(target) = &self.offscreen {
                    self.post.bind_source(&ctx.device, target);
                }
            }
            Err(e) => {
                warn!("Offscreen target unavailable ({e}); rendering directly without post-processing");
                self.offscreen = None;
            }
        }
    }

    pub fn resize(&mut self, ctx: &RenderContext, width: u32, height: u32) {
        self.depth.resize(&ctx.device, width, height);
        self.ensure_offscreen(ctx, width, height);
    }

    pub fn has_offscreen(&self) -> bool {
        self.offscreen.is_some()
    }

    /// Renders `graph` at the clock's current time with the `settings` snapshot.
    pub fn render(
        &mut self,
        ctx: &RenderContext,
        graph: &SceneGraph,
        camera: &Camera,
        clock: &dyn Clock,
        settings: RenderConfig,
    ) -> Result<(), SurfaceError> {
        let transforms = FrameTransforms::sample(graph, clock);
        self.draw_list = DrawList::build(graph, &transforms, camera.view_matrix());
        if !settings.orbit_rings {
            self.draw_list.orbits.clear();
        }

        self.frame
            .update(&ctx.queue, camera, self.draw_list.light.as_ref());
        self.bodies.prepare(
            &ctx.device,
            &ctx.queue,
            &self.textures,
            &self.draw_list.bodies,
            settings.shading,
        );
        self.orbits
            .prepare(&ctx.device, &ctx.queue, &self.draw_list.orbits);

        let surface_texture = ctx.get_current_texture()?;
        let mut frame = FrameEncoder::new(&ctx.device, surface_texture);

        match &self.offscreen {
            Some(target) => {
                {
                    let (encoder, _) = frame.parts();
                    let mut pass = target.begin_pass(encoder);
                    self.record_scene(&mut pass);
                }
                self.post.update(&ctx.queue, settings.post, target.size());
                let (encoder, surface_view) = frame.parts();
                self.post.execute(encoder, surface_view);
            }
            None => {
                let builder = RenderPassBuilder::new()
                    .depth(&self.depth.view, DepthBuffer::CLEAR_VALUE)
                    .label("direct-scene-pass");
                let mut pass = frame.begin_surface_pass(&builder);
                self.record_scene(&mut pass);
            }
        }

        frame.submit(&ctx.queue);

        if let Some((fps, frame_ms)) = self.stats.record(Instant::now()) {
            debug!(
                "{fps:.1} fps ({frame_ms:.2} ms/frame), {} bodies, {} rings",
                self.draw_list.bodies.len(),
                self.draw_list.orbits.len()
            );
        }
        Ok(())
    }

    /// Sky first, then bodies, rings and stars against the depth they leave.
    fn record_scene<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if self.draw_list.skybox.is_some() {
            self.skybox.render(pass, &self.frame);
        }
        self.bodies.draw(
            pass,
            &self.frame,
            &self.meshes,
            &self.textures,
            &self.draw_list.bodies,
        );
        if !self.draw_list.orbits.is_empty() {
            self.orbits.draw(pass, &self.frame);
        }
        self.stars.render(pass, &self.frame);
    }

    pub fn frames_rendered(&self) -> u64 {
        self.stats.total_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stats_report_once_per_interval() {
        let start = Instant::now();
        let mut stats = FrameStats::new(3, start);
        assert!(stats.record(start + Duration::from_millis(10)).is_none());
        assert!(stats.record(start + Duration::from_millis(20)).is_none());
        let (fps, ms) = stats
            .record(start + Duration::from_millis(30))
            .expect("third frame closes the window");
        assert!((fps - 100.0).abs() < 1e-6);
        assert!((ms - 10.0).abs() < 1e-6);
        assert!(stats.record(start + Duration::from_millis(40)).is_none());
        assert_eq!(stats.total_frames(), 4);
    }

    #[test]
    fn test_stats_disabled() {
        let start = Instant::now();
        let mut stats = FrameStats::new(0, start);
        for i in 1..10 {
            assert!(stats.record(start + Duration::from_millis(i)).is_none());
        }
        assert_eq!(stats.total_frames(), 9);
    }
}
