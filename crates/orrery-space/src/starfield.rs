//! Procedural starfield: a seeded point cloud in a spherical shell around
//! the sun, drawn as GPU points.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use orrery_render::{BufferAllocator, FrameUniforms, ShaderLibrary, VertexBuffer, depth_stencil_state};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const STARS_SHADER_SOURCE: &str = include_str!("../shaders/stars.wgsl");

/// One generated star.
#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    pub position: Vec3,
    /// In `[0, 1]`; most stars are dim.
    pub brightness: f32,
    pub color: [f32; 3],
}

/// Deterministic star placement. The same parameters always give the same
/// stars.
#[derive(Clone, Debug, PartialEq)]
pub struct StarfieldGenerator {
    seed: u64,
    star_count: u32,
    inner_radius: f32,
    outer_radius: f32,
}

impl StarfieldGenerator {
    /// Stars are placed between `inner_radius` and `outer_radius` from the
    /// origin. The radii are swapped if given in the wrong order.
    pub fn new(seed: u64, star_count: u32, inner_radius: f32, outer_radius: f32) -> Self {
        Self {
            seed,
            star_count,
            inner_radius: inner_radius.min(outer_radius),
            outer_radius: inner_radius.max(outer_radius),
        }
    }

    pub fn generate(&self) -> Vec<Star> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..self.star_count)
            .map(|_| {
                let theta = rng.random::<f32>() * std::f32::consts::TAU;
                let phi = (1.0 - 2.0 * rng.random::<f32>()).acos();
                let direction =
                    Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                let distance = self.inner_radius
                    + rng.random::<f32>() * (self.outer_radius - self.inner_radius);

                // Power law: many dim, few bright.
                let brightness = rng.random::<f32>().powf(4.0);
                let temperature = 2000.0 + brightness * 28000.0;

                Star {
                    position: direction * distance,
                    brightness,
                    color: blackbody_to_rgb(temperature),
                }
            })
            .collect()
    }
}

/// Approximate sRGB color of a blackbody at `temperature_k` Kelvin
/// (Tanner Helland fit).
pub fn blackbody_to_rgb(temperature_k: f32) -> [f32; 3] {
    let t = temperature_k / 100.0;
    let r = if t <= 66.0 {
        1.0
    } else {
        (329.698_73 * (t - 60.0).powf(-0.133_204_76) / 255.0).clamp(0.0, 1.0)
    };
    let g = if t <= 66.0 {
        (99.470_8 * t.ln() - 161.119_57).clamp(0.0, 255.0) / 255.0
    } else {
        (288.122_17 * (t - 60.0).powf(-0.075_514_85) / 255.0).clamp(0.0, 1.0)
    };
    let b = if t >= 66.0 {
        1.0
    } else if t <= 19.0 {
        0.0
    } else {
        (138.517_73 * (t - 10.0).ln() - 305.044_8).clamp(0.0, 255.0) / 255.0
    };
    [r, g, b]
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl StarVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StarVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Dim stars are lifted so every star stays visible.
    pub fn from_star(star: &Star) -> Self {
        let gain = 0.35 + 0.65 * star.brightness;
        Self {
            position: star.position.to_array(),
            color: star.color.map(|c| c * gain),
        }
    }
}

/// Draws the generated stars as a point list. Depth-tested against bodies,
/// never writes depth.
pub struct StarfieldRenderer {
    pipeline: wgpu::RenderPipeline,
    vertices: VertexBuffer,
}

impl StarfieldRenderer {
    pub fn new(
        device: &wgpu::Device,
        shaders: &mut ShaderLibrary,
        frame: &FrameUniforms,
        color_format: wgpu::TextureFormat,
        stars: &[Star],
    ) -> Self {
        let shader = shaders.load(device, "stars", STARS_SHADER_SOURCE);

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stars-pipeline-layout"),
            bind_group_layouts: &[frame.bind_group_layout()],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("stars-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[StarVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil_state(false)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let vertex_data: Vec<StarVertex> = stars.iter().map(StarVertex::from_star).collect();
        let vertices = BufferAllocator::new(device).create_vertices("starfield", &vertex_data);
        log::info!("Starfield initialized: {} stars", vertex_data.len());

        Self { pipeline, vertices }
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, frame: &'a FrameUniforms) {
        if self.vertices.vertex_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame.bind_group(), &[]);
        self.vertices.bind(pass);
        self.vertices.draw(pass);
    }

    pub fn star_count(&self) -> u32 {
        self.vertices.vertex_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_count() {
        assert_eq!(StarfieldGenerator::new(42, 2000, 60.0, 120.0).generate().len(), 2000);
        assert!(StarfieldGenerator::new(42, 0, 60.0, 120.0).generate().is_empty());
    }

    #[test]
    fn test_stars_lie_in_shell() {
        for star in StarfieldGenerator::new(42, 5000, 60.0, 120.0).generate() {
            let d = star.position.length();
            assert!((60.0 - 1e-3..=120.0 + 1e-3).contains(&d), "star at distance {d}");
        }
    }

    #[test]
    fn test_swapped_radii_are_normalized() {
        let a = StarfieldGenerator::new(7, 10, 120.0, 60.0);
        let b = StarfieldGenerator::new(7, 10, 60.0, 120.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_seed_produces_same_starfield() {
        let a = StarfieldGenerator::new(123, 1000, 60.0, 120.0).generate();
        let b = StarfieldGenerator::new(123, 1000, 60.0, 120.0).generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_produces_different_starfield() {
        let a = StarfieldGenerator::new(1, 1000, 60.0, 120.0).generate();
        let b = StarfieldGenerator::new(9999, 1000, 60.0, 120.0).generate();
        let differences = a
            .iter()
            .zip(&b)
            .filter(|(a, b)| (a.position - b.position).length() > 0.01)
            .count();
        assert!(differences > 500, "only {differences}/1000 stars differed");
    }

    #[test]
    fn test_distribution_covers_full_sky() {
        let stars = StarfieldGenerator::new(42, 5000, 60.0, 120.0).generate();
        let mut octants = [0u32; 8];
        for star in &stars {
            let p = star.position;
            let octant = ((p.x >= 0.0) as usize)
                | (((p.y >= 0.0) as usize) << 1)
                | (((p.z >= 0.0) as usize) << 2);
            octants[octant] += 1;
        }
        for (i, &count) in octants.iter().enumerate() {
            assert!((300..=900).contains(&count), "octant {i} has {count} stars");
        }
    }

    #[test]
    fn test_brightness_skews_dim() {
        let stars = StarfieldGenerator::new(42, 5000, 60.0, 120.0).generate();
        let dim = stars.iter().filter(|s| s.brightness < 0.1).count();
        let bright = stars.iter().filter(|s| s.brightness > 0.5).count();
        assert!(dim > bright * 3, "dim {dim} vs bright {bright}");
    }

    #[test]
    fn test_blackbody_endpoints() {
        let cool = blackbody_to_rgb(2000.0);
        assert!(cool[0] > cool[2]);
        let hot = blackbody_to_rgb(30000.0);
        assert!(hot[2] > 0.5);
        for c in cool.iter().chain(&hot) {
            assert!((0.0..=1.0).contains(c));
        }
    }

    #[test]
    fn test_vertex_gain_keeps_dim_stars_visible() {
        let star = Star {
            position: Vec3::X * 80.0,
            brightness: 0.0,
            color: [1.0, 1.0, 1.0],
        };
        let vertex = StarVertex::from_star(&star);
        assert_eq!(vertex.color, [0.35, 0.35, 0.35]);
        assert_eq!(vertex.position, [80.0, 0.0, 0.0]);
    }
}
