//! Skybox renderer: a cubemap drawn behind all scene geometry.
//!
//! A fullscreen triangle sits at the far plane and samples the cubemap along
//! each pixel's view ray, using the camera's rotation-only inverse
//! view-projection. Depth is tested but never written.

use orrery_render::{DepthBuffer, FrameUniforms, GpuTexture, ShaderLibrary};

pub const SKYBOX_SHADER_SOURCE: &str = include_str!("../shaders/skybox.wgsl");

/// Face file order expected by [`SkyboxRenderer::set_cubemap`]: +X, -X, +Y, -Y, +Z, -Z.
pub const FACE_ORDER: [&str; 6] = ["+X", "-X", "+Y", "-Y", "+Z", "-Z"];

/// Depth state for the sky: always passes, never writes.
pub fn skybox_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DepthBuffer::FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Always,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub struct SkyboxRenderer {
    pipeline: wgpu::RenderPipeline,
    cubemap_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    cubemap_bind_group: Option<wgpu::BindGroup>,
}

impl SkyboxRenderer {
    pub fn new(
        device: &wgpu::Device,
        shaders: &mut ShaderLibrary,
        frame: &FrameUniforms,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = shaders.load(device, "skybox", SKYBOX_SHADER_SOURCE);

        let cubemap_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox-cubemap-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox-pipeline-layout"),
            bind_group_layouts: &[frame.bind_group_layout(), &cubemap_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(skybox_depth_state()),
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            cubemap_layout,
            sampler,
            cubemap_bind_group: None,
        }
    }

    /// Binds the cube texture to sample. `cubemap.view` must be a cube view.
    pub fn set_cubemap(&mut self, device: &wgpu::Device, cubemap: &GpuTexture) {
        self.cubemap_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox-cubemap-bg"),
            layout: &self.cubemap_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
        log::info!(
            "Skybox bound: {}x{} cubemap",
            cubemap.dimensions.0,
            cubemap.dimensions.1
        );
    }

    pub fn has_cubemap(&self) -> bool {
        self.cubemap_bind_group.is_some()
    }

    /// Draws the sky. Does nothing until a cubemap is bound.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, frame: &'a FrameUniforms) {
        let Some(cubemap) = &self.cubemap_bind_group else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame.bind_group(), &[]);
        pass.set_bind_group(1, cubemap, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};
    use orrery_render::Camera;

    #[test]
    fn test_sky_never_writes_depth() {
        let state = skybox_depth_state();
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn test_far_plane_center_maps_to_view_direction() {
        let mut camera = Camera::looking_at_origin(20.0);
        camera.rotate_local(Vec3::Y, std::f32::consts::FRAC_PI_2);
        let world = camera.sky_inverse_view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let dir = (world.truncate() / world.w).normalize();
        assert!(dir.abs_diff_eq(camera.forward(), 1e-3), "got {dir}");
    }

    #[test]
    fn test_face_order_has_six_faces() {
        assert_eq!(FACE_ORDER.len(), 6);
    }
}
