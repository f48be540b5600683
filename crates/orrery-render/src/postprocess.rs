//! Fullscreen resolve of the offscreen scene onto the swapchain, applying
//! the screen-space toggles.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::buffer::BufferAllocator;
use crate::offscreen::OffscreenTarget;
use crate::pass::RenderPassBuilder;
use crate::render_config::PostProcessFlags;
use crate::shader::ShaderLibrary;

pub const POST_SHADER_SOURCE: &str = include_str!("../shaders/post.wgsl");

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PostUniform {
    pub flags: [u32; 4],
    /// xy = reciprocal target size.
    pub texel: [f32; 4],
}

static_assertions::assert_eq_size!(PostUniform, [u8; 32]);

impl PostUniform {
    pub fn new(flags: PostProcessFlags, width: u32, height: u32) -> Self {
        Self {
            flags: flags.to_bits(),
            texel: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32, 0.0, 0.0],
        }
    }
}

pub struct PostProcessPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
}

impl PostProcessPass {
    pub fn new(
        device: &wgpu::Device,
        shaders: &mut ShaderLibrary,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = shaders.load(device, "post", POST_SHADER_SOURCE);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<PostUniform>() as u64),
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("post-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let uniform_buffer =
            BufferAllocator::new(device).create_uniform("post-uniform", &PostUniform::default());

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            uniform_buffer,
            bind_group: None,
        }
    }

    /// Rebinds the source texture. Call after the offscreen target is created
    /// or resized.
    pub fn bind_source(&mut self, device: &wgpu::Device, source: &OffscreenTarget) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        }));
    }

    pub fn update(&self, queue: &wgpu::Queue, flags: PostProcessFlags, size: (u32, u32)) {
        let uniform = PostUniform::new(flags, size.0, size.1);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draws the resolved image into `target`. Returns `false` when no source
    /// is bound.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) -> bool {
        let Some(bind_group) = &self.bind_group else {
            return false;
        };
        let mut pass = RenderPassBuilder::new()
            .label("post-process-pass")
            .begin(encoder, target);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_texel_size() {
        let uniform = PostUniform::new(PostProcessFlags::default(), 800, 400);
        assert_eq!(uniform.texel[0], 1.0 / 800.0);
        assert_eq!(uniform.texel[1], 1.0 / 400.0);
        assert_eq!(uniform.flags, [0; 4]);
    }

    #[test]
    fn test_uniform_guards_zero_size() {
        let uniform = PostUniform::new(
            PostProcessFlags {
                grayscale: true,
                ..Default::default()
            },
            0,
            0,
        );
        assert_eq!(uniform.texel[..2], [1.0, 1.0]);
        assert_eq!(uniform.flags[0], 1);
    }
}
