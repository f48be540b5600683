//! Orbit rings: one shared unit circle drawn as a line strip per body.

use bytemuck::{Pod, Zeroable};
use orrery_scene::OrbitItem;

use crate::buffer::{BufferAllocator, DynamicUniformBuffer, LineVertex, VertexBuffer};
use crate::depth::depth_stencil_state;
use crate::frame::FrameUniforms;
use crate::mesh::unit_circle;
use crate::shader::ShaderLibrary;

pub const ORBIT_SHADER_SOURCE: &str = include_str!("../shaders/orbit.wgsl");

/// Segments in the shared ring.
pub const RING_SEGMENTS: u32 = 128;

/// Rings are drawn dimmer than the body they belong to.
const RING_BRIGHTNESS: f32 = 0.45;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OrbitUniform {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(OrbitUniform, [u8; 80]);

impl OrbitUniform {
    pub fn from_item(item: &OrbitItem) -> Self {
        Self {
            transform: item.transform.to_cols_array_2d(),
            color: (item.color * RING_BRIGHTNESS).extend(1.0).to_array(),
        }
    }
}

pub struct OrbitPipeline {
    pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    uniforms: DynamicUniformBuffer<OrbitUniform>,
    ring: VertexBuffer,
    count: usize,
}

impl OrbitPipeline {
    pub fn new(
        device: &wgpu::Device,
        shaders: &mut ShaderLibrary,
        frame: &FrameUniforms,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = shaders.load(device, "orbit", ORBIT_SHADER_SOURCE);

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("orbit-object-bgl"),
            entries: &[DynamicUniformBuffer::<OrbitUniform>::layout_entry(
                wgpu::ShaderStages::VERTEX_FRAGMENT,
            )],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("orbit-pipeline-layout"),
            bind_group_layouts: &[frame.bind_group_layout(), &object_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("orbit-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[LineVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
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

        let ring = BufferAllocator::new(device).create_vertices("orbit-ring", &unit_circle(RING_SEGMENTS));
        let uniforms = DynamicUniformBuffer::new(device, &object_layout, "orbit-uniforms", 16);

        Self {
            pipeline,
            object_layout,
            uniforms,
            ring,
            count: 0,
        }
    }

    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, orbits: &[OrbitItem]) {
        let uniforms: Vec<OrbitUniform> = orbits.iter().map(OrbitUniform::from_item).collect();
        self.uniforms.write(device, queue, &self.object_layout, &uniforms);
        self.count = uniforms.len();
    }

    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, frame: &'a FrameUniforms) {
        if self.count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame.bind_group(), &[]);
        self.ring.bind(pass);
        for index in 0..self.count {
            pass.set_bind_group(1, self.uniforms.bind_group(), &[self.uniforms.offset(index)]);
            self.ring.draw(pass);
        }
    }
}
