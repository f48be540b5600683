//! Bind group 0, shared by every scene pipeline: camera plus the point light.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use orrery_scene::LightItem;

use crate::buffer::BufferAllocator;
use crate::camera::{Camera, CameraUniform};

/// Point light in world space. `color.a` carries intensity.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(LightUniform, [u8; 32]);

impl LightUniform {
    /// A missing light yields zero intensity, leaving only ambient.
    pub fn from_item(light: Option<&LightItem>) -> Self {
        match light {
            Some(light) => Self {
                position: light.position.extend(1.0).to_array(),
                color: light.color.extend(light.intensity).to_array(),
            },
            None => Self::default(),
        }
    }
}

/// Camera and light buffers with their bind group.
pub struct FrameUniforms {
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl FrameUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<CameraUniform>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<LightUniform>() as u64),
                    },
                    count: None,
                },
            ],
        });

        let allocator = BufferAllocator::new(device);
        let camera_buffer =
            allocator.create_uniform("camera-uniform", &Camera::default().to_uniform());
        let light_buffer = allocator.create_uniform("light-uniform", &LightUniform::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bg"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            camera_buffer,
            light_buffer,
            bind_group_layout,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera, light: Option<&LightItem>) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera.to_uniform()));
        queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::bytes_of(&LightUniform::from_item(light)),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
