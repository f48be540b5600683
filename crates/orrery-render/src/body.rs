//! Body pipeline: textured spheres lit by the scene's point light, or
//! emissive for the sun.
//!
//! Bind groups: frame (0), per-body uniform with a dynamic offset (1), and
//! material textures (2).

use bytemuck::{Pod, Zeroable};
use orrery_scene::{DrawItem, Shading, TextureHandle};
use rustc_hash::FxHashMap;

use crate::buffer::{DynamicUniformBuffer, MeshVertex};
use crate::depth::depth_stencil_state;
use crate::frame::FrameUniforms;
use crate::mesh::MeshStore;
use crate::render_config::ShadingMode;
use crate::shader::ShaderLibrary;
use crate::texture::TextureStore;

pub const BODY_SHADER_SOURCE: &str = include_str!("../shaders/body.wgsl");

/// Per-draw body data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BodyUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of view * model.
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// emissive, has normal map, cel shading, has diffuse texture.
    pub flags: [u32; 4],
}

static_assertions::assert_eq_size!(BodyUniform, [u8; 160]);

impl BodyUniform {
    pub fn from_draw(item: &DrawItem, shading: ShadingMode) -> Self {
        Self {
            model: item.model.to_cols_array_2d(),
            normal: item.normal.to_cols_array_2d(),
            color: item.color.extend(1.0).to_array(),
            flags: [
                (item.shading == Shading::Emissive) as u32,
                item.normal_texture.is_some() as u32,
                (shading == ShadingMode::Cel) as u32,
                item.texture.is_some() as u32,
            ],
        }
    }
}

type MaterialKey = (TextureHandle, TextureHandle);

fn material_key(item: &DrawItem, textures: &TextureStore) -> MaterialKey {
    let resident = |handle: Option<TextureHandle>| handle.filter(|&h| textures.get(h).is_some());
    (
        resident(item.texture).unwrap_or(textures.white()),
        resident(item.normal_texture).unwrap_or(textures.flat_normal()),
    )
}

pub struct BodyPipeline {
    pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    uniforms: DynamicUniformBuffer<BodyUniform>,
    materials: FxHashMap<MaterialKey, wgpu::BindGroup>,
}

impl BodyPipeline {
    pub fn new(
        device: &wgpu::Device,
        shaders: &mut ShaderLibrary,
        frame: &FrameUniforms,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = shaders.load(device, "body", BODY_SHADER_SOURCE);

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("body-object-bgl"),
            entries: &[DynamicUniformBuffer::<BodyUniform>::layout_entry(
                wgpu::ShaderStages::VERTEX_FRAGMENT,
            )],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("body-material-bgl"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("body-pipeline-layout"),
            bind_group_layouts: &[frame.bind_group_layout(), &object_layout, &material_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("body-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil_state(true)),
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

        let uniforms = DynamicUniformBuffer::new(device, &object_layout, "body-uniforms", 16);

        Self {
            pipeline,
            object_layout,
            material_layout,
            uniforms,
            materials: FxHashMap::default(),
        }
    }

    /// Uploads per-body uniforms and builds any missing material bind groups.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        textures: &TextureStore,
        bodies: &[DrawItem],
        shading: ShadingMode,
    ) {
        let uniforms: Vec<BodyUniform> = bodies
            .iter()
            .map(|item| BodyUniform::from_draw(item, shading))
            .collect();
        self.uniforms.write(device, queue, &self.object_layout, &uniforms);

        for item in bodies {
            let key = material_key(item, textures);
            if self.materials.contains_key(&key) {
                continue;
            }
            let (Some(diffuse), Some(normal)) = (textures.get(key.0), textures.get(key.1)) else {
                continue;
            };
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("body-material-bg"),
                layout: &self.material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&diffuse.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&normal.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(textures.sampler()),
                    },
                ],
            });
            self.materials.insert(key, bind_group);
        }
    }

    /// Records one indexed draw per body, in list order. Call after
    /// [`prepare`](Self::prepare) with the same `bodies`.
    pub fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        frame: &'a FrameUniforms,
        meshes: &'a MeshStore,
        textures: &TextureStore,
        bodies: &[DrawItem],
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame.bind_group(), &[]);

        for (index, item) in bodies.iter().enumerate() {
            let Some(mesh) = meshes.get(item.mesh) else {
                log::debug!("skipping body {}: mesh {:?} not resident", item.node, item.mesh);
                continue;
            };
            let Some(material) = self.materials.get(&material_key(item, textures)) else {
                continue;
            };
            pass.set_bind_group(1, self.uniforms.bind_group(), &[self.uniforms.offset(index)]);
            pass.set_bind_group(2, material, &[]);
            mesh.bind(pass);
            mesh.draw(pass);
        }
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
