//! Image loading and GPU texture storage.
//!
//! [`TextureStore`] owns every body texture and cubemap, addresses them by
//! [`TextureHandle`], and deduplicates uploads by name.

use std::path::{Path, PathBuf};

use orrery_scene::TextureHandle;
use rustc_hash::FxHashMap;

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Channel count of the source file before expansion to RGBA.
    pub channels: u8,
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// A 1×1 image of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            channels: 4,
            bytes: rgba.to_vec(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to load image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "texture data size ({actual}) does not match expected ({expected}) for {width}x{height}"
    )]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// Cubemap faces must be square and share one size.
    #[error("cubemap face {face} is {width}x{height}, expected {expected}x{expected}")]
    CubemapFace {
        face: usize,
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// Decodes an image file into RGBA8.
pub fn load_image(path: &Path) -> Result<ImageData, TextureError> {
    let image = image::open(path).map_err(|source| TextureError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let channels = image.color().channel_count();
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("Decoded {} ({width}x{height}, {channels} channels)", path.display());
    Ok(ImageData {
        width,
        height,
        channels,
        bytes: rgba.into_raw(),
    })
}

/// Number of mip levels down to 1×1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// A texture resident on the GPU.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
}

/// Texture storage addressed by [`TextureHandle`].
pub struct TextureStore {
    textures: Vec<GpuTexture>,
    by_name: FxHashMap<String, TextureHandle>,
    sampler: wgpu::Sampler,
    white: TextureHandle,
    flat_normal: TextureHandle,
    mipmapper: Mipmapper,
}

impl TextureStore {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self, TextureError> {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("body-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        let mut store = Self {
            textures: Vec::new(),
            by_name: FxHashMap::default(),
            sampler,
            white: TextureHandle(0),
            flat_normal: TextureHandle(0),
            mipmapper: Mipmapper::new(device),
        };
        store.white = store.create_texture(
            device,
            queue,
            "white",
            &ImageData::solid([255; 4]),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            false,
        )?;
        store.flat_normal = store.create_texture(
            device,
            queue,
            "flat-normal",
            &ImageData::solid([128, 128, 255, 255]),
            wgpu::TextureFormat::Rgba8Unorm,
            false,
        )?;
        Ok(store)
    }

    /// Uploads a 2D texture, or returns the existing handle for `name`.
    pub fn create_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        image: &ImageData,
        format: wgpu::TextureFormat,
        generate_mipmaps: bool,
    ) -> Result<TextureHandle, TextureError> {
        if let Some(&handle) = self.by_name.get(name) {
            return Ok(handle);
        }
        validate(image)?;

        let (width, height) = (image.width, image.height);
        let mip_levels = if generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        write_layer(queue, &texture, image, 0);
        if mip_levels > 1 {
            self.mipmapper
                .generate(device, queue, &texture, format, mip_levels);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::info!("Created texture '{name}' ({width}x{height}, {mip_levels} mips)");
        Ok(self.insert(
            name,
            GpuTexture {
                texture,
                view,
                dimensions: (width, height),
                format,
                mip_level_count: mip_levels,
            },
        ))
    }

    /// Uploads six square faces ordered `+X, -X, +Y, -Y, +Z, -Z` as a cube
    /// texture.
    pub fn create_cubemap(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        faces: &[ImageData; 6],
    ) -> Result<TextureHandle, TextureError> {
        if let Some(&handle) = self.by_name.get(name) {
            return Ok(handle);
        }
        let size = faces[0].width;
        for (face, image) in faces.iter().enumerate() {
            validate(image)?;
            if image.width != size || image.height != size {
                return Err(TextureError::CubemapFace {
                    face,
                    width: image.width,
                    height: image.height,
                    expected: size,
                });
            }
        }

        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, image) in faces.iter().enumerate() {
            write_layer(queue, &texture, image, layer as u32);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(name),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        log::info!("Created cubemap '{name}' ({size}x{size})");
        Ok(self.insert(
            name,
            GpuTexture {
                texture,
                view,
                dimensions: (size, size),
                format,
                mip_level_count: 1,
            },
        ))
    }

    fn insert(&mut self, name: &str, texture: GpuTexture) -> TextureHandle {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        self.by_name.insert(name.to_string(), handle);
        handle
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn handle(&self, name: &str) -> Option<TextureHandle> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// 1×1 white, bound when a body has no diffuse texture.
    pub fn white(&self) -> TextureHandle {
        self.white
    }

    /// 1×1 (0.5, 0.5, 1.0), bound when a body has no normal map.
    pub fn flat_normal(&self) -> TextureHandle {
        self.flat_normal
    }
}

fn validate(image: &ImageData) -> Result<(), TextureError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if image.bytes.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: image.bytes.len(),
            expected,
            width,
            height,
        });
    }
    Ok(())
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, image: &ImageData, layer: u32) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &image.bytes,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
}

const BLIT_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var src_texture: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_texture, src_sampler, in.uv);
}
"#;

/// Downsamples mip chains with a fullscreen blit, one pipeline per format.
struct Mipmapper {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl Mipmapper {
    fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mipmap-bind-group-layout"),
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
            ],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mipmap-shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER_SOURCE.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mipmap-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("mipmap-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            shader,
            layout,
            bind_group_layout,
            sampler,
            pipelines: FxHashMap::default(),
        }
    }

    fn pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) -> &wgpu::RenderPipeline {
        let (shader, layout) = (&self.shader, &self.layout);
        self.pipelines.entry(format).or_insert_with(|| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("mipmap-pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        })
    }

    fn generate(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        format: wgpu::TextureFormat,
        mip_count: u32,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mipmap-encoder"),
        });
        let pipeline = self.pipeline(device, format).clone();

        for level in 1..mip_count {
            let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mipmap-bind-group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mipmap-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    fn checker(size: u32) -> ImageData {
        ImageData {
            width: size,
            height: size,
            channels: 4,
            bytes: vec![200; (size * size * 4) as usize],
        }
    }

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(512, 256), 10);
        assert_eq!(mip_level_count(1024, 1024), 11);
    }

    #[test]
    fn test_validate_rejects_bad_images() {
        let zero = ImageData {
            width: 0,
            height: 4,
            channels: 4,
            bytes: vec![],
        };
        assert!(matches!(validate(&zero), Err(TextureError::ZeroDimensions { .. })));
        let short = ImageData {
            width: 4,
            height: 4,
            channels: 4,
            bytes: vec![0; 32],
        };
        assert!(matches!(
            validate(&short),
            Err(TextureError::DataSizeMismatch { expected: 64, .. })
        ));
    }

    #[test]
    fn test_load_image_expands_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        image::GrayImage::from_pixel(3, 2, image::Luma([90])).save(&path).unwrap();

        let data = load_image(&path).unwrap();
        assert_eq!((data.width, data.height, data.channels), (3, 2, 1));
        assert_eq!(data.bytes.len(), 3 * 2 * 4);
        assert_eq!(&data.bytes[..4], &[90, 90, 90, 255]);
    }

    #[test]
    fn test_load_image_missing_file() {
        assert!(matches!(
            load_image(Path::new("/nonexistent/earth.png")),
            Err(TextureError::Image { .. })
        ));
    }

    #[test]
    fn test_store_deduplicates_by_name() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut store = TextureStore::new(&device, &queue).unwrap();
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let a = store
            .create_texture(&device, &queue, "earth", &checker(4), format, false)
            .unwrap();
        let b = store
            .create_texture(&device, &queue, "earth", &checker(4), format, false)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.handle("earth"), Some(a));
        // white + flat-normal + earth
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_mipmapped_texture_records_levels() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut store = TextureStore::new(&device, &queue).unwrap();
        let handle = store
            .create_texture(
                &device,
                &queue,
                "mipped",
                &checker(64),
                wgpu::TextureFormat::Rgba8UnormSrgb,
                true,
            )
            .unwrap();
        assert_eq!(store.get(handle).unwrap().mip_level_count, 7);
    }

    #[test]
    fn test_cubemap_rejects_mismatched_faces() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut store = TextureStore::new(&device, &queue).unwrap();
        let mut faces: [ImageData; 6] = std::array::from_fn(|_| checker(4));
        faces[3] = checker(8);
        let result = store.create_cubemap(&device, &queue, "sky", &faces);
        assert!(matches!(result, Err(TextureError::CubemapFace { face: 3, .. })));
    }
}
