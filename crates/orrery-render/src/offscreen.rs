//! Offscreen color + depth target the scene is drawn into before the
//! post-process resolve.

use crate::depth::DepthBuffer;
use crate::pass::RenderPassBuilder;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OffscreenError {
    #[error("offscreen target has zero size ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },

    #[error("format {0:?} cannot be both rendered to and sampled on this adapter")]
    UnsupportedFormat(wgpu::TextureFormat),
}

const REQUIRED_USAGES: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING);

/// Rejects sizes the target cannot be created with.
pub fn validate_size(width: u32, height: u32) -> Result<(), OffscreenError> {
    if width == 0 || height == 0 {
        return Err(OffscreenError::ZeroSize { width, height });
    }
    Ok(())
}

/// Checks that `format` can be rendered to and then sampled.
pub fn check_format(adapter: &wgpu::Adapter, format: wgpu::TextureFormat) -> Result<(), OffscreenError> {
    let features = adapter.get_texture_format_features(format);
    if features.allowed_usages.contains(REQUIRED_USAGES) {
        Ok(())
    } else {
        Err(OffscreenError::UnsupportedFormat(format))
    }
}

pub struct OffscreenTarget {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: DepthBuffer,
    format: wgpu::TextureFormat,
}

impl OffscreenTarget {
    pub fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, OffscreenError> {
        validate_size(width, height)?;
        check_format(adapter, format)?;
        let (color, color_view) = create_color(device, format, width, height);
        log::debug!("Created offscreen target {width}x{height} ({format:?})");
        Ok(Self {
            color,
            color_view,
            depth: DepthBuffer::new(device, width, height),
            format,
        })
    }

    /// Recreates the attachments. On error the previous attachments are kept.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<(), OffscreenError> {
        validate_size(width, height)?;
        if (width, height) == self.size() {
            return Ok(());
        }
        let (color, color_view) = create_color(device, self.format, width, height);
        self.color = color;
        self.color_view = color_view;
        self.depth.resize(device, width, height);
        Ok(())
    }

    /// Begins the scene pass: clears color and reverse-Z depth.
    pub fn begin_pass<'a>(&'a self, encoder: &'a mut wgpu::CommandEncoder) -> wgpu::RenderPass<'a> {
        RenderPassBuilder::new()
            .depth(&self.depth.view, DepthBuffer::CLEAR_VALUE)
            .label("offscreen-scene-pass")
            .begin(encoder, &self.color_view)
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> (u32, u32) {
        let size = self.color.size();
        (size.width, size.height)
    }
}

fn create_color(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen-color"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: REQUIRED_USAGES,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
