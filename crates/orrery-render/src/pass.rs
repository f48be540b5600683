//! Render pass configuration and per-frame command encoding.
//!
//! [`RenderPassBuilder`] describes one pass's attachments and load behavior;
//! [`FrameEncoder`] owns the frame's command encoder and swapchain texture.

/// Deep-space clear color used behind the skybox.
pub const SPACE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.01,
    a: 1.0,
};

/// Configuration for depth stencil attachment.
#[derive(Debug, Clone, Copy)]
struct DepthAttachmentConfig<'a> {
    view: &'a wgpu::TextureView,
    /// `None` keeps the existing depth contents.
    clear_value: Option<f32>,
}

/// Builder for configuring render pass descriptors with a fluent API.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassBuilder<'a> {
    /// `None` keeps the existing color contents.
    clear_color: Option<wgpu::Color>,
    depth_attachment: Option<DepthAttachmentConfig<'a>>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RenderPassBuilder<'a> {
    /// A pass that clears to [`SPACE_BLACK`] and has no depth attachment.
    pub fn new() -> Self {
        Self {
            clear_color: Some(SPACE_BLACK),
            depth_attachment: None,
            label: None,
        }
    }

    /// Set the clear color for the color attachment.
    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = Some(color);
        self
    }

    /// Keep the color attachment's previous contents.
    pub fn load_color(mut self) -> Self {
        self.clear_color = None;
        self
    }

    /// Attach `view` as depth, cleared to `clear_value`.
    pub fn depth(mut self, view: &'a wgpu::TextureView, clear_value: f32) -> Self {
        self.depth_attachment = Some(DepthAttachmentConfig {
            view,
            clear_value: Some(clear_value),
        });
        self
    }

    /// Attach `view` as depth, keeping its previous contents.
    pub fn load_depth(mut self, view: &'a wgpu::TextureView) -> Self {
        self.depth_attachment = Some(DepthAttachmentConfig {
            view,
            clear_value: None,
        });
        self
    }

    /// Set debug label for the render pass.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn color_load(&self) -> wgpu::LoadOp<wgpu::Color> {
        self.clear_color.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear)
    }

    /// Begin the pass on `encoder`, drawing into `color_view`.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: &'encoder wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: self.color_load(),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        let depth_stencil_attachment =
            self.depth_attachment
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth.clear_value.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// One frame's command encoder plus the swapchain texture it will present.
pub struct FrameEncoder {
    encoder: wgpu::CommandEncoder,
    surface_texture: wgpu::SurfaceTexture,
    surface_view: wgpu::TextureView,
}

impl FrameEncoder {
    pub fn new(device: &wgpu::Device, surface_texture: wgpu::SurfaceTexture) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            encoder,
            surface_texture,
            surface_view,
        }
    }

    /// Encoder and swapchain view, borrowed together for pass recording.
    pub fn parts(&mut self) -> (&mut wgpu::CommandEncoder, &wgpu::TextureView) {
        (&mut self.encoder, &self.surface_view)
    }

    /// Begin a pass that draws straight into the swapchain texture.
    pub fn begin_surface_pass<'a>(
        &'a mut self,
        builder: &RenderPassBuilder<'a>,
    ) -> wgpu::RenderPass<'a> {
        builder.begin(&mut self.encoder, &self.surface_view)
    }

    /// Submit the recorded commands and present. Consumes the frame.
    pub fn submit(self, queue: &wgpu::Queue) {
        queue.submit([self.encoder.finish()]);
        self.surface_texture.present();
    }
}
