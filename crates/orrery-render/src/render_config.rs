//! Per-frame render settings.
//!
//! Input handling edits a pending [`RenderConfig`]; the renderer copies it once
//! per frame and never observes a change mid-frame.

/// Screen-space effects applied when resolving the offscreen image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcessFlags {
    pub grayscale: bool,
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,
    pub blur: bool,
}

impl PostProcessFlags {
    pub fn any(&self) -> bool {
        self.grayscale || self.mirror_horizontal || self.mirror_vertical || self.blur
    }

    /// Packed as `vec4<u32>`: grayscale, mirror-h, mirror-v, blur.
    pub fn to_bits(self) -> [u32; 4] {
        [
            self.grayscale as u32,
            self.mirror_horizontal as u32,
            self.mirror_vertical as u32,
            self.blur as u32,
        ]
    }
}

/// Lighting model for non-emissive bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShadingMode {
    #[default]
    Standard,
    /// Diffuse term quantized into bands.
    Cel,
}

/// Immutable settings snapshot for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub post: PostProcessFlags,
    pub shading: ShadingMode,
    pub orbit_rings: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            post: PostProcessFlags::default(),
            shading: ShadingMode::Standard,
            orbit_rings: true,
        }
    }
}
