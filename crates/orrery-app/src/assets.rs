//! GPU-backed asset loading for the scene builder.

use std::path::{Path, PathBuf};

use orrery_render::{MeshStore, TextureStore, icosphere, load_image, load_obj};
use orrery_scene::{AssetLoadError, AssetSource, MeshHandle, TextureHandle, TextureRole};
use tracing::info;

use crate::error::AssetError;

/// Subdivision level of the built-in sphere.
pub const SPHERE_SUBDIVISIONS: u32 = 4;

/// Texture format for a role: color maps are sRGB, normal maps are linear.
pub fn texture_format(role: TextureRole) -> wgpu::TextureFormat {
    match role {
        TextureRole::Diffuse => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureRole::Normal => wgpu::TextureFormat::Rgba8Unorm,
    }
}

/// Cache key for a texture file in a given role.
pub fn texture_key(path: &Path, role: TextureRole) -> String {
    match role {
        TextureRole::Diffuse => path.display().to_string(),
        TextureRole::Normal => format!("{} (normal)", path.display()),
    }
}

/// Uploads meshes and textures as the builder asks for them.
pub struct GpuAssets<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub meshes: &'a mut MeshStore,
    pub textures: &'a mut TextureStore,
}

impl GpuAssets<'_> {
    fn load_mesh(&mut self, path: Option<&Path>) -> Result<MeshHandle, AssetError> {
        let (data, label) = match path {
            Some(path) => (load_obj(path)?, path.display().to_string()),
            None => (icosphere(SPHERE_SUBDIVISIONS), "icosphere".to_string()),
        };
        let handle = self.meshes.insert(data.upload(self.device, &label));
        info!(
            "Mesh '{label}' resident as {handle:?} ({} triangles)",
            data.triangle_count()
        );
        Ok(handle)
    }

    fn load_texture(&mut self, path: &Path, role: TextureRole) -> Result<TextureHandle, AssetError> {
        let key = texture_key(path, role);
        if let Some(handle) = self.textures.handle(&key) {
            return Ok(handle);
        }
        let image = load_image(path)?;
        Ok(self.textures.create_texture(
            self.device,
            self.queue,
            &key,
            &image,
            texture_format(role),
            true,
        )?)
    }

    fn load_cubemap(&mut self, faces: &[PathBuf; 6]) -> Result<TextureHandle, AssetError> {
        let images = [
            load_image(&faces[0])?,
            load_image(&faces[1])?,
            load_image(&faces[2])?,
            load_image(&faces[3])?,
            load_image(&faces[4])?,
            load_image(&faces[5])?,
        ];
        Ok(self
            .textures
            .create_cubemap(self.device, self.queue, "skybox", &images)?)
    }
}

impl AssetSource for GpuAssets<'_> {
    fn mesh(&mut self, path: Option<&Path>) -> Result<MeshHandle, AssetLoadError> {
        Ok(self.load_mesh(path)?)
    }

    fn texture(&mut self, path: &Path, role: TextureRole) -> Result<TextureHandle, AssetLoadError> {
        Ok(self.load_texture(path, role)?)
    }

    fn cubemap(&mut self, faces: &[PathBuf; 6]) -> Result<TextureHandle, AssetLoadError> {
        Ok(self.load_cubemap(faces)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_maps_are_linear() {
        assert!(texture_format(TextureRole::Diffuse).is_srgb());
        assert!(!texture_format(TextureRole::Normal).is_srgb());
    }

    #[test]
    fn test_same_file_in_two_roles_gets_two_keys() {
        let path = Path::new("textures/earth.jpg");
        assert_ne!(
            texture_key(path, TextureRole::Diffuse),
            texture_key(path, TextureRole::Normal)
        );
    }
}
