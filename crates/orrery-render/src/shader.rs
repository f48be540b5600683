//! Shader module loading and caching.
//!
//! Every pipeline ships an embedded WGSL source. When a shader directory is
//! configured, `<dir>/<name>.wgsl` overrides the embedded copy, and
//! [`ShaderLibrary::reload`] re-reads it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },

    #[error("no shader directory configured for file-based loading")]
    NoShaderDir,
}

/// Registry of compiled shader modules keyed by name.
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
    shader_dir: Option<PathBuf>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            shader_dir: None,
        }
    }

    /// Directory searched for `<name>.wgsl` overrides.
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    pub fn shader_dir(&self) -> Option<&PathBuf> {
        self.shader_dir.as_ref()
    }

    /// Returns the cached module for `name`, compiling it on first use from the
    /// override file if one exists, else from `embedded`.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        embedded: &str,
    ) -> Arc<wgpu::ShaderModule> {
        if let Some(module) = self.get(name) {
            return module;
        }
        if let Some(path) = self.override_path(name) {
            match std::fs::read_to_string(&path) {
                Ok(source) => {
                    info!("Using shader override {}", path.display());
                    return self.load_from_source(device, name, &source);
                }
                Err(e) => warn!("Ignoring unreadable shader override {}: {e}", path.display()),
            }
        }
        self.load_from_source(device, name, embedded)
    }

    fn override_path(&self, name: &str) -> Option<PathBuf> {
        let path = self.shader_dir.as_ref()?.join(format!("{name}.wgsl"));
        path.is_file().then_some(path)
    }

    /// Compiles `source` and caches it under `name`, replacing any previous module.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Arc<wgpu::ShaderModule> {
        debug!("Compiling shader '{name}'");
        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        }));
        if self.modules.insert(name.to_string(), module.clone()).is_some() {
            info!("Replaced shader '{name}'");
        } else {
            info!("Loaded shader '{name}'");
        }
        module
    }

    /// Loads `filename` from the shader directory under `name`.
    pub fn load_from_file(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        filename: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        let shader_dir = self.shader_dir.as_ref().ok_or(ShaderError::NoShaderDir)?;
        let path = shader_dir.join(filename);
        if !path.exists() {
            return Err(ShaderError::FileNotFound { path });
        }
        let source = std::fs::read_to_string(&path)?;
        Ok(self.load_from_source(device, name, &source))
    }

    /// Re-reads `<dir>/<name>.wgsl` for a shader that is already loaded.
    pub fn reload(
        &mut self,
        device: &wgpu::Device,
        name: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        if !self.modules.contains_key(name) {
            return Err(ShaderError::NotLoaded {
                name: name.to_string(),
            });
        }
        info!("Reloading shader '{name}'");
        self.load_from_file(device, name, &format!("{name}.wgsl"))
    }

    pub fn get(&self, name: &str) -> Option<Arc<wgpu::ShaderModule>> {
        self.modules.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}
