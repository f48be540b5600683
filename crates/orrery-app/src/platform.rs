//! Platform directories and GPU backend selection.

use std::io;
use std::path::{Path, PathBuf};

/// Errors from resolving or creating platform directories.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

const APP_NAME: &str = "orrery";

/// OS-specific locations for the viewer's files.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformDirs {
    /// `config.ron` and key bindings.
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    /// Shader overrides and other caches.
    pub cache_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolves the directories without touching the disk. An explicit
    /// `config_dir` replaces the platform config location and roots the logs.
    pub fn resolve(config_dir: Option<&Path>) -> Result<Self, PlatformError> {
        let app_config = match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or(PlatformError::NoConfigDir)?
                .join(APP_NAME),
        };
        let data_dir = dirs::data_dir()
            .map_or_else(|| app_config.join("data"), |dir| dir.join(APP_NAME));
        let cache_dir = dirs::cache_dir()
            .map_or_else(|| app_config.join("cache"), |dir| dir.join(APP_NAME));

        Ok(Self {
            log_dir: app_config.join("logs"),
            config_dir: app_config,
            data_dir,
            cache_dir,
        })
    }

    /// Everything under `root`. Used by tests.
    pub fn with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            config_dir: app_dir.join("config"),
            data_dir: app_dir.join("data"),
            cache_dir: app_dir.join("cache"),
            log_dir: app_dir.join("logs"),
        }
    }

    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.cache_dir,
            &self.log_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Native backend for the current platform.
pub fn preferred_backends() -> wgpu::Backends {
    #[cfg(target_os = "linux")]
    {
        wgpu::Backends::VULKAN | wgpu::Backends::GL
    }

    #[cfg(target_os = "windows")]
    {
        wgpu::Backends::DX12 | wgpu::Backends::VULKAN
    }

    #[cfg(target_os = "macos")]
    {
        wgpu::Backends::METAL
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        wgpu::Backends::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_dir_roots_logs() {
        let dirs = PlatformDirs::resolve(Some(Path::new("/tmp/orrery-cfg"))).unwrap();
        assert_eq!(dirs.config_dir, PathBuf::from("/tmp/orrery-cfg"));
        assert_eq!(dirs.log_dir, PathBuf::from("/tmp/orrery-cfg").join("logs"));
    }

    #[test]
    fn test_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::with_root(tmp.path());
        dirs.create_dirs().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.data_dir.is_dir());
        assert!(dirs.cache_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
    }

    #[test]
    fn test_preferred_backends_not_empty() {
        assert!(!preferred_backends().is_empty());
    }
}
