//! Configuration structs with sensible defaults and RON persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level orrery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub graphics: GraphicsConfig,
    /// Camera placement and movement.
    pub camera: CameraConfig,
    /// Input settings.
    pub input: InputConfig,
    /// Simulation clock settings.
    pub simulation: SimulationConfig,
    /// Asset locations.
    pub assets: AssetsConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration. Post-process and shading flags are startup values;
/// the keyboard toggles them at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Number of background stars.
    pub star_count: u32,
    /// Seed for the star point cloud.
    pub star_seed: u64,
    /// Inner radius of the star shell around the origin.
    pub star_min_radius: f32,
    /// Outer radius of the star shell.
    pub star_max_radius: f32,
    /// Draw orbit rings.
    pub orbit_rings: bool,
    /// Render through an offscreen target so post-processing can run.
    pub offscreen: bool,
    pub grayscale: bool,
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,
    pub blur: bool,
    pub cel_shading: bool,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting distance from the sun along +Z.
    pub start_distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance moved per key activation.
    pub move_step: f32,
    /// Radians rotated per mouse-motion event.
    pub rotate_step: f32,
}

/// Input configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Mouse sensitivity multiplier.
    pub mouse_sensitivity: f32,
    /// Invert Y axis for camera.
    pub invert_y: bool,
    /// Keybinding overrides (action name -> key name).
    pub keybindings: HashMap<String, String>,
}

/// Simulation clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per wall-clock second.
    pub time_scale: f32,
    /// Start with the clock paused.
    pub start_paused: bool,
}

/// Asset locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Root of `textures/`, `models/` and `shaders/`.
    pub resource_dir: PathBuf,
    /// OBJ model for the bodies, relative to `resource_dir`. `None` uses the
    /// built-in icosphere.
    pub sphere_model: Option<PathBuf>,
    /// Load the six-face skybox from `textures/skybox/`.
    pub skybox: bool,
    /// Directory of `.wgsl` overrides for the built-in shaders.
    pub shader_dir: Option<PathBuf>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Print the scene graph once it is built.
    pub print_scene_graph: bool,
    /// Frames between frame-time log lines (0 disables).
    pub frame_log_interval: u32,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            star_count: 2000,
            star_seed: 42,
            star_min_radius: 60.0,
            star_max_radius: 120.0,
            orbit_rings: true,
            offscreen: true,
            grayscale: false,
            mirror_horizontal: false,
            mirror_vertical: false,
            blur: false,
            cel_shading: false,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_distance: 20.0,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            move_step: 0.3,
            rotate_step: 0.005,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.0,
            invert_y: false,
            keybindings: HashMap::new(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            start_paused: false,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("resources"),
            sphere_model: None,
            skybox: true,
            shader_dir: None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            print_scene_graph: false,
            frame_log_interval: 300,
        }
    }
}

/// `<platform config dir>/orrery`, if the platform has one.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("orrery"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read `config.ron`: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Resource directory resolved against `base` when relative.
    pub fn resource_dir(&self, base: &Path) -> PathBuf {
        if self.assets.resource_dir.is_absolute() {
            self.assets.resource_dir.clone()
        } else {
            base.join(&self.assets.resource_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("star_count: 2000"));
        assert!(ron_str.contains("start_distance: 20.0"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.assets.sphere_model = Some(PathBuf::from("models/sphere.obj"));
        config
            .input
            .keybindings
            .insert("ToggleBlur".to_string(), "KeyB".to_string());
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), graphics: (star_count: 10))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.graphics.star_count, 10);
        assert_eq!(config.graphics.star_seed, 42);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.simulation.time_scale = 4.0;
        config.graphics.cel_shading = true;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.camera.move_step = 1.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().camera.move_step, 1.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_resource_dir_resolution() {
        let mut config = Config::default();
        assert_eq!(
            config.resource_dir(Path::new("/opt/orrery")),
            PathBuf::from("/opt/orrery/resources")
        );
        config.assets.resource_dir = PathBuf::from("/data/res");
        assert_eq!(
            config.resource_dir(Path::new("/opt/orrery")),
            PathBuf::from("/data/res")
        );
    }
}
