//! Configuration for the orrery.
//!
//! Settings persist to `config.ron` in the platform config directory and can be
//! overridden from the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetsConfig, CameraConfig, Config, DebugConfig, GraphicsConfig, InputConfig,
    SimulationConfig, WindowConfig, default_config_dir,
};
pub use error::ConfigError;
