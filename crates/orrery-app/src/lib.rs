//! The orrery viewer: window, input, asset loading and the render loop over
//! the solar-system scene graph.

pub mod app;
pub mod assets;
pub mod controls;
pub mod error;
pub mod platform;
pub mod renderer;

pub use app::{App, run};
pub use error::{AppError, AssetError, report};
pub use platform::PlatformDirs;
