//! Startup errors. Any of these aborts the viewer with a non-zero exit code.

use orrery_render::{MeshError, RenderContextError, TextureError};
use orrery_scene::SceneBuildError;

use crate::platform::PlatformError;

/// A single asset failed to load.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("GPU initialization failed: {0}")]
    RenderContext(#[from] RenderContextError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create default textures: {0}")]
    Texture(#[from] TextureError),

    #[error("failed to build the solar system: {0}")]
    Scene(#[from] SceneBuildError),
}

/// Formats `err` and its `source()` chain, one cause per line.
pub fn report(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
