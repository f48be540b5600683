//! Scene construction errors.

use std::path::PathBuf;

/// Boxed error returned by an [`AssetSource`](crate::AssetSource).
pub type AssetLoadError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort building a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneBuildError {
    /// The shared body mesh could not be loaded.
    #[error("failed to load mesh {what}: {source}")]
    Mesh {
        what: String,
        #[source]
        source: AssetLoadError,
    },

    /// A body texture could not be loaded.
    #[error("failed to load texture {} for '{body}': {source}", .path.display())]
    Texture {
        body: String,
        path: PathBuf,
        #[source]
        source: AssetLoadError,
    },

    /// The skybox cubemap could not be assembled.
    #[error("failed to load skybox: {source}")]
    Skybox {
        #[source]
        source: AssetLoadError,
    },

    /// A node could not be attached to its parent.
    #[error("cannot attach '{0}': parent node is missing")]
    Detached(String),
}
