//! Space backdrop: the cubemap skybox and the procedural starfield.

pub mod skybox;
pub mod starfield;

pub use skybox::{SkyboxRenderer, skybox_depth_state};
pub use starfield::{
    Star, StarVertex, StarfieldGenerator, StarfieldRenderer, blackbody_to_rgb,
};
