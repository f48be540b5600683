//! Scene graph for the orrery: an arena of nodes with parent-relative transforms,
//! time-driven orbit and spin animation, and the per-frame pass that turns the
//! tree into draw commands.

pub mod clock;
pub mod draw_list;
pub mod error;
pub mod graph;
pub mod node;
pub mod solar;
pub mod transform;

pub use clock::{Clock, ManualClock, SystemClock};
pub use draw_list::{DrawItem, DrawList, LightItem, OrbitItem};
pub use error::{AssetLoadError, SceneBuildError};
pub use graph::{PreOrder, SceneGraph};
pub use node::{Geometry, MeshHandle, Node, NodeId, NodePayload, PointLight, Shading, TextureHandle};
pub use solar::{
    AssetSource, BodySpec, PLANETS, SKYBOX_FACES, SUN, SolarSystemDesc, TextureRole,
    build_solar_system,
};
pub use transform::{FrameTransforms, NodeTransforms, normal_matrix};
