//! wgpu rendering for the orrery: device and surface, camera, meshes and
//! textures, the body and orbit pipelines, and the offscreen post-process path.

pub mod body;
pub mod buffer;
pub mod camera;
pub mod depth;
pub mod frame;
pub mod gpu;
pub mod mesh;
pub mod offscreen;
pub mod orbit;
pub mod pass;
pub mod postprocess;
pub mod render_config;
pub mod shader;
pub mod texture;

pub use body::{BodyPipeline, BodyUniform};
pub use buffer::{
    BufferAllocator, DynamicUniformBuffer, LineVertex, MeshBuffer, MeshVertex, VertexBuffer,
    align_to,
};
pub use camera::{Camera, CameraUniform, projection_for_aspect};
pub use depth::{DepthBuffer, depth_stencil_state};
pub use frame::{FrameUniforms, LightUniform};
pub use gpu::{
    ContextOptions, RenderContext, RenderContextError, SurfaceError, init_render_context_blocking,
};
pub use mesh::{MeshData, MeshError, MeshStore, generate_tangents, icosphere, load_obj, unit_circle};
pub use offscreen::{OffscreenError, OffscreenTarget};
pub use orbit::{OrbitPipeline, OrbitUniform};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use postprocess::{PostProcessPass, PostUniform};
pub use render_config::{PostProcessFlags, RenderConfig, ShadingMode};
pub use shader::{ShaderError, ShaderLibrary};
pub use texture::{GpuTexture, ImageData, TextureError, TextureStore, load_image, mip_level_count};
