//! Scene nodes: identity, tree relations, animation parameters and payloads.

use std::fmt;

use glam::{Mat4, Vec3};

/// Stable index of a node inside a [`SceneGraph`](crate::SceneGraph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle to a mesh owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Opaque handle to a texture (2D or cubemap) owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Which shading path a body is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shading {
    /// Self-illuminated, no lighting terms (the sun).
    Emissive,
    /// Diffuse + specular lighting from the scene's point light.
    #[default]
    Lit,
}

/// Renderable geometry attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub mesh: MeshHandle,
    pub texture: Option<TextureHandle>,
    pub normal_texture: Option<TextureHandle>,
    pub shading: Shading,
}

impl Geometry {
    /// Untextured lit geometry.
    pub fn new(mesh: MeshHandle) -> Self {
        Self {
            mesh,
            texture: None,
            normal_texture: None,
            shading: Shading::Lit,
        }
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_normal_texture(mut self, texture: TextureHandle) -> Self {
        self.normal_texture = Some(texture);
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// True when a normal map is bound for this geometry.
    pub fn has_normal_map(&self) -> bool {
        self.normal_texture.is_some()
    }
}

/// Point light parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub intensity: f32,
    pub color: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            color: Vec3::ONE,
        }
    }
}

/// Optional capability attached to a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodePayload {
    #[default]
    None,
    Geometry(Geometry),
    /// Cubemap background built from six face images.
    Skybox {
        cubemap: TextureHandle,
    },
    Light(PointLight),
}

/// A spatial entity in the scene tree.
///
/// Tree relations (`parent`, `children`, `depth`, `path`) are maintained by the
/// owning [`SceneGraph`](crate::SceneGraph) and are read-only here. Animation and
/// material parameters are plain fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    path: String,
    depth: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    origin: Option<NodeId>,
    /// Static placement baseline, composed before orbital motion.
    pub local_transform: Mat4,
    /// Orbital angular rate about Y, in radians per second.
    pub speed: f32,
    /// Axial spin rate about Y, in radians per second.
    pub self_rotation: f32,
    /// Offset from the orbit pivot. Its x magnitude is the orbit radius.
    pub distance_origin: Vec3,
    /// Uniform body scale, applied last.
    pub radius: f32,
    pub color: Vec3,
    /// Whether the renderer issues a draw call for this node.
    pub drawable: bool,
    pub payload: NodePayload,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: "Node".to_string(),
            path: String::new(),
            depth: 0,
            parent: None,
            children: Vec::new(),
            origin: None,
            local_transform: Mat4::IDENTITY,
            speed: 0.5,
            self_rotation: 0.5,
            distance_origin: Vec3::ZERO,
            radius: 1.0,
            color: Vec3::ONE,
            drawable: false,
            payload: NodePayload::None,
        }
    }
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A pivot node: no geometry, no motion of its own.
    pub fn holder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            speed: 0.0,
            self_rotation: 0.0,
            ..Self::default()
        }
    }

    /// A drawable body carrying `geometry`.
    pub fn body(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            drawable: true,
            payload: NodePayload::Geometry(geometry),
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_self_rotation(mut self, self_rotation: f32) -> Self {
        self.self_rotation = self_rotation;
        self
    }

    pub fn with_distance(mut self, distance_origin: Vec3) -> Self {
        self.distance_origin = distance_origin;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_local_transform(mut self, local_transform: Mat4) -> Self {
        self.local_transform = local_transform;
        self
    }

    pub fn with_payload(mut self, payload: NodePayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Orbit anchor, when distinct from the parent.
    pub fn origin(&self) -> Option<NodeId> {
        self.origin
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.payload {
            NodePayload::Geometry(geometry) => Some(geometry),
            _ => None,
        }
    }

    pub fn light(&self) -> Option<&PointLight> {
        match &self.payload {
            NodePayload::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Orbit-ring radius: the magnitude of the x offset from the pivot.
    pub fn orbit_radius(&self) -> f32 {
        self.distance_origin.x.abs()
    }

    /// World frame of this node at time `t`, given its anchor's world frame.
    ///
    /// `anchor * local * rotY(t * speed) * translate(-distance_origin)`. The
    /// result is the frame descendants and dependants anchor on; it carries
    /// neither the node's axial spin nor its scale.
    pub fn compose_world_transform(&self, anchor_world: Mat4, t: f32) -> Mat4 {
        anchor_world
            * self.local_transform
            * Mat4::from_rotation_y(t * self.speed)
            * Mat4::from_translation(-self.distance_origin)
    }

    /// Model matrix for drawing this node, from its world frame.
    pub fn model_matrix(&self, world: Mat4, t: f32) -> Mat4 {
        world * Mat4::from_rotation_y(t * self.self_rotation) * Mat4::from_scale(Vec3::splat(self.radius))
    }

    /// Matrix that places the unit orbit ring around this node's pivot.
    pub fn orbit_matrix(&self, anchor_world: Mat4) -> Mat4 {
        anchor_world * self.local_transform * Mat4::from_scale(Vec3::splat(self.orbit_radius()))
    }

    pub(crate) fn attach(&mut self, parent: NodeId, parent_path: &str, parent_depth: u32) {
        self.parent = Some(parent);
        self.depth = parent_depth + 1;
        self.path = if parent_path.is_empty() {
            self.name.clone()
        } else {
            format!("{parent_path}/{}", self.name)
        };
    }

    pub(crate) fn make_root(&mut self) {
        self.parent = None;
        self.depth = 0;
        self.path = self.name.clone();
        self.children.clear();
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child_at(&mut self, index: usize) -> NodeId {
        self.children.remove(index)
    }

    pub(crate) fn set_origin(&mut self, origin: Option<NodeId>) {
        self.origin = origin;
    }
}
