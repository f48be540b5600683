//! The solar-system scene: body catalog and builder.
//!
//! Layout:
//!
//! ```text
//! root
//! ├── skybox                      (cubemap payload, not drawn by the body pass)
//! ├── sun-holder
//! │   ├── sun                     (emissive)
//! │   └── sun-light               (point light)
//! ├── mercury-holder
//! │   └── mercury
//! ├── earth-holder
//! │   └── earth
//! │       └── moon-holder
//! │           └── moon            (origin = earth)
//! └── ...
//! ```

use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::error::{AssetLoadError, SceneBuildError};
use crate::graph::SceneGraph;
use crate::node::{
    Geometry, MeshHandle, Node, NodeId, NodePayload, PointLight, Shading, TextureHandle,
};

/// What a requested texture is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// sRGB color map.
    Diffuse,
    /// Linear tangent-space normal map.
    Normal,
}

/// Loads assets on behalf of the builder and hands back opaque handles.
pub trait AssetSource {
    /// Loads the shared body mesh. `None` asks for the built-in sphere.
    fn mesh(&mut self, path: Option<&Path>) -> Result<MeshHandle, AssetLoadError>;

    fn texture(&mut self, path: &Path, role: TextureRole) -> Result<TextureHandle, AssetLoadError>;

    /// Builds a cubemap from faces ordered `+X, -X, +Y, -Y, +Z, -Z`.
    fn cubemap(&mut self, faces: &[PathBuf; 6]) -> Result<TextureHandle, AssetLoadError>;
}

/// Static description of one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    pub name: &'static str,
    pub speed: f32,
    pub self_rotation: f32,
    /// Orbit radius; the body sits at `-distance` along x at `t = 0`.
    pub distance: f32,
    pub radius: f32,
    pub color: [f32; 3],
    /// Diffuse texture, relative to the texture directory.
    pub texture: &'static str,
    pub normal_map: Option<&'static str>,
    pub moons: &'static [BodySpec],
}

pub const SUN: BodySpec = BodySpec {
    name: "sun",
    speed: 0.0,
    self_rotation: 0.1,
    distance: 0.0,
    radius: 3.0,
    color: [1.0, 0.85, 0.4],
    texture: "sun.png",
    normal_map: None,
    moons: &[],
};

pub const MOON: BodySpec = BodySpec {
    name: "moon",
    speed: 1.5,
    self_rotation: 0.3,
    distance: 2.0,
    radius: 0.27,
    color: [0.7, 0.7, 0.7],
    texture: "moon.png",
    normal_map: None,
    moons: &[],
};

pub const PLANETS: &[BodySpec] = &[
    BodySpec {
        name: "mercury",
        speed: 0.7,
        self_rotation: 0.2,
        distance: 5.0,
        radius: 0.38,
        color: [0.6, 0.55, 0.5],
        texture: "mercury.png",
        normal_map: None,
        moons: &[],
    },
    BodySpec {
        name: "venus",
        speed: 0.6,
        self_rotation: 0.1,
        distance: 8.0,
        radius: 0.95,
        color: [0.9, 0.75, 0.45],
        texture: "venus.png",
        normal_map: None,
        moons: &[],
    },
    BodySpec {
        name: "earth",
        speed: 0.5,
        self_rotation: 0.5,
        distance: 11.0,
        radius: 1.0,
        color: [0.25, 0.45, 0.9],
        texture: "earth.png",
        normal_map: Some("earth_normal.png"),
        moons: &[MOON],
    },
    BodySpec {
        name: "mars",
        speed: 0.65,
        self_rotation: 0.5,
        distance: 15.0,
        radius: 0.53,
        color: [0.85, 0.35, 0.2],
        texture: "mars.png",
        normal_map: None,
        moons: &[],
    },
    BodySpec {
        name: "jupiter",
        speed: 0.7,
        self_rotation: 1.2,
        distance: 14.0,
        radius: 1.6,
        color: [0.8, 0.65, 0.5],
        texture: "jupiter.png",
        normal_map: None,
        moons: &[],
    },
    BodySpec {
        name: "saturn",
        speed: 0.75,
        self_rotation: 1.1,
        distance: 17.0,
        radius: 1.4,
        color: [0.9, 0.8, 0.55],
        texture: "saturn.png",
        normal_map: None,
        moons: &[],
    },
    BodySpec {
        name: "uranus",
        speed: 0.8,
        self_rotation: 0.7,
        distance: 21.0,
        radius: 1.0,
        color: [0.55, 0.8, 0.85],
        texture: "uranus.png",
        normal_map: None,
        moons: &[],
    },
    BodySpec {
        name: "neptune",
        speed: 0.5,
        self_rotation: 0.7,
        distance: 25.0,
        radius: 0.97,
        color: [0.3, 0.4, 0.9],
        texture: "neptune.png",
        normal_map: None,
        moons: &[],
    },
];

/// Skybox face file names, in cubemap layer order.
pub const SKYBOX_FACES: [&str; 6] = [
    "right.png",
    "left.png",
    "top.png",
    "bottom.png",
    "front.png",
    "back.png",
];

/// Where the builder finds its assets.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarSystemDesc {
    /// OBJ for the shared body mesh; `None` uses the built-in sphere.
    pub mesh: Option<PathBuf>,
    pub texture_dir: PathBuf,
    /// Directory holding [`SKYBOX_FACES`]; `None` builds no skybox.
    pub skybox_dir: Option<PathBuf>,
    pub light: PointLight,
}

impl SolarSystemDesc {
    pub fn new(resource_dir: &Path) -> Self {
        Self {
            mesh: None,
            texture_dir: resource_dir.join("textures"),
            skybox_dir: Some(resource_dir.join("textures").join("skybox")),
            light: PointLight {
                intensity: 1.0,
                color: Vec3::new(1.0, 0.95, 0.9),
            },
        }
    }
}

/// Builds the full solar system, loading every asset through `assets`.
///
/// Any asset failure aborts the build; no partial scene is returned.
pub fn build_solar_system<A: AssetSource>(
    assets: &mut A,
    desc: &SolarSystemDesc,
) -> Result<SceneGraph, SceneBuildError> {
    let mesh = assets
        .mesh(desc.mesh.as_deref())
        .map_err(|source| SceneBuildError::Mesh {
            what: desc
                .mesh
                .as_ref()
                .map_or_else(|| "<built-in sphere>".to_string(), |p| p.display().to_string()),
            source,
        })?;

    let mut graph = SceneGraph::new("solarsystem");
    let root = graph.root();

    if let Some(dir) = &desc.skybox_dir {
        let faces = SKYBOX_FACES.map(|face| dir.join(face));
        let cubemap = assets
            .cubemap(&faces)
            .map_err(|source| SceneBuildError::Skybox { source })?;
        attach(
            &mut graph,
            root,
            Node::holder("skybox").with_payload(NodePayload::Skybox { cubemap }),
        )?;
    }

    let sun_holder = attach(&mut graph, root, Node::holder("sun-holder"))?;
    let sun = body_node(assets, mesh, &SUN, &desc.texture_dir, Shading::Emissive)?;
    attach(&mut graph, sun_holder, sun)?;
    attach(
        &mut graph,
        sun_holder,
        Node::holder("sun-light").with_payload(NodePayload::Light(desc.light)),
    )?;

    for planet in PLANETS {
        add_body(&mut graph, assets, mesh, root, planet, None, &desc.texture_dir)?;
    }

    log::info!(
        "Built scene graph '{}' with {} nodes",
        graph.name(),
        graph.len()
    );
    Ok(graph)
}

fn add_body<A: AssetSource>(
    graph: &mut SceneGraph,
    assets: &mut A,
    mesh: MeshHandle,
    parent: NodeId,
    spec: &BodySpec,
    origin: Option<NodeId>,
    texture_dir: &Path,
) -> Result<NodeId, SceneBuildError> {
    let holder = attach(graph, parent, Node::holder(format!("{}-holder", spec.name)))?;
    let node = body_node(assets, mesh, spec, texture_dir, Shading::Lit)?;
    let id = attach(graph, holder, node)?;
    if origin.is_some() {
        graph.set_origin(id, origin);
    }
    for moon in spec.moons {
        add_body(graph, assets, mesh, id, moon, Some(id), texture_dir)?;
    }
    Ok(id)
}

fn body_node<A: AssetSource>(
    assets: &mut A,
    mesh: MeshHandle,
    spec: &BodySpec,
    texture_dir: &Path,
    shading: Shading,
) -> Result<Node, SceneBuildError> {
    let mut geometry = Geometry::new(mesh)
        .with_shading(shading)
        .with_texture(load_texture(assets, spec.name, &texture_dir.join(spec.texture), TextureRole::Diffuse)?);
    if let Some(normal) = spec.normal_map {
        geometry = geometry.with_normal_texture(load_texture(
            assets,
            spec.name,
            &texture_dir.join(normal),
            TextureRole::Normal,
        )?);
    }
    Ok(Node::body(spec.name, geometry)
        .with_speed(spec.speed)
        .with_self_rotation(spec.self_rotation)
        .with_distance(Vec3::new(spec.distance, 0.0, 0.0))
        .with_radius(spec.radius)
        .with_color(Vec3::from_array(spec.color)))
}

fn load_texture<A: AssetSource>(
    assets: &mut A,
    body: &str,
    path: &Path,
    role: TextureRole,
) -> Result<TextureHandle, SceneBuildError> {
    assets
        .texture(path, role)
        .map_err(|source| SceneBuildError::Texture {
            body: body.to_string(),
            path: path.to_path_buf(),
            source,
        })
}

fn attach(graph: &mut SceneGraph, parent: NodeId, node: Node) -> Result<NodeId, SceneBuildError> {
    let name = node.name.clone();
    graph
        .add_child(parent, node)
        .ok_or(SceneBuildError::Detached(name))
}
