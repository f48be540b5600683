//! Flattening a scene frame into draw commands.

use glam::{Mat4, Vec3};

use crate::graph::SceneGraph;
use crate::node::{MeshHandle, NodeId, NodePayload, Shading, TextureHandle};
use crate::transform::{FrameTransforms, normal_matrix};

/// One body draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: MeshHandle,
    pub texture: Option<TextureHandle>,
    pub normal_texture: Option<TextureHandle>,
    pub shading: Shading,
    pub model: Mat4,
    pub normal: Mat4,
    pub color: Vec3,
}

/// One orbit ring draw.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitItem {
    pub node: NodeId,
    pub transform: Mat4,
    pub color: Vec3,
}

/// The scene's light as seen this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightItem {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// Everything the renderer needs from the scene for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub bodies: Vec<DrawItem>,
    pub orbits: Vec<OrbitItem>,
    pub light: Option<LightItem>,
    pub skybox: Option<TextureHandle>,
}

impl DrawList {
    /// Walks `graph` in pre-order and collects draws for drawable nodes.
    ///
    /// Non-drawable holders are visited but emit nothing. Orbit rings are
    /// emitted for drawable bodies with a non-zero orbit radius.
    pub fn build(graph: &SceneGraph, frame: &FrameTransforms, view: Mat4) -> Self {
        let mut list = DrawList::default();

        for (id, node) in graph.iter_preorder() {
            let Some(transforms) = frame.get(id) else {
                continue;
            };
            match &node.payload {
                NodePayload::Light(light) if list.light.is_none() => {
                    list.light = Some(LightItem {
                        position: transforms.world.transform_point3(Vec3::ZERO),
                        color: light.color,
                        intensity: light.intensity,
                    });
                }
                NodePayload::Skybox { cubemap } if list.skybox.is_none() => {
                    list.skybox = Some(*cubemap);
                }
                _ => {}
            }

            if !node.drawable {
                continue;
            }
            let Some(geometry) = node.geometry() else {
                log::debug!("drawable node '{}' has no geometry", node.name);
                continue;
            };
            list.bodies.push(DrawItem {
                node: id,
                mesh: geometry.mesh,
                texture: geometry.texture,
                normal_texture: geometry.normal_texture,
                shading: geometry.shading,
                model: transforms.model,
                normal: normal_matrix(view, transforms.model),
                color: node.color,
            });
            if node.orbit_radius() > 0.0 {
                list.orbits.push(OrbitItem {
                    node: id,
                    transform: transforms.orbit,
                    color: node.color,
                });
            }
        }

        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Geometry, Node, PointLight};

    fn geometry() -> Geometry {
        Geometry::new(MeshHandle(0))
    }

    #[test]
    fn test_holders_emit_nothing_but_children_do() {
        let mut graph = SceneGraph::new("list");
        let root = graph.root();
        let holder = graph.add_child(root, Node::holder("h")).unwrap();
        let body = graph
            .add_child(
                holder,
                Node::body("p", geometry()).with_distance(Vec3::new(5.0, 0.0, 0.0)),
            )
            .unwrap();
        let frame = FrameTransforms::compute(&graph, 0.0);
        let list = DrawList::build(&graph, &frame, Mat4::IDENTITY);
        assert_eq!(list.bodies.len(), 1);
        assert_eq!(list.bodies[0].node, body);
        assert_eq!(list.orbits.len(), 1);
    }

    #[test]
    fn test_drawable_flag_not_depth_decides() {
        let mut graph = SceneGraph::new("flag");
        let root = graph.root();
        // A drawable body directly under the root, at odd depth.
        graph.add_child(root, Node::body("odd", geometry()));
        let mut hidden = Node::body("hidden", geometry());
        hidden.drawable = false;
        graph.add_child(root, hidden);
        let frame = FrameTransforms::compute(&graph, 0.0);
        let list = DrawList::build(&graph, &frame, Mat4::IDENTITY);
        assert_eq!(list.bodies.len(), 1);
    }

    #[test]
    fn test_no_orbit_ring_for_centered_body() {
        let mut graph = SceneGraph::new("sun");
        let root = graph.root();
        graph.add_child(root, Node::body("sun", geometry()).with_speed(0.0));
        let frame = FrameTransforms::compute(&graph, 1.0);
        let list = DrawList::build(&graph, &frame, Mat4::IDENTITY);
        assert_eq!(list.bodies.len(), 1);
        assert!(list.orbits.is_empty());
    }

    #[test]
    fn test_light_position_follows_its_node() {
        let mut graph = SceneGraph::new("light");
        let root = graph.root();
        graph.add_child(
            root,
            Node::holder("lamp")
                .with_local_transform(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)))
                .with_payload(NodePayload::Light(PointLight {
                    intensity: 2.0,
                    color: Vec3::new(1.0, 0.9, 0.8),
                })),
        );
        let frame = FrameTransforms::compute(&graph, 0.0);
        let list = DrawList::build(&graph, &frame, Mat4::IDENTITY);
        let light = list.light.unwrap();
        assert!(light.position.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-6));
        assert_eq!(light.intensity, 2.0);
    }

    #[test]
    fn test_skybox_is_picked_up() {
        let mut graph = SceneGraph::new("sky");
        let root = graph.root();
        graph.add_child(
            root,
            Node::holder("sky").with_payload(NodePayload::Skybox {
                cubemap: TextureHandle(7),
            }),
        );
        let frame = FrameTransforms::compute(&graph, 0.0);
        let list = DrawList::build(&graph, &frame, Mat4::IDENTITY);
        assert_eq!(list.skybox, Some(TextureHandle(7)));
        assert!(list.bodies.is_empty());
    }
}
