//! Per-frame world/model/orbit transform pass.
//!
//! Every node is resolved once per frame against its anchor's cached world
//! frame. The anchor is the node's `origin` when set, otherwise its parent.
//! Anchors outside the ancestor chain are resolved on demand, so a moon whose
//! origin is its planet sees the planet's placement for the same `t`.

use glam::Mat4;

use crate::clock::Clock;
use crate::graph::SceneGraph;
use crate::node::{Node, NodeId};

/// Transforms of one node for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransforms {
    /// Frame that dependants anchor on: orbit applied, no spin or scale.
    pub world: Mat4,
    /// Mesh-to-world matrix for drawing.
    pub model: Mat4,
    /// Unit-ring-to-world matrix for the orbit ring around the pivot.
    pub orbit: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Settled,
}

/// Cached transforms for every live node at a single instant.
#[derive(Debug, Clone)]
pub struct FrameTransforms {
    time: f32,
    slots: Vec<Option<NodeTransforms>>,
}

impl FrameTransforms {
    /// Resolves all reachable nodes of `graph` at time `t` (seconds).
    pub fn compute(graph: &SceneGraph, t: f32) -> Self {
        let mut resolver = Resolver {
            graph,
            t,
            anchors: plan_anchors(graph),
            slots: vec![None; graph.capacity()],
        };
        for (id, _) in graph.iter_preorder() {
            resolver.resolve(id);
        }
        Self {
            time: t,
            slots: resolver.slots,
        }
    }

    /// Resolves `graph` at the clock's current simulation time.
    pub fn sample<C: Clock + ?Sized>(graph: &SceneGraph, clock: &C) -> Self {
        Self::compute(graph, clock.elapsed_secs())
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeTransforms> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn world(&self, id: NodeId) -> Option<Mat4> {
        self.get(id).map(|t| t.world)
    }

    pub fn model(&self, id: NodeId) -> Option<Mat4> {
        self.get(id).map(|t| t.model)
    }

    pub fn orbit(&self, id: NodeId) -> Option<Mat4> {
        self.get(id).map(|t| t.orbit)
    }
}

/// Picks each node's anchor: its origin when set and live, otherwise its
/// parent. Parent edges form a tree, so every cycle contains an origin edge;
/// the last origin edge walked on the cycle is dropped in favour of the
/// parent. The result is acyclic.
fn plan_anchors(graph: &SceneGraph) -> Vec<Option<NodeId>> {
    let capacity = graph.capacity();
    let mut anchors = vec![None; capacity];
    let mut via_origin = vec![false; capacity];
    for (id, node) in graph.iter_preorder() {
        let origin = node.origin().filter(|&o| graph.contains(o));
        anchors[id.index()] = origin.or(node.parent());
        via_origin[id.index()] = origin.is_some();
    }

    let mut marks = vec![Mark::Unvisited; capacity];
    let mut path: Vec<NodeId> = Vec::new();
    for (start, _) in graph.iter_preorder() {
        path.clear();
        let mut current = Some(start);
        while let Some(id) = current {
            match marks[id.index()] {
                Mark::Settled => break,
                Mark::Unvisited => {
                    marks[id.index()] = Mark::OnPath;
                    path.push(id);
                    current = anchors[id.index()];
                }
                Mark::OnPath => {
                    let begin = path.iter().position(|&p| p == id).unwrap_or(0);
                    let Some(cut) = path[begin..]
                        .iter()
                        .rposition(|n| via_origin[n.index()])
                        .map(|i| begin + i)
                    else {
                        break;
                    };
                    let breaker = path[cut];
                    let parent = graph.node(breaker).and_then(Node::parent);
                    log::error!("origin cycle through node {breaker}; falling back to parent anchor");
                    anchors[breaker.index()] = parent;
                    via_origin[breaker.index()] = false;
                    for dropped in path.drain(cut + 1..) {
                        marks[dropped.index()] = Mark::Unvisited;
                    }
                    current = parent;
                }
            }
        }
        for id in &path {
            marks[id.index()] = Mark::Settled;
        }
    }
    anchors
}

struct Resolver<'a> {
    graph: &'a SceneGraph,
    t: f32,
    anchors: Vec<Option<NodeId>>,
    slots: Vec<Option<NodeTransforms>>,
}

impl Resolver<'_> {
    fn resolve(&mut self, id: NodeId) -> Option<NodeTransforms> {
        if let Some(done) = *self.slots.get(id.index())? {
            return Some(done);
        }
        let graph = self.graph;
        let node = graph.node(id)?;
        let anchor = self.anchors[id.index()]
            .and_then(|anchor| self.resolve(anchor))
            .map_or(Mat4::IDENTITY, |t| t.world);
        let world = node.compose_world_transform(anchor, self.t);
        let transforms = NodeTransforms {
            world,
            model: node.model_matrix(world, self.t),
            orbit: node.orbit_matrix(anchor),
        };
        self.slots[id.index()] = Some(transforms);
        Some(transforms)
    }
}

/// Normal matrix for a draw: `transpose(inverse(view * model))`.
pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat4 {
    (view * model).inverse().transpose()
}
