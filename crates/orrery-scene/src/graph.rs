//! Arena-backed scene graph.

use std::fmt::{self, Write as _};

use crate::node::{Node, NodeId, NodePayload};

/// Owns every [`Node`] of a scene, addressed by [`NodeId`].
///
/// Removed nodes leave a tombstone so that ids handed out earlier never alias a
/// different node.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    name: String,
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl SceneGraph {
    /// Creates a graph whose root is a motionless holder named `"root"`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_root(name, Node::holder("root"))
    }

    pub fn with_root(name: impl Into<String>, mut root: Node) -> Self {
        root.make_root();
        Self {
            name: name.into(),
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Replaces the whole tree with `root` alone.
    pub fn set_root(&mut self, mut root: Node) -> NodeId {
        root.make_root();
        root.set_origin(None);
        self.nodes.clear();
        self.nodes.push(Some(root));
        self.root = NodeId(0);
        self.root
    }

    pub fn root_node(&self) -> &Node {
        // The root slot is never tombstoned.
        match &self.nodes[self.root.index()] {
            Some(node) => node,
            None => unreachable!("scene graph root removed"),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upper bound on [`NodeId::index`] for nodes in this graph.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Appends `node` under `parent`, returning its id.
    ///
    /// Depth and path are derived from the parent. Returns `None` when `parent`
    /// is not a live node.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        let parent_node = self.node(parent)?;
        node.attach(parent, parent_node.path(), parent_node.depth());
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.push_child(id);
        }
        Some(id)
    }

    /// Removes the first child of `parent` named `name` together with its subtree.
    ///
    /// Origin references into the removed subtree are cleared. A missing name
    /// is logged and yields `None`.
    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> Option<Node> {
        let Some(index) = self.child_position(parent, name) else {
            log::warn!(
                "remove_child: '{}' has no child named '{name}'",
                self.display_name(parent)
            );
            return None;
        };
        let child = self.node_mut(parent)?.remove_child_at(index);

        let mut removed_ids = Vec::new();
        let mut stack = vec![child];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                stack.extend_from_slice(node.children());
            }
            removed_ids.push(id);
        }

        let mut removed = None;
        for id in &removed_ids {
            let taken = self.nodes.get_mut(id.index()).and_then(Option::take);
            if *id == child {
                removed = taken;
            }
        }

        for node in self.nodes.iter_mut().flatten() {
            if node.origin().is_some_and(|o| removed_ids.contains(&o)) {
                node.set_origin(None);
            }
        }

        removed
    }

    /// First child of `parent` named `name`. A miss is logged.
    pub fn get_child(&self, parent: NodeId, name: &str) -> Option<&Node> {
        self.child_id(parent, name).and_then(|id| self.node(id))
    }

    /// Id of the first child of `parent` named `name`. A miss is logged.
    pub fn child_id(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let Some(index) = self.child_position(parent, name) else {
            log::warn!(
                "get_child: '{}' has no child named '{name}'",
                self.display_name(parent)
            );
            return None;
        };
        self.node(parent).map(|p| p.children()[index])
    }

    /// Copy of the first matching child, or an empty default node on a miss.
    pub fn child_or_empty(&self, parent: NodeId, name: &str) -> Node {
        self.get_child(parent, name).cloned().unwrap_or_default()
    }

    /// Sets or clears the orbit anchor of `id`.
    ///
    /// Returns `false` when either node is not live or `origin == id`.
    pub fn set_origin(&mut self, id: NodeId, origin: Option<NodeId>) -> bool {
        if let Some(o) = origin
            && (o == id || !self.contains(o))
        {
            log::warn!("set_origin: rejected origin {o} for node {id}");
            return false;
        }
        match self.node_mut(id) {
            Some(node) => {
                node.set_origin(origin);
                true
            }
            None => false,
        }
    }

    /// First node, in pre-order, named `name`.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter_preorder()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// The scene's point light, with its node id.
    pub fn find_light(&self) -> Option<(NodeId, &Node)> {
        self.iter_preorder()
            .find(|(_, node)| matches!(node.payload, NodePayload::Light(_)))
    }

    pub fn find_skybox(&self) -> Option<(NodeId, &Node)> {
        self.iter_preorder()
            .find(|(_, node)| matches!(node.payload, NodePayload::Skybox { .. }))
    }

    /// Pre-order iterator over live nodes reachable from the root.
    pub fn iter_preorder(&self) -> PreOrder<'_> {
        PreOrder {
            graph: self,
            stack: vec![self.root],
        }
    }

    /// Calls `visitor` for every reachable node in pre-order.
    pub fn traverse_depth_first<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeId, &Node),
    {
        for (id, node) in self.iter_preorder() {
            visitor(id, node);
        }
    }

    /// One-line diagnostic summary of a node.
    pub fn describe(&self, id: NodeId) -> Option<String> {
        let node = self.node(id)?;
        let children: Vec<&str> = node
            .children()
            .iter()
            .filter_map(|c| self.node(*c).map(|n| n.name.as_str()))
            .collect();
        Some(format!(
            "name: {} | path: {} | parent: {} | children: [{}] | depth: {} | origin: {}",
            node.name,
            node.path(),
            node.parent().map_or("-", |p| self.display_name(p)),
            children.join(", "),
            node.depth(),
            node.origin().map_or("-", |o| self.display_name(o)),
        ))
    }

    fn display_name(&self, id: NodeId) -> &str {
        self.node(id).map_or("<removed>", |n| n.name.as_str())
    }

    fn child_position(&self, parent: NodeId, name: &str) -> Option<usize> {
        let parent = self.node(parent)?;
        parent
            .children()
            .iter()
            .position(|c| self.node(*c).is_some_and(|n| n.name == name))
    }
}

impl fmt::Display for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scene graph '{}' ({} nodes)", self.name, self.len())?;
        for (id, node) in self.iter_preorder() {
            let mut line = String::new();
            for _ in 0..node.depth() {
                line.push_str("  ");
            }
            let _ = write!(line, "{}", self.describe(id).unwrap_or_default());
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Pre-order traversal over a [`SceneGraph`], children in insertion order.
pub struct PreOrder<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.graph.node(id) {
                self.stack.extend(node.children().iter().rev());
                return Some((id, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SceneGraph, NodeId, NodeId) {
        let mut graph = SceneGraph::new("test");
        let root = graph.root();
        let holder = graph.add_child(root, Node::holder("earth-holder")).unwrap();
        let earth = graph.add_child(holder, Node::new("earth")).unwrap();
        (graph, holder, earth)
    }

    #[test]
    fn test_add_child_sets_depth_and_path() {
        let (graph, holder, earth) = sample();
        let earth_node = graph.node(earth).unwrap();
        assert_eq!(graph.node(holder).unwrap().depth(), 1);
        assert_eq!(earth_node.depth(), 2);
        assert_eq!(earth_node.path(), "root/earth-holder/earth");
        assert_eq!(earth_node.parent(), Some(holder));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut graph = SceneGraph::new("order");
        let root = graph.root();
        for name in ["a", "b", "c"] {
            graph.add_child(root, Node::new(name));
        }
        let names: Vec<_> = graph
            .root_node()
            .children()
            .iter()
            .map(|id| graph.node(*id).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_add_child_to_missing_parent() {
        let mut graph = SceneGraph::new("x");
        assert!(graph.add_child(NodeId(42), Node::new("orphan")).is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_remove_child_drops_subtree() {
        let (mut graph, holder, earth) = sample();
        let moon = graph.add_child(earth, Node::new("moon")).unwrap();
        let removed = graph.remove_child(graph.root(), "earth-holder").unwrap();
        assert_eq!(removed.name, "earth-holder");
        assert!(!graph.contains(holder));
        assert!(!graph.contains(earth));
        assert!(!graph.contains(moon));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_remove_missing_child_returns_none() {
        let (mut graph, _, _) = sample();
        assert!(graph.remove_child(graph.root(), "pluto").is_none());
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_remove_clears_dangling_origins() {
        let (mut graph, _, earth) = sample();
        let probe_holder = graph.add_child(graph.root(), Node::holder("probe-holder")).unwrap();
        let probe = graph.add_child(probe_holder, Node::new("probe")).unwrap();
        assert!(graph.set_origin(probe, Some(earth)));
        graph.remove_child(graph.root(), "earth-holder");
        assert_eq!(graph.node(probe).unwrap().origin(), None);
    }

    #[test]
    fn test_ids_stay_stable_after_removal() {
        let (mut graph, _, _) = sample();
        let venus = graph.add_child(graph.root(), Node::new("venus")).unwrap();
        graph.remove_child(graph.root(), "earth-holder");
        let mars = graph.add_child(graph.root(), Node::new("mars")).unwrap();
        assert_ne!(venus, mars);
        assert_eq!(graph.node(venus).unwrap().name, "venus");
    }

    #[test]
    fn test_get_child_miss() {
        let (graph, holder, _) = sample();
        assert!(graph.get_child(holder, "nonexistent").is_none());
        assert_eq!(graph.child_or_empty(holder, "nonexistent"), Node::default());
        assert_eq!(graph.child_or_empty(holder, "earth").name, "earth");
    }

    #[test]
    fn test_set_origin_rejects_self_and_missing() {
        let (mut graph, _, earth) = sample();
        assert!(!graph.set_origin(earth, Some(earth)));
        assert!(!graph.set_origin(earth, Some(NodeId(99))));
        assert!(graph.set_origin(earth, None));
    }

    #[test]
    fn test_preorder_visits_parent_before_children() {
        let (mut graph, holder, earth) = sample();
        let moon = graph.add_child(earth, Node::new("moon")).unwrap();
        let venus = graph.add_child(graph.root(), Node::new("venus")).unwrap();
        let order: Vec<NodeId> = graph.iter_preorder().map(|(id, _)| id).collect();
        assert_eq!(order, vec![graph.root(), holder, earth, moon, venus]);
    }

    #[test]
    fn test_set_root_resets_tree() {
        let (mut graph, _, _) = sample();
        let root = graph.set_root(Node::holder("fresh"));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.root_node().name, "fresh");
        assert_eq!(graph.root_node().depth(), 0);
        assert_eq!(graph.root(), root);
    }

    #[test]
    fn test_describe_lists_relations() {
        let (mut graph, holder, earth) = sample();
        let moon = graph.add_child(earth, Node::new("moon")).unwrap();
        graph.set_origin(moon, Some(earth));
        let text = graph.describe(moon).unwrap();
        assert!(text.contains("name: moon"));
        assert!(text.contains("parent: earth"));
        assert!(text.contains("depth: 3"));
        assert!(text.contains("origin: earth"));
        assert!(graph.describe(holder).unwrap().contains("children: [earth]"));
    }

    #[test]
    fn test_find_light() {
        let (mut graph, _, earth) = sample();
        assert!(graph.find_light().is_none());
        let light = graph
            .add_child(
                earth,
                Node::holder("lamp").with_payload(NodePayload::Light(Default::default())),
            )
            .unwrap();
        assert_eq!(graph.find_light().map(|(id, _)| id), Some(light));
    }

    #[test]
    fn test_display_prints_every_node() {
        let (graph, _, _) = sample();
        let text = graph.to_string();
        assert!(text.starts_with("scene graph 'test' (3 nodes)"));
        assert!(text.contains("earth-holder"));
        assert_eq!(text.lines().count(), 4);
    }
}
