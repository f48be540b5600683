use glam::{Mat3, Mat4, Vec3};
use orrery_scene::{FrameTransforms, Geometry, ManualClock, MeshHandle, Node, NodeId, SceneGraph};

fn body(name: &str) -> Node {
    Node::body(name, Geometry::new(MeshHandle(0)))
}

/// root -> sun-holder -> sun, root -> mercury-holder -> mercury.
fn two_body_system() -> (SceneGraph, NodeId, NodeId) {
    let mut graph = SceneGraph::new("scenario");
    let root = graph.root();
    let sun_holder = graph.add_child(root, Node::holder("sun-holder")).unwrap();
    let sun = graph
        .add_child(sun_holder, body("sun").with_speed(0.0).with_self_rotation(0.1))
        .unwrap();
    let mercury_holder = graph.add_child(root, Node::holder("mercury-holder")).unwrap();
    let mercury = graph
        .add_child(
            mercury_holder,
            body("mercury")
                .with_speed(0.2)
                .with_distance(Vec3::new(8.0, 0.0, 0.0))
                .with_radius(0.5),
        )
        .unwrap();
    (graph, sun, mercury)
}

/// Adds earth at depth 2 and a moon at depth 4 whose origin is earth.
fn with_moon(planet_speed: f32, moon_speed: f32) -> (SceneGraph, NodeId, NodeId) {
    let (mut graph, _, _) = two_body_system();
    let root = graph.root();
    let earth_holder = graph.add_child(root, Node::holder("earth-holder")).unwrap();
    let earth = graph
        .add_child(
            earth_holder,
            body("earth")
                .with_speed(planet_speed)
                .with_distance(Vec3::new(11.0, 0.0, 0.0)),
        )
        .unwrap();
    let moon_holder = graph.add_child(earth, Node::holder("moon-holder")).unwrap();
    let moon = graph
        .add_child(
            moon_holder,
            body("moon")
                .with_speed(moon_speed)
                .with_distance(Vec3::new(2.0, 0.0, 0.0))
                .with_radius(0.27),
        )
        .unwrap();
    graph.set_origin(moon, Some(earth));
    (graph, earth, moon)
}

fn position(frame: &FrameTransforms, id: NodeId) -> Vec3 {
    frame.world(id).unwrap().transform_point3(Vec3::ZERO)
}

#[test]
fn depth_is_parent_depth_plus_one() {
    let (graph, _, _) = with_moon(0.5, 1.5);
    for (id, node) in graph.iter_preorder() {
        match node.parent() {
            None => {
                assert_eq!(id, graph.root());
                assert_eq!(node.depth(), 0);
            }
            Some(parent) => {
                assert_eq!(node.depth(), graph.node(parent).unwrap().depth() + 1);
            }
        }
    }
}

#[test]
fn every_node_listed_once_in_parent_and_removal_forgets_it() {
    let (mut graph, earth, _) = with_moon(0.5, 1.5);
    for (id, node) in graph.iter_preorder() {
        if let Some(parent) = node.parent() {
            let count = graph
                .node(parent)
                .unwrap()
                .children()
                .iter()
                .filter(|c| **c == id)
                .count();
            assert_eq!(count, 1);
        }
    }

    let removed = graph.remove_child(earth, "moon-holder").unwrap();
    assert_eq!(removed.name, "moon-holder");
    assert!(graph.get_child(earth, "moon-holder").is_none());
    assert!(graph.find("moon").is_none());
}

#[test]
fn orbit_ring_scale_equals_distance_x() {
    let (graph, _, mercury) = two_body_system();
    let frame = FrameTransforms::compute(&graph, 4.2);
    let ring = frame.orbit(mercury).unwrap();
    let (scale, _, translation) = ring.to_scale_rotation_translation();
    assert_eq!(scale, Vec3::splat(8.0));
    assert_eq!(translation, Vec3::ZERO);
}

#[test]
fn model_matrix_is_idempotent() {
    let (graph, _, moon) = with_moon(0.5, 1.5);
    let a = FrameTransforms::compute(&graph, 7.31);
    let b = FrameTransforms::compute(&graph, 7.31);
    assert_eq!(
        a.model(moon).unwrap().to_cols_array(),
        b.model(moon).unwrap().to_cols_array()
    );
}

#[test]
fn clock_sampling_drives_the_orbit() {
    let (graph, _, mercury) = two_body_system();
    let mut clock = ManualClock::at(0.0);
    let start = FrameTransforms::sample(&graph, &clock);
    assert_eq!(start.time(), 0.0);
    assert_eq!(position(&start, mercury), Vec3::new(-8.0, 0.0, 0.0));

    clock.advance(2.5);
    let later = FrameTransforms::sample(&graph, &clock);
    assert_eq!(later.time(), 2.5);
    assert_eq!(
        later.model(mercury),
        FrameTransforms::compute(&graph, 2.5).model(mercury)
    );
    let moved = position(&later, mercury);
    assert!(moved.distance(Vec3::new(-8.0, 0.0, 0.0)) > 1e-2);
    assert!((moved.length() - 8.0).abs() < 1e-4);
}

#[test]
fn sun_gets_spin_but_no_orbital_translation() {
    let (graph, sun, _) = two_body_system();
    for t in [0.0, 1.0, 12.5, 300.0] {
        let frame = FrameTransforms::compute(&graph, t);
        let model = frame.model(sun).unwrap();
        assert_eq!(model.w_axis.truncate(), Vec3::ZERO, "t = {t}");
    }
    let spun = FrameTransforms::compute(&graph, 10.0).model(sun).unwrap();
    assert!(!spun.abs_diff_eq(Mat4::IDENTITY, 1e-3));
}

#[test]
fn mercury_scale_block_at_time_zero() {
    let (graph, _, mercury) = two_body_system();
    let frame = FrameTransforms::compute(&graph, 0.0);
    let model = frame.model(mercury).unwrap();
    assert_eq!(Mat3::from_mat4(model), Mat3::from_diagonal(Vec3::splat(0.5)));
    assert_eq!(model.w_axis.truncate(), Vec3::new(-8.0, 0.0, 0.0));
}

#[test]
fn moon_follows_its_planet() {
    let t = 3.0;
    let coupled = FrameTransforms::compute(&with_moon(0.5, 1.5).0, t);
    let (graph, _, moon) = with_moon(0.5, 1.5);
    let moving_planet = position(&coupled, moon);

    let frozen_planet = {
        let (graph, _, moon) = with_moon(0.0, 1.5);
        position(&FrameTransforms::compute(&graph, t), moon)
    };
    assert!(
        moving_planet.distance(frozen_planet) > 1e-2,
        "planet speed must move the moon"
    );

    let (still_graph, earth, still_moon) = with_moon(0.5, 0.0);
    let still = FrameTransforms::compute(&still_graph, t);
    let earth_position = position(&still, earth);
    let moon_position = position(&still, still_moon);
    assert!(earth_position.length() > 10.0);
    assert!(((moon_position - earth_position).length() - 2.0).abs() < 1e-4);
    assert!(moon_position.distance(Vec3::new(-2.0, 0.0, 0.0)) > 1.0);

    // Same graph computed on its own matches the first computation.
    let again = FrameTransforms::compute(&graph, t);
    assert_eq!(position(&again, moon), moving_planet);
}

#[test]
fn missing_child_yields_empty_node() {
    let (graph, sun, _) = two_body_system();
    assert!(graph.get_child(sun, "nonexistent").is_none());
    assert_eq!(graph.child_or_empty(graph.root(), "nonexistent"), Node::default());
}
