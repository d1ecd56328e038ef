use geometry::TpcId;
use scene::{Appearance, ElementArena, Scene, SceneLayout, Shape};

fn boxed(center: [f64; 3]) -> Shape {
    Shape::Box {
        center,
        half_extents: [1.0, 1.0, 1.0],
    }
}

#[test]
fn destroying_a_node_frees_its_subtree() {
    let mut arena = ElementArena::new();
    let root = arena.create("tracks", Shape::Group, Appearance::default());
    let child = arena
        .create_child(root, "track 1", boxed([0.0; 3]), Appearance::default())
        .expect("child");
    let grandchild = arena
        .create_child(child, "marker", boxed([1.0; 3]), Appearance::default())
        .expect("grandchild");
    assert_eq!(arena.len(), 3);

    arena.destroy(root).expect("destroy root");
    assert!(arena.is_empty());
    assert!(!arena.contains(child));
    assert!(!arena.contains(grandchild));
}

#[test]
fn destroying_a_child_detaches_it_from_the_parent() {
    let mut arena = ElementArena::new();
    let root = arena.create("digits", Shape::Group, Appearance::default());
    let first = arena
        .create_child(root, "ch 0", boxed([0.0; 3]), Appearance::default())
        .expect("first");
    let second = arena
        .create_child(root, "ch 1", boxed([2.0; 3]), Appearance::default())
        .expect("second");

    arena.destroy(first).expect("destroy child");
    let children = arena.node(root).expect("root").children.clone();
    assert_eq!(children, vec![second]);
    assert_eq!(arena.len(), 2);
}

#[test]
fn freed_handles_are_reused_without_leaking() {
    let mut arena = ElementArena::new();
    let first = arena.create("a", Shape::Group, Appearance::default());
    arena.destroy(first).expect("destroy");
    let second = arena.create("b", Shape::Group, Appearance::default());
    assert_eq!(arena.len(), 1);
    assert_eq!(arena.node(second).expect("b").name, "b");
}

#[test]
fn copy_subtree_maps_every_point() {
    let mut src = ElementArena::new();
    let root = src.create("track", Shape::Group, Appearance::default());
    src.create_child(
        root,
        "path",
        Shape::Polyline {
            points: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
        },
        Appearance::default(),
    )
    .expect("path");

    let mut dest = ElementArena::new();
    let copied = src
        .copy_subtree_with(root, &mut dest, &mut |p| [p[0], p[1] * 10.0, p[2]])
        .expect("copy");

    let copied_node = dest.node(copied).expect("copied root");
    assert_eq!(copied_node.name, "track");
    let child = dest.node(copied_node.children[0]).expect("copied child");
    match &child.shape {
        Shape::Polyline { points } => {
            assert_eq!(points.as_slice(), &[[1.0, 20.0, 3.0], [4.0, 50.0, 6.0]])
        }
        other => panic!("expected polyline, got {other:?}"),
    }
    // source untouched
    assert_eq!(src.len(), 2);
}

#[test]
fn per_plane_scene_routes_only_known_planes() {
    let tpc = TpcId::new(0, 0);
    let mut scene = Scene::new_per_plane("reco", (0..2).map(|p| tpc.plane(p)));
    assert_eq!(scene.layout(), SceneLayout::PerPlane);

    let id = scene
        .arena
        .create("hit", boxed([0.0; 3]), Appearance::default());
    assert!(scene.add_plane_root(tpc.plane(1), id));
    assert_eq!(scene.plane_roots(tpc.plane(1)).expect("plane 1"), &[id]);
    assert_eq!(scene.plane_roots(tpc.plane(0)).expect("plane 0"), &[]);

    let stray = scene
        .arena
        .create("stray", boxed([0.0; 3]), Appearance::default());
    assert!(!scene.add_plane_root(tpc.plane(7), stray));
}

#[test]
fn clear_contents_empties_every_part_but_keeps_the_partition() {
    let tpc = TpcId::new(0, 0);
    let mut scene = Scene::new_per_plane("raw", (0..3).map(|p| tpc.plane(p)));
    for plane in 0..3 {
        let id = scene
            .arena
            .create("digit", boxed([0.0; 3]), Appearance::default());
        scene.add_plane_root(tpc.plane(plane), id);
    }
    assert_eq!(scene.element_count(), 3);

    scene.clear_contents();
    assert_eq!(scene.element_count(), 0);
    assert_eq!(scene.planes().len(), 3);
    assert_eq!(scene.plane_roots(tpc.plane(0)).expect("part"), &[]);
}

#[test]
fn snapshot_serializes_the_element_tree() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scene = Scene::new_single("truth");
    let root = scene
        .arena
        .create("particle 13", Shape::Group, Appearance::default());
    scene
        .arena
        .create_child(
            root,
            "trajectory",
            Shape::Polyline {
                points: vec![[0.0; 3], [1.0, 1.0, 1.0]],
            },
            Appearance::default(),
        )
        .expect("child");
    scene.add_root(root);

    let path = dir.path().join("truth.json");
    scene.save_snapshot(&path).expect("save snapshot");

    let data = std::fs::read_to_string(&path).expect("read snapshot");
    let parsed: scene::SceneSnapshot = serde_json::from_str(&data).expect("parse snapshot");
    assert_eq!(parsed.scene, "truth");
    assert_eq!(parsed.parts.len(), 1);
    assert_eq!(parsed.parts[0].elements[0].name, "particle 13");
    assert_eq!(parsed.parts[0].elements[0].children.len(), 1);
}
