use std::sync::Arc;

use geometry::{DriftSpec, Geometry, GeometryError, PlaneSpec, StandardGeometry, TpcId, TpcSpec};
use scene::{ElementArena, Shape};
use serde_json::json;
use tpcview_core::factory::{
    create_factory, ConvertContext, ConvertError, FactoryConfig, FactoryRegistry,
    SimParticleFactory, VisFactory,
};
use tpcview_core::product::{
    Hit, ProductKind, ProductRef, RawDigit, RecoTrack, SimParticle, TrajectoryPoint,
};
use tpcview_core::context::FrameConfig;

fn test_geometry() -> StandardGeometry {
    StandardGeometry::new(
        vec![TpcSpec {
            cryostat: 0,
            tpc: 0,
            planes: vec![
                PlaneSpec {
                    wire_count: 100,
                    wire_pitch: 0.4,
                    wire_angle: 0.0,
                    center: [0.0, 0.0, 0.0],
                },
                PlaneSpec {
                    wire_count: 140,
                    wire_pitch: 0.4,
                    wire_angle: 0.0,
                    center: [-0.5, 0.0, 0.0],
                },
                PlaneSpec {
                    wire_count: 200,
                    wire_pitch: 0.4,
                    wire_angle: 0.0,
                    center: [-1.0, 0.0, 0.0],
                },
            ],
        }],
        DriftSpec {
            ticks_per_cm: 2.0,
            trigger_tick: 0.0,
            time_samples: 3200,
        },
    )
}

fn convert_ctx<'a>(
    geometry: &'a StandardGeometry,
    viewport: &'a FrameConfig,
) -> ConvertContext<'a> {
    ConvertContext {
        geometry,
        viewport,
        tpc: TpcId::new(0, 0),
    }
}

fn particle(pdg: i32, energy: f64, steps: usize) -> SimParticle {
    SimParticle {
        track_id: 7,
        pdg,
        trajectory: (0..steps)
            .map(|step| TrajectoryPoint {
                position: [step as f64, 0.0, step as f64, step as f64 * 0.1],
                momentum: [0.0, 0.0, 1.0, energy],
            })
            .collect(),
    }
}

#[test]
fn registry_holds_one_factory_per_kind() {
    let mut registry = FactoryRegistry::new();
    registry
        .register(create_factory(ProductKind::Hit))
        .expect("first registration");
    let err = registry
        .register(create_factory(ProductKind::Hit))
        .expect_err("second registration must fail");
    assert!(err.to_string().contains("already registered"));

    assert!(registry.contains(ProductKind::Hit));
    assert!(!registry.contains(ProductKind::Track));
}

#[test]
fn every_kind_has_a_builtin_factory() {
    for kind in [
        ProductKind::RawDigit,
        ProductKind::Hit,
        ProductKind::Wire,
        ProductKind::SimParticle,
        ProductKind::Track,
    ] {
        assert_eq!(create_factory(kind).kind(), kind);
    }
}

#[test]
fn reconfigure_updates_label_and_settings() {
    let mut factory = create_factory(ProductKind::SimParticle);
    factory.reconfigure(&FactoryConfig::with_settings(
        "generator",
        json!({ "min_energy": 0.5, "skip_pdg": [2112, 22] }),
    ));
    assert_eq!(factory.label(), "generator");

    // below the new threshold
    assert!(!factory.select(ProductRef::SimParticle(&particle(13, 0.2, 3))));
    assert!(factory.select(ProductRef::SimParticle(&particle(13, 1.0, 3))));
    // skip-listed species
    assert!(!factory.select(ProductRef::SimParticle(&particle(22, 1.0, 3))));
    assert!(!factory.select(ProductRef::SimParticle(&particle(2112, 1.0, 3))));
}

#[test]
fn sim_particle_selection_rejects_nuclear_codes() {
    let factory = SimParticleFactory::default();
    assert!(factory.select(ProductRef::SimParticle(&particle(13, 1.0, 3))));
    assert!(!factory.select(ProductRef::SimParticle(&particle(1_000_180_400, 1.0, 3))));
}

#[test]
fn sim_particle_conversion_builds_a_trajectory_subtree() {
    let geometry = test_geometry();
    let viewport = FrameConfig {
        width: 1000,
        height: 400,
    };
    let ctx = convert_ctx(&geometry, &viewport);
    let factory = create_factory(ProductKind::SimParticle);

    let mut arena = ElementArena::new();
    let root = factory
        .convert(ProductRef::SimParticle(&particle(13, 1.0, 5)), &ctx, &mut arena)
        .expect("convert")
        .expect("element");

    let node = arena.node(root).expect("root node");
    assert!(node.name.contains("pdg 13"));
    match &node.shape {
        Shape::Polyline { points } => assert_eq!(points.len(), 5),
        other => panic!("expected polyline, got {other:?}"),
    }
    // path marks ride along as a child
    assert_eq!(node.children.len(), 1);
}

#[test]
fn sim_particle_trajectory_is_cut_at_the_radius_bound() {
    let geometry = test_geometry();
    let viewport = FrameConfig {
        width: 1000,
        height: 400,
    };
    let ctx = convert_ctx(&geometry, &viewport);
    let mut factory = create_factory(ProductKind::SimParticle);
    factory.reconfigure(&FactoryConfig::with_settings(
        "generator",
        json!({ "max_radius": 2.5 }),
    ));

    let mut arena = ElementArena::new();
    let root = factory
        .convert(ProductRef::SimParticle(&particle(13, 1.0, 10)), &ctx, &mut arena)
        .expect("convert")
        .expect("element");
    match &arena.node(root).expect("root").shape {
        // steps at x = 0, 1, 2 stay inside radius 2.5
        Shape::Polyline { points } => assert_eq!(points.len(), 3),
        other => panic!("expected polyline, got {other:?}"),
    }
}

#[test]
fn hit_conversion_places_the_box_by_the_scale_law() {
    let geometry = test_geometry();
    let viewport = FrameConfig {
        width: 1000,
        height: 400,
    };
    let ctx = convert_ctx(&geometry, &viewport);
    let factory = create_factory(ProductKind::Hit);

    // channel 110 is wire 10 of plane 1 (140 wires)
    let hit = Hit {
        channel: 110,
        start_tick: 90.0,
        end_tick: 110.0,
        peak_tick: 100.0,
        integral: 120.0,
    };
    let mut arena = ElementArena::new();
    let id = factory
        .convert(ProductRef::Hit(&hit), &ctx, &mut arena)
        .expect("convert")
        .expect("element");

    let scale = 3200.0 * 1000.0 / 400.0 * 3.5 / 140.0;
    match arena.node(id).expect("hit node").shape {
        Shape::Box {
            center,
            half_extents,
        } => {
            assert!((center[1] - 100.0).abs() < 1e-9);
            assert!((center[2] - 10.0 * scale).abs() < 1e-9);
            assert!((half_extents[1] - 10.0).abs() < 1e-9);
            assert!((half_extents[2] - scale / 2.0).abs() < 1e-9);
        }
        ref other => panic!("expected box, got {other:?}"),
    }
}

#[test]
fn hit_with_an_ambiguous_channel_is_a_conversion_error() {
    let mut geometry = test_geometry();
    geometry.alias_channel(110, TpcId::new(0, 0).plane(2).wire(3));
    let viewport = FrameConfig {
        width: 1000,
        height: 400,
    };
    let ctx = convert_ctx(&geometry, &viewport);
    let factory = create_factory(ProductKind::Hit);

    let hit = Hit {
        channel: 110,
        start_tick: 90.0,
        end_tick: 110.0,
        peak_tick: 100.0,
        integral: 120.0,
    };
    let mut arena = ElementArena::new();
    let err = factory
        .convert(ProductRef::Hit(&hit), &ctx, &mut arena)
        .expect_err("ambiguous channel must not convert");
    match err {
        ConvertError::Geometry(GeometryError::AmbiguousChannel { channel, wires }) => {
            assert_eq!(channel, 110);
            assert_eq!(wires, 2);
        }
        other => panic!("expected ambiguous-channel error, got {other:?}"),
    }
    // nothing was left behind in the arena
    assert!(arena.is_empty());
}

#[test]
fn hit_selection_applies_the_integral_cut() {
    let mut factory = create_factory(ProductKind::Hit);
    factory.reconfigure(&FactoryConfig::with_settings(
        "gaushit",
        json!({ "adc_cut": 50.0 }),
    ));
    let low = Hit {
        channel: 0,
        start_tick: 0.0,
        end_tick: 1.0,
        peak_tick: 0.5,
        integral: 10.0,
    };
    let high = Hit { integral: 80.0, ..low.clone() };
    assert!(!factory.select(ProductRef::Hit(&low)));
    assert!(factory.select(ProductRef::Hit(&high)));
}

#[test]
fn raw_digit_conversion_groups_one_box_per_pulse() {
    let geometry = test_geometry();
    let viewport = FrameConfig {
        width: 1000,
        height: 400,
    };
    let ctx = convert_ctx(&geometry, &viewport);
    let mut factory = create_factory(ProductKind::RawDigit);
    factory.reconfigure(&FactoryConfig::with_settings(
        "daq",
        json!({ "adc_cut": 10.0 }),
    ));

    let mut adc = vec![0i16; 64];
    adc[4] = 80;
    adc[5] = 120;
    adc[30] = -40;
    let digit = RawDigit {
        channel: 3,
        pedestal: 0.0,
        adc,
    };

    let mut arena = ElementArena::new();
    let root = factory
        .convert(ProductRef::RawDigit(&digit), &ctx, &mut arena)
        .expect("convert")
        .expect("element");
    let node = arena.node(root).expect("digit node");
    assert_eq!(node.name, "daq ch 3");
    assert_eq!(node.children.len(), 2);
}

#[test]
fn quiet_raw_digit_produces_no_element() {
    let geometry = test_geometry();
    let viewport = FrameConfig {
        width: 1000,
        height: 400,
    };
    let ctx = convert_ctx(&geometry, &viewport);
    let factory = create_factory(ProductKind::RawDigit);

    let digit = RawDigit {
        channel: 3,
        pedestal: 0.0,
        adc: vec![0i16; 64],
    };
    let mut arena = ElementArena::new();
    let element = factory
        .convert(ProductRef::RawDigit(&digit), &ctx, &mut arena)
        .expect("convert");
    assert!(element.is_none());
    assert!(arena.is_empty());
}

#[test]
fn factory_rejects_the_wrong_product_kind() {
    let geometry = test_geometry();
    let viewport = FrameConfig {
        width: 1000,
        height: 400,
    };
    let ctx = convert_ctx(&geometry, &viewport);
    let factory = create_factory(ProductKind::Track);

    let hit = Hit {
        channel: 0,
        start_tick: 0.0,
        end_tick: 1.0,
        peak_tick: 0.5,
        integral: 1.0,
    };
    let mut arena = ElementArena::new();
    let err = factory
        .convert(ProductRef::Hit(&hit), &ctx, &mut arena)
        .expect_err("kind mismatch");
    assert!(matches!(err, ConvertError::KindMismatch { .. }));
}

#[test]
fn track_selection_honors_min_points() {
    let mut factory = create_factory(ProductKind::Track);
    factory.reconfigure(&FactoryConfig::with_settings(
        "pandora",
        json!({ "min_points": 4 }),
    ));
    let short = RecoTrack {
        id: 1,
        points: vec![[0.0; 3]; 3],
    };
    let long = RecoTrack {
        id: 2,
        points: vec![[0.0; 3]; 4],
    };
    assert!(!factory.select(ProductRef::Track(&short)));
    assert!(factory.select(ProductRef::Track(&long)));
}

#[test]
fn geometry_handle_is_shareable_across_the_session() {
    // factories only borrow the geometry; one Arc serves the whole display
    let geometry: Arc<dyn Geometry> = Arc::new(test_geometry());
    assert_eq!(geometry.time_sample_count(), 3200);
}
