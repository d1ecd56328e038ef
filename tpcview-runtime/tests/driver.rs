use std::sync::Arc;
use std::thread;
use std::time::Duration;

use geometry::{DriftSpec, PlaneSpec, StandardGeometry, TpcId, TpcSpec};
use scene::SceneLayout;
use serde_json::json;
use tpcview_core::builder::SceneBuilder;
use tpcview_core::context::{DisplayContext, SharedViewport};
use tpcview_core::event::InMemoryEvent;
use tpcview_core::factory::{create_factory, FactoryConfig};
use tpcview_core::geo::GeoSceneMaker;
use tpcview_core::product::{Hit, ProductKind};
use tpcview_core::proj::{ProjectionManager, TimeWireProjection};
use tpcview_runtime::{advance, DisplayDriver, EventAddress, NavChannel, NavCommand};

fn test_context() -> DisplayContext {
    let geometry = StandardGeometry::new(
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
                    wire_count: 200,
                    wire_pitch: 0.4,
                    wire_angle: 0.0,
                    center: [-0.5, 0.0, 0.0],
                },
            ],
        }],
        DriftSpec {
            ticks_per_cm: 2.0,
            trigger_tick: 0.0,
            time_samples: 3200,
        },
    );
    let mut ctx = DisplayContext::new(
        Arc::new(geometry),
        Arc::new(SharedViewport::new(1000, 400)),
        TpcId::new(0, 0),
    )
    .expect("context");
    ctx.registry
        .register(create_factory(ProductKind::Hit))
        .expect("register hit factory");
    ctx.registry
        .get_mut(ProductKind::Hit)
        .expect("hit factory")
        .reconfigure(&FactoryConfig::with_settings("gaushit", json!({})));
    ctx
}

fn event_with_hits(channels: &[u32]) -> InMemoryEvent {
    let mut event = InMemoryEvent::new();
    event.add_hits(
        "gaushit",
        channels
            .iter()
            .map(|channel| Hit {
                channel: *channel,
                start_tick: 90.0,
                end_tick: 110.0,
                peak_tick: 100.0,
                integral: 120.0,
            })
            .collect(),
    );
    event
}

fn addressed_events() -> Vec<(EventAddress, InMemoryEvent)> {
    (0..4u64)
        .map(|n| {
            (
                EventAddress::new(1, 0, n),
                event_with_hits(&[n as u32, n as u32 + 1]),
            )
        })
        .collect()
}

#[test]
fn advance_steps_through_the_source() {
    let addresses: Vec<EventAddress> =
        (0..3).map(|n| EventAddress::new(1, 0, n)).collect();

    assert_eq!(advance(0, NavCommand::NextEvent, &addresses), Some(1));
    assert_eq!(advance(2, NavCommand::NextEvent, &addresses), None);
    assert_eq!(advance(2, NavCommand::SequentialOnly, &addresses), None);
    assert_eq!(advance(2, NavCommand::PrevEvent, &addresses), Some(1));
    assert_eq!(advance(0, NavCommand::PrevEvent, &addresses), Some(0));
    assert_eq!(advance(1, NavCommand::ReloadEvent, &addresses), Some(1));
    assert_eq!(
        advance(
            0,
            NavCommand::GotoEvent {
                target: EventAddress::new(1, 0, 2)
            },
            &addresses
        ),
        Some(2)
    );
    // an unknown target stays on the current event
    assert_eq!(
        advance(
            1,
            NavCommand::GotoEvent {
                target: EventAddress::new(9, 9, 9)
            },
            &addresses
        ),
        Some(1)
    );
}

#[test]
fn initialize_runs_every_make_global_once() {
    let mut ctx = test_context();
    let mut driver = DisplayDriver::new();
    driver.add_geo_maker(GeoSceneMaker::new("geo"));
    driver.add_builder(SceneBuilder::new(
        "evd",
        SceneLayout::Single,
        vec![ProductKind::Hit],
    ));
    driver.initialize(&mut ctx).expect("initialize");

    assert!(ctx.scenes.contains("geo"));
    assert!(ctx.scenes.contains("evd"));
    assert!(driver.initialize(&mut ctx).is_err());
}

#[test]
fn draw_event_rebuilds_builders_and_projections() {
    let mut ctx = test_context();
    let mut driver = DisplayDriver::new();
    driver.add_builder(SceneBuilder::new(
        "evd",
        SceneLayout::Single,
        vec![ProductKind::Hit],
    ));
    driver.add_projector(ProjectionManager::new(
        "evd",
        Box::new(TimeWireProjection::new()),
    ));
    driver.initialize(&mut ctx).expect("initialize");

    driver
        .draw_event(&mut ctx, &event_with_hits(&[0, 1, 2]))
        .expect("draw event");

    assert_eq!(ctx.scenes.get("evd").expect("evd").roots().len(), 3);
    // one projected destination per plane, rebuilt from the source
    assert_eq!(ctx.scenes.get("evd0").expect("evd0").roots().len(), 3);
    assert_eq!(ctx.scenes.get("evd1").expect("evd1").roots().len(), 3);

    driver
        .draw_event(&mut ctx, &event_with_hits(&[5]))
        .expect("next event");
    assert_eq!(ctx.scenes.get("evd").expect("evd").roots().len(), 1);
    assert_eq!(ctx.scenes.get("evd0").expect("evd0").roots().len(), 1);
}

#[test]
fn run_draws_until_the_source_is_exhausted() {
    let mut ctx = test_context();
    let mut driver = DisplayDriver::new();
    driver.add_builder(SceneBuilder::new(
        "evd",
        SceneLayout::Single,
        vec![ProductKind::Hit],
    ));
    driver.initialize(&mut ctx).expect("initialize");

    let nav = NavChannel::new();
    let gui = nav.clone();
    let handle = thread::spawn(move || {
        // keep pressing "next" until the loop has had every step it needs
        for _ in 0..50 {
            thread::sleep(Duration::from_millis(2));
            gui.post(NavCommand::NextEvent);
        }
        gui.disconnect();
    });

    let events = addressed_events();
    let draws = driver.run(&mut ctx, &events, &nav).expect("run");
    handle.join().expect("gui thread");
    // 4 events, then the next step runs off the end
    assert_eq!(draws, 4);
}

#[test]
fn run_ends_when_the_gui_disconnects() {
    let mut ctx = test_context();
    let mut driver = DisplayDriver::new();
    driver.add_builder(SceneBuilder::new(
        "evd",
        SceneLayout::Single,
        vec![ProductKind::Hit],
    ));
    driver.initialize(&mut ctx).expect("initialize");

    let nav = NavChannel::new();
    let gui = nav.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        gui.post(NavCommand::ReloadEvent);
        thread::sleep(Duration::from_millis(5));
        gui.disconnect();
    });

    let events = addressed_events();
    let draws = driver.run(&mut ctx, &events, &nav).expect("run");
    handle.join().expect("gui thread");
    // event 0 drawn, reloaded once, then the window went away
    assert_eq!(draws, 2);
}
