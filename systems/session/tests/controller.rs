use std::time::Duration;

use glam::Vec3;
use traffic_viewer_core::{
    GridCoord, Heading, IntersectionCell, MapLayout, Metrics, RoadCell, SignalId, SignalPhase,
    SignalUpdate, Snapshot, VehicleId, VehicleUpdate, ViewerConfig, Zone,
};
use traffic_viewer_registry::testing::RecordingFactory;
use traffic_viewer_registry::{Tint, VisualClass};
use traffic_viewer_system_analytics::BaselineCapture;
use traffic_viewer_system_grouping::SignalKey;
use traffic_viewer_system_session::{EventOutcome, LinkEvent, SessionController, SessionEpoch};

fn controller(factory: RecordingFactory) -> SessionController<RecordingFactory> {
    SessionController::new(&ViewerConfig::default(), factory)
}

fn layout() -> MapLayout {
    MapLayout {
        width: 4,
        height: 4,
        roads: vec![
            RoadCell {
                cell: GridCoord::new(0, 1),
                heading: Heading::East,
                zone: Zone::Downtown,
            },
            RoadCell {
                cell: GridCoord::new(1, 1),
                heading: Heading::East,
                zone: Zone::Residential,
            },
        ],
        intersections: vec![
            IntersectionCell {
                cell: GridCoord::new(2, 2),
                has_light: true,
            },
            IntersectionCell {
                cell: GridCoord::new(1, 1),
                has_light: false,
            },
        ],
    }
}

fn snapshot(tick: u64) -> Snapshot {
    Snapshot {
        tick,
        vehicles: Some(vec![
            VehicleUpdate {
                id: VehicleId::new(1),
                cell: GridCoord::new(0, 0),
                heading: Heading::North,
                speed: 0.0,
            },
            VehicleUpdate {
                id: VehicleId::new(2),
                cell: GridCoord::new(3, 0),
                heading: Heading::East,
                speed: 1.0,
            },
        ]),
        signals: Some(vec![SignalUpdate {
            id: SignalId::new(10),
            cell: GridCoord::new(2, 2),
            phase: SignalPhase::Primary,
        }]),
        metrics: Metrics {
            avg_wait_seconds: Some(12.5),
            ..Metrics::default()
        },
        ..Snapshot::default()
    }
}

#[test]
fn map_spawns_one_tile_per_cell() {
    let mut session = controller(RecordingFactory::new());

    let tiles = session.load_map(layout());

    assert_eq!(tiles, 3);
    assert_eq!(session.tiles().len(), 3);
    let road = session.tiles().get(&GridCoord::new(1, 1)).expect("road tile");
    assert_eq!(road.target().tint, Tint::Road(Zone::Residential));
    let junction = session.tiles().get(&GridCoord::new(2, 2)).expect("junction tile");
    assert_eq!(junction.target().tint, Tint::Intersection { signalised: true });
    assert!(session.map().is_some());
}

#[test]
fn reloading_the_map_replaces_previous_tiles() {
    let mut session = controller(RecordingFactory::new());
    let _ = session.load_map(layout());
    let _ = session.load_map(layout());

    assert_eq!(session.tiles().len(), 3);
    assert_eq!(session.factory().live_count(), 3);
    assert_eq!(session.factory().disposed().len(), 3);
}

#[test]
fn missing_tile_template_keeps_the_map_without_tiles() {
    let mut session = controller(RecordingFactory::new().without(VisualClass::Tile));

    assert_eq!(session.load_map(layout()), 0);
    assert!(session.tiles().is_empty());
    assert!(session.map().is_some());
}

#[test]
fn snapshot_populates_both_registries() {
    let mut session = controller(RecordingFactory::new());

    let outcome = session.handle_event(LinkEvent::Snapshot {
        epoch: SessionEpoch::INITIAL,
        snapshot: snapshot(5),
    });

    assert_eq!(outcome, EventOutcome::SnapshotApplied { tick: 5 });
    assert_eq!(session.vehicles().len(), 2);
    assert_eq!(session.signals().len(), 2);
    let eastbound = session
        .vehicles()
        .get(&VehicleId::new(2))
        .expect("vehicle 2 tracked");
    assert_eq!(eastbound.current_position(), Vec3::new(3.0, 0.0, 0.25));
    assert_eq!(session.analytics().latest_tick(), Some(5));
}

#[test]
fn legacy_lights_track_signal_cells() {
    let config = ViewerConfig {
        directional_lights: false,
        ..ViewerConfig::default()
    };
    let mut session = SessionController::new(&config, RecordingFactory::new());

    session.apply_snapshot(&snapshot(1));

    assert_eq!(session.signals().len(), 1);
    assert!(session
        .signals()
        .get(&SignalKey::Cell(SignalId::new(10)))
        .is_some());
}

#[test]
fn missing_signal_template_still_updates_vehicles() {
    let mut session = controller(RecordingFactory::new().without(VisualClass::Signal));

    session.apply_snapshot(&snapshot(1));

    assert_eq!(session.vehicles().len(), 2);
    assert!(session.signals().is_empty());
    assert_eq!(session.factory().spawn_count(VisualClass::Signal), 0);
}

#[test]
fn frames_move_vehicles_toward_new_targets() {
    let mut session = controller(RecordingFactory::new());
    session.apply_snapshot(&snapshot(1));
    let mut moved = snapshot(2);
    if let Some(vehicles) = moved.vehicles.as_mut() {
        vehicles[1].cell = GridCoord::new(4, 0);
    }
    session.apply_snapshot(&moved);

    session.advance_frame(Duration::from_millis(50));

    let x = session
        .vehicles()
        .get(&VehicleId::new(2))
        .expect("vehicle 2 tracked")
        .current_position()
        .x;
    assert!(x > 3.0 && x < 4.0, "vehicle should be between cells, got {x}");
}

#[test]
fn reset_disposes_everything_and_frames_keep_running() {
    let mut session = controller(RecordingFactory::new());
    let _ = session.load_map(layout());
    session.apply_snapshot(&snapshot(1));

    let epoch = session.reset();
    session.advance_frame(Duration::from_millis(16));

    assert_eq!(epoch, SessionEpoch::INITIAL.next());
    assert!(session.vehicles().is_empty());
    assert!(session.signals().is_empty());
    assert!(session.tiles().is_empty());
    assert!(session.map().is_none());
    assert_eq!(session.factory().live_count(), 0);
    assert_eq!(session.analytics().latest_tick(), None);
}

#[test]
fn events_from_before_a_reset_are_discarded() {
    let mut session = controller(RecordingFactory::new());
    let _ = session.reset();

    let outcome = session.handle_event(LinkEvent::Snapshot {
        epoch: SessionEpoch::INITIAL,
        snapshot: snapshot(9),
    });

    assert_eq!(outcome, EventOutcome::Stale);
    assert!(session.vehicles().is_empty());

    let outcome = session.handle_event(LinkEvent::MapLoaded {
        epoch: session.epoch(),
        layout: layout(),
    });
    assert_eq!(outcome, EventOutcome::MapLoaded { tiles: 3 });
}

#[test]
fn baseline_is_unavailable_until_a_wait_is_reported() {
    let mut session = controller(RecordingFactory::new());

    assert_eq!(session.capture_baseline(), BaselineCapture::Unavailable);

    session.apply_snapshot(&snapshot(1));
    assert_eq!(session.capture_baseline(), BaselineCapture::Captured(12.5));

    let _ = session.reset();
    assert_eq!(session.analytics().baseline(), None);
}
