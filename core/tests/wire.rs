use traffic_viewer_core::{
    ConfigRequest, GridCoord, Heading, MapLayout, SignalId, SignalMode, SignalPhase, Snapshot,
    VehicleId, Zone,
};

#[test]
fn decodes_snapshot_with_metrics() {
    let payload = r#"{
        "tick": 17,
        "width": 30,
        "height": 30,
        "cars": [
            {"id": 1, "x": 0, "y": 0, "dir": "N", "speed": 1.0},
            {"id": 2, "x": 3, "y": 0, "dir": "E", "speed": 0}
        ],
        "lights": [{"id": 10, "x": 14, "y": 15, "phase": 1}],
        "count_cars": 2,
        "avg_speed": 0.5,
        "avg_wait": 3.25,
        "avg_wait_seconds": 13.0,
        "signal_mode": "adaptive",
        "light_cycle": 12
    }"#;

    let snapshot: Snapshot = serde_json::from_str(payload).expect("snapshot should decode");

    assert_eq!(snapshot.tick, 17);
    let vehicles = snapshot.vehicles.as_deref().expect("cars present");
    assert_eq!(vehicles.len(), 2);
    assert_eq!(vehicles[1].id, VehicleId::new(2));
    assert_eq!(vehicles[1].cell, GridCoord::new(3, 0));
    assert_eq!(vehicles[1].heading, Heading::East);
    assert_eq!(vehicles[1].speed, 0.0);

    let signals = snapshot.signals.as_deref().expect("lights present");
    assert_eq!(signals[0].id, SignalId::new(10));
    assert_eq!(signals[0].phase, SignalPhase::Secondary);

    assert_eq!(snapshot.metrics.car_count, Some(2));
    assert_eq!(snapshot.metrics.avg_wait_ticks, Some(3.25));
    assert_eq!(snapshot.metrics.avg_wait_seconds, Some(13.0));
    assert_eq!(snapshot.metrics.signal_mode, Some(SignalMode::Adaptive));
    assert_eq!(snapshot.metrics.light_cycle, Some(12));
}

#[test]
fn snapshot_without_metrics_or_collections_decodes_as_absent() {
    let snapshot: Snapshot =
        serde_json::from_str(r#"{"tick": 3, "cars": null}"#).expect("bare snapshot decodes");

    assert_eq!(snapshot.tick, 3);
    assert!(snapshot.vehicles.is_none());
    assert!(snapshot.signals.is_none());
    assert!(snapshot.metrics.avg_wait_seconds.is_none());
    assert!(snapshot.metrics.car_count.is_none());
}

#[test]
fn snapshot_with_invalid_phase_is_rejected() {
    let result: Result<Snapshot, _> = serde_json::from_str(
        r#"{"tick": 1, "lights": [{"id": 1, "x": 0, "y": 0, "phase": 4}]}"#,
    );
    assert!(result.is_err());
}

#[test]
fn snapshot_with_unknown_heading_is_rejected() {
    let result: Result<Snapshot, _> = serde_json::from_str(
        r#"{"tick": 1, "cars": [{"id": 1, "x": 0, "y": 0, "dir": "NE", "speed": 0.0}]}"#,
    );
    assert!(result.is_err());
}

#[test]
fn decodes_map_layout() {
    let payload = r#"{
        "width": 30,
        "height": 30,
        "roads": [
            {"x": 0, "y": 15, "dir": "E", "zone": "FUERA"},
            {"x": 12, "y": 14, "dir": "W", "zone": "CENTRO"}
        ],
        "intersections": [
            {"x": 15, "y": 15, "hasLight": true},
            {"x": 6, "y": 6, "hasLight": false}
        ]
    }"#;

    let layout: MapLayout = serde_json::from_str(payload).expect("map should decode");

    assert_eq!(layout.width, 30);
    assert_eq!(layout.cell_count(), 4);
    assert_eq!(layout.roads[1].zone, Zone::Downtown);
    assert_eq!(layout.roads[1].heading, Heading::West);
    assert!(layout.intersections[0].has_light);
    assert!(!layout.intersections[1].has_light);
}

#[test]
fn config_request_serializes_wire_names() {
    let request = ConfigRequest::new(SignalMode::Adaptive, 9, 1.5);
    let value = serde_json::to_value(request).expect("request serializes");

    assert_eq!(value["signal_mode"], "adaptive");
    assert_eq!(value["light_cycle"], 9);
    assert_eq!(value["base_spawn_scale"], 1.5);
}
