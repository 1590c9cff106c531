use traffic_viewer_core::{Metrics, SignalMode};
use traffic_viewer_system_analytics::{Analytics, BaselineCapture};

fn metrics(avg_wait_seconds: Option<f64>) -> Metrics {
    Metrics {
        car_count: Some(12),
        avg_speed: Some(0.48),
        avg_wait_ticks: avg_wait_seconds.map(|seconds| seconds / 4.0),
        avg_wait_seconds,
        signal_mode: Some(SignalMode::Fixed),
        light_cycle: Some(12),
    }
}

#[test]
fn capture_without_reported_wait_is_unavailable() {
    let mut analytics = Analytics::new();

    assert_eq!(analytics.capture_baseline(), BaselineCapture::Unavailable);

    analytics.observe(4, &metrics(None));
    assert_eq!(analytics.capture_baseline(), BaselineCapture::Unavailable);
    assert_eq!(analytics.baseline(), None);
}

#[test]
fn capture_records_latest_wait_each_time() {
    let mut analytics = Analytics::new();
    analytics.observe(1, &metrics(Some(20.0)));
    assert_eq!(analytics.capture_baseline(), BaselineCapture::Captured(20.0));

    analytics.observe(2, &metrics(Some(18.0)));
    assert_eq!(analytics.baseline(), Some(20.0));
    assert_eq!(analytics.capture_baseline(), BaselineCapture::Captured(18.0));
    assert_eq!(analytics.baseline(), Some(18.0));
}

#[test]
fn unavailable_capture_keeps_previous_baseline() {
    let mut analytics = Analytics::new();
    analytics.observe(1, &metrics(Some(20.0)));
    assert_eq!(analytics.capture_baseline(), BaselineCapture::Captured(20.0));

    analytics.observe(2, &metrics(None));
    assert_eq!(analytics.capture_baseline(), BaselineCapture::Unavailable);
    assert_eq!(analytics.baseline(), Some(20.0));

    analytics.observe(3, &metrics(Some(f64::NAN)));
    assert_eq!(analytics.capture_baseline(), BaselineCapture::Unavailable);
    assert_eq!(analytics.baseline(), Some(20.0));
}

#[test]
fn improvement_compares_current_wait_against_baseline() {
    let mut analytics = Analytics::new();
    analytics.observe(1, &metrics(Some(20.0)));
    let _ = analytics.capture_baseline();

    analytics.observe(2, &metrics(Some(18.0)));
    let improvement = analytics.improvement_percent().expect("both waits known");
    assert!((improvement - 10.0).abs() < 1e-9);
    assert_eq!(analytics.meets_target(), Some(true));

    analytics.observe(3, &metrics(Some(19.5)));
    assert_eq!(analytics.meets_target(), Some(false));
}

#[test]
fn clear_forgets_metrics_and_baseline() {
    let mut analytics = Analytics::new();
    analytics.observe(1, &metrics(Some(20.0)));
    let _ = analytics.capture_baseline();

    analytics.clear();

    assert!(analytics.latest().is_none());
    assert_eq!(analytics.baseline(), None);
    assert_eq!(analytics.improvement_percent(), None);
}

#[test]
fn panel_lists_reported_metrics() {
    let mut analytics = Analytics::new();
    assert_eq!(
        analytics.panel().lines(),
        ["Waiting for simulation...", "Baseline: unavailable"]
    );

    analytics.observe(7, &metrics(Some(20.0)));
    let _ = analytics.capture_baseline();
    analytics.observe(8, &metrics(Some(18.0)));

    let panel = analytics.panel();
    assert_eq!(
        panel.lines(),
        [
            "Tick: 8",
            "Cars: 12",
            "Avg speed: 0.48",
            "Avg wait: 4.5 ticks (18.00 s)",
            "Signals: fixed (cycle 12)",
            "Baseline: 20.00 s",
            "Improvement: 10.00% (target met)",
        ]
    );
    assert!(panel.to_string().starts_with("Tick: 8 | Cars: 12"));
}

#[test]
fn panel_omits_metrics_the_server_did_not_send() {
    let mut analytics = Analytics::new();
    analytics.observe(3, &Metrics::default());

    assert_eq!(
        analytics.panel().lines(),
        ["Tick: 3", "Baseline: unavailable"]
    );
}
