use std::time::Duration;

use glam::Vec3;
use proptest::prelude::*;
use traffic_viewer_registry::testing::{RecordedHandle, RecordingFactory};
use traffic_viewer_registry::{
    EntityRegistry, Placement, Tint, VisualClass, VisualFactory, VisualTarget,
};
use traffic_viewer_system_interpolation::InterpolationScheduler;

type Registry = EntityRegistry<u32, RecordedHandle>;

fn seeded(start: Vec3, end: Vec3) -> Registry {
    let mut registry = Registry::new();
    let mut factory = RecordingFactory::new();
    let _ = registry.upsert(
        1,
        VisualTarget::new(start, 0.0, Tint::Cruising),
        Placement::Interpolate,
        |target| factory.spawn(VisualClass::Vehicle, target),
    );
    let _ = registry.upsert(
        1,
        VisualTarget::new(end, 0.0, Tint::Cruising),
        Placement::Interpolate,
        |_| unreachable!("entity already exists"),
    );
    registry
}

fn remaining(registry: &Registry) -> f32 {
    registry
        .get(&1)
        .expect("entity tracked")
        .remaining_distance()
}

#[test]
fn positions_converge_without_overshoot() {
    let mut registry = seeded(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0));
    let scheduler = InterpolationScheduler::new(10.0, true);

    let mut previous = remaining(&registry);
    for _ in 0..30 {
        let _ = scheduler.step(&mut registry, Duration::from_millis(16));
        let current = remaining(&registry);
        assert!(current < previous, "distance must shrink every frame");
        let x = registry.get(&1).expect("tracked").current_position().x;
        assert!((0.0..=4.0).contains(&x), "position overshot to {x}");
        previous = current;
    }
    assert!(previous < 0.1);
}

#[test]
fn long_frame_lands_exactly_on_target() {
    let mut registry = seeded(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
    let scheduler = InterpolationScheduler::new(10.0, true);

    let _ = scheduler.step(&mut registry, Duration::from_secs(2));

    assert_eq!(
        registry.get(&1).expect("tracked").current_position(),
        Vec3::new(1.0, 2.0, 3.0)
    );
}

#[test]
fn disabled_scheduler_is_inert() {
    let mut registry = seeded(Vec3::ZERO, Vec3::X);
    let scheduler = InterpolationScheduler::new(10.0, false);

    assert_eq!(scheduler.step(&mut registry, Duration::from_millis(16)), 0);
    assert_eq!(
        registry.get(&1).expect("tracked").current_position(),
        Vec3::ZERO
    );
}

#[test]
fn empty_registry_steps_cleanly() {
    let mut registry = Registry::new();
    let scheduler = InterpolationScheduler::default();

    assert_eq!(scheduler.step(&mut registry, Duration::from_millis(16)), 0);
}

proptest! {
    #[test]
    fn a_step_never_increases_remaining_distance(
        tx in -100.0_f32..100.0,
        tz in -100.0_f32..100.0,
        millis in 0_u64..500,
        rate in 0.0_f32..50.0,
    ) {
        let mut registry = seeded(Vec3::ZERO, Vec3::new(tx, 0.0, tz));
        let scheduler = InterpolationScheduler::new(rate, true);
        let before = remaining(&registry);

        let _ = scheduler.step(&mut registry, Duration::from_millis(millis));

        prop_assert!(remaining(&registry) <= before + 1e-4);
    }
}
