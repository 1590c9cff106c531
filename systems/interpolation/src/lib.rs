#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-frame smoothing of rendered positions toward their latest targets.

use std::time::Duration;

use traffic_viewer_core::ViewerConfig;
use traffic_viewer_registry::EntityRegistry;

/// Advances rendered positions with exponential convergence.
///
/// Each step closes `min(1, dt * rate)` of the remaining distance, so
/// positions approach their target monotonically and never overshoot. The
/// scheduler runs once per rendered frame regardless of how often snapshots
/// arrive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolationScheduler {
    convergence_rate: f32,
    enabled: bool,
}

impl InterpolationScheduler {
    /// Creates a scheduler closing `convergence_rate` of the remaining
    /// distance per second. Disabled schedulers never move anything.
    #[must_use]
    pub fn new(convergence_rate: f32, enabled: bool) -> Self {
        let convergence_rate = if convergence_rate.is_finite() {
            convergence_rate.max(0.0)
        } else {
            0.0
        };
        Self {
            convergence_rate,
            enabled,
        }
    }

    /// Creates a scheduler from the smoothing settings of `config`.
    #[must_use]
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.convergence_rate, config.smooth)
    }

    /// Reports whether the scheduler moves rendered positions.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fraction of the remaining distance closed by a frame lasting `dt`.
    #[must_use]
    pub fn fraction(&self, dt: Duration) -> f32 {
        let seconds = dt.as_secs_f32();
        (seconds * self.convergence_rate).min(1.0)
    }

    /// Moves every entity of `registry` toward its target. Returns the number
    /// of entities visited.
    pub fn step<K, H>(&self, registry: &mut EntityRegistry<K, H>, dt: Duration) -> usize
    where
        K: Ord + Copy,
        H: Copy,
    {
        if !self.enabled {
            return 0;
        }

        let fraction = self.fraction(dt);
        let mut visited = 0;
        for entity in registry.entities_mut() {
            entity.approach(fraction);
            visited += 1;
        }
        visited
    }
}

impl Default for InterpolationScheduler {
    fn default() -> Self {
        Self::new(10.0, true)
    }
}

/// Converts a frame time reported in seconds into a duration, treating
/// negative and non-finite values as an empty frame.
#[must_use]
pub fn frame_delta(seconds: f32) -> Duration {
    Duration::try_from_secs_f32(seconds).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_saturates_at_one() {
        let scheduler = InterpolationScheduler::new(10.0, true);
        assert_eq!(scheduler.fraction(Duration::from_secs(1)), 1.0);
        assert!((scheduler.fraction(Duration::from_millis(16)) - 0.16).abs() < 1e-6);
    }

    #[test]
    fn degenerate_frame_times_become_empty_frames() {
        assert_eq!(frame_delta(f32::NAN), Duration::ZERO);
        assert_eq!(frame_delta(-0.5), Duration::ZERO);
        assert_eq!(frame_delta(f32::INFINITY), Duration::ZERO);
        assert_eq!(frame_delta(0.25), Duration::from_millis(250));
    }

    #[test]
    fn invalid_rate_is_inert() {
        let scheduler = InterpolationScheduler::new(f32::NAN, true);
        assert_eq!(scheduler.fraction(Duration::from_secs(1)), 0.0);
    }
}
