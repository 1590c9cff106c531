#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session metrics bookkeeping and baseline comparison.

mod metrics;

pub use metrics::{format_seconds, MetricsPanel};

use traffic_viewer_core::Metrics;

/// Reduction of the average wait, in percent, the session aims for relative
/// to its captured baseline.
pub const TARGET_IMPROVEMENT_PERCENT: f64 = 5.0;

/// Outcome of a baseline capture request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BaselineCapture {
    /// The latest average wait in seconds became the baseline.
    Captured(f64),
    /// No average wait had been reported, so no baseline is set.
    Unavailable,
}

/// Tracks the most recent metrics and the baseline captured by the user.
#[derive(Clone, Debug, Default)]
pub struct Analytics {
    latest: Option<Metrics>,
    latest_tick: Option<u64>,
    baseline: Option<f64>,
}

impl Analytics {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the metrics reported alongside the snapshot for `tick`.
    pub fn observe(&mut self, tick: u64, metrics: &Metrics) {
        self.latest = Some(metrics.clone());
        self.latest_tick = Some(tick);
    }

    /// Returns the most recently observed metrics, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Metrics> {
        self.latest.as_ref()
    }

    /// Tick of the most recently observed snapshot, if any.
    #[must_use]
    pub fn latest_tick(&self) -> Option<u64> {
        self.latest_tick
    }

    /// Latest average wait in seconds, when the server reported a finite one.
    #[must_use]
    pub fn current_wait_seconds(&self) -> Option<f64> {
        self.latest
            .as_ref()
            .and_then(|metrics| metrics.avg_wait_seconds)
            .filter(|seconds| seconds.is_finite())
    }

    /// Replaces the baseline with the latest average wait.
    ///
    /// Every successful call overwrites the previous baseline. A capture
    /// without a reported wait returns [`BaselineCapture::Unavailable`] and
    /// keeps whatever baseline was captured before.
    pub fn capture_baseline(&mut self) -> BaselineCapture {
        match self.current_wait_seconds() {
            Some(seconds) => {
                self.baseline = Some(seconds);
                BaselineCapture::Captured(seconds)
            }
            None => BaselineCapture::Unavailable,
        }
    }

    /// Captured baseline average wait in seconds.
    #[must_use]
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Percentage by which the current wait undercuts the baseline.
    ///
    /// Negative values mean the wait grew. Returns `None` without a positive
    /// baseline or a current wait.
    #[must_use]
    pub fn improvement_percent(&self) -> Option<f64> {
        let baseline = self.baseline.filter(|baseline| *baseline > 0.0)?;
        let current = self.current_wait_seconds()?;
        Some((baseline - current) / baseline * 100.0)
    }

    /// Reports whether the current wait meets the improvement target.
    #[must_use]
    pub fn meets_target(&self) -> Option<bool> {
        self.improvement_percent()
            .map(|improvement| improvement >= TARGET_IMPROVEMENT_PERCENT)
    }

    /// Forgets every observation and the baseline.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Text panel summarising the tracked state.
    #[must_use]
    pub fn panel(&self) -> MetricsPanel {
        MetricsPanel::from_analytics(self)
    }
}
