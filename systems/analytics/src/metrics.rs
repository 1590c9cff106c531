use std::fmt;

use crate::{Analytics, TARGET_IMPROVEMENT_PERCENT};

/// Lines of text describing the session metrics, ready for display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsPanel {
    lines: Vec<String>,
}

impl MetricsPanel {
    pub(crate) fn from_analytics(analytics: &Analytics) -> Self {
        let mut lines = Vec::new();

        match analytics.latest_tick() {
            Some(tick) => lines.push(format!("Tick: {tick}")),
            None => lines.push("Waiting for simulation...".to_owned()),
        }

        if let Some(metrics) = analytics.latest() {
            if let Some(cars) = metrics.car_count {
                lines.push(format!("Cars: {cars}"));
            }
            if let Some(speed) = metrics.avg_speed {
                lines.push(format!("Avg speed: {speed:.2}"));
            }
            match (metrics.avg_wait_ticks, metrics.avg_wait_seconds) {
                (Some(ticks), Some(seconds)) => lines.push(format!(
                    "Avg wait: {ticks:.1} ticks ({})",
                    format_seconds(seconds)
                )),
                (Some(ticks), None) => lines.push(format!("Avg wait: {ticks:.1} ticks")),
                (None, Some(seconds)) => {
                    lines.push(format!("Avg wait: {}", format_seconds(seconds)));
                }
                (None, None) => {}
            }
            match (metrics.signal_mode, metrics.light_cycle) {
                (Some(mode), Some(cycle)) => {
                    lines.push(format!("Signals: {} (cycle {cycle})", mode.as_str()));
                }
                (Some(mode), None) => lines.push(format!("Signals: {}", mode.as_str())),
                _ => {}
            }
        }

        match analytics.baseline() {
            Some(seconds) => lines.push(format!("Baseline: {}", format_seconds(seconds))),
            None => lines.push("Baseline: unavailable".to_owned()),
        }

        if let Some(improvement) = analytics.improvement_percent() {
            let verdict = if improvement >= TARGET_IMPROVEMENT_PERCENT {
                "target met"
            } else {
                "below target"
            };
            lines.push(format!("Improvement: {improvement:.2}% ({verdict})"));
        }

        Self { lines }
    }

    /// Individual lines of the panel, top to bottom.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for MetricsPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join(" | "))
    }
}

/// Formats a duration in seconds with two decimals.
#[must_use]
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.2} s")
}
