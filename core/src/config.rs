use std::time::Duration;

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_SERVER_URL: &str = "http://localhost:8585";
const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(200);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Viewer settings loaded from a TOML file and command-line overrides.
///
/// Every field has a default, so a partial file (or none at all) yields a
/// usable configuration. Call [`ViewerConfig::validate`] before handing the
/// configuration to the session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Base URL of the simulation server.
    pub server_url: String,
    /// Side length of a grid cell expressed in world units.
    pub cell_size: f32,
    /// World position of grid cell `(0, 0)`.
    pub world_origin: Vec3,
    /// Whether rendered positions converge smoothly toward their targets.
    pub smooth: bool,
    /// Fraction of the remaining distance closed per second while smoothing.
    pub convergence_rate: f32,
    /// Whether signals render as paired east-west/north-south indicators
    /// per intersection block instead of one indicator per signal cell.
    pub directional_lights: bool,
    /// Horizontal offset of each directional indicator from its block centre.
    pub light_separation: f32,
    /// Height of signal indicators above the road surface.
    pub light_height: f32,
    /// Rule deciding a block's phase when its cells disagree within a tick.
    pub tie_break: TieBreak,
    /// Seconds between successive snapshot requests.
    pub request_every_seconds: f64,
    /// Seconds a single request may take before it counts as failed.
    pub request_timeout_seconds: f64,
    /// Visual templates used to instantiate each entity class.
    pub templates: VisualTemplates,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            cell_size: 1.0,
            world_origin: Vec3::ZERO,
            smooth: true,
            convergence_rate: 10.0,
            directional_lights: true,
            light_separation: 0.6,
            light_height: 1.2,
            tie_break: TieBreak::FirstSeen,
            request_every_seconds: DEFAULT_REQUEST_INTERVAL.as_secs_f64(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT.as_secs_f64(),
            templates: VisualTemplates::default(),
        }
    }
}

impl ViewerConfig {
    /// Checks that every numeric setting lies within its usable range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::EmptyServerUrl);
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize {
                cell_size: self.cell_size,
            });
        }
        if !(self.convergence_rate.is_finite() && self.convergence_rate >= 0.0) {
            return Err(ConfigError::InvalidConvergenceRate {
                rate: self.convergence_rate,
            });
        }
        if !(self.light_separation.is_finite() && self.light_separation >= 0.0) {
            return Err(ConfigError::InvalidLightSeparation {
                separation: self.light_separation,
            });
        }
        if !self.light_height.is_finite() {
            return Err(ConfigError::InvalidLightHeight {
                height: self.light_height,
            });
        }
        if !(self.request_every_seconds.is_finite() && self.request_every_seconds > 0.0) {
            return Err(ConfigError::InvalidRequestInterval {
                seconds: self.request_every_seconds,
            });
        }
        if !(self.request_timeout_seconds.is_finite() && self.request_timeout_seconds > 0.0) {
            return Err(ConfigError::InvalidRequestTimeout {
                seconds: self.request_timeout_seconds,
            });
        }

        Ok(())
    }

    /// Network cadence between snapshot requests.
    #[must_use]
    pub fn request_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_every_seconds)
            .unwrap_or(DEFAULT_REQUEST_INTERVAL)
    }

    /// Upper bound on the duration of a single request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout_seconds)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Strategy resolving conflicting phases among the cells of one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The first cell of the block in snapshot order decides the phase.
    #[default]
    FirstSeen,
    /// The most frequent phase among the block's cells decides; ties fall
    /// back to the first-seen phase.
    Majority,
}

/// Geometric primitive used to draw a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateShape {
    /// Axis-aligned box.
    Cube,
    /// Sphere whose radius is half the template's largest extent.
    Sphere,
}

/// Description of the visual used for one entity class.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Whether the template is available. Disabled templates make the
    /// corresponding entity class fail with a missing visual resource.
    pub enabled: bool,
    /// Primitive drawn for each instance.
    pub shape: TemplateShape,
    /// Extent of the primitive along X, Y and Z when facing north, in cells.
    pub size: Vec3,
    /// Base colour as RGB bytes.
    pub color: [u8; 3],
}

impl TemplateConfig {
    /// Creates an enabled template.
    #[must_use]
    pub const fn new(shape: TemplateShape, size: Vec3, color: [u8; 3]) -> Self {
        Self {
            enabled: true,
            shape,
            size,
            color,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self::new(TemplateShape::Cube, Vec3::splat(0.5), [200, 200, 200])
    }
}

/// Templates for every entity class the viewer instantiates.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualTemplates {
    /// Template for vehicles.
    pub vehicle: TemplateConfig,
    /// Template for signal indicators.
    pub signal: TemplateConfig,
    /// Template for static road and intersection tiles.
    pub tile: TemplateConfig,
}

impl Default for VisualTemplates {
    fn default() -> Self {
        Self {
            vehicle: TemplateConfig::new(
                TemplateShape::Cube,
                Vec3::new(0.35, 0.3, 0.7),
                [46, 204, 113],
            ),
            signal: TemplateConfig::new(TemplateShape::Sphere, Vec3::splat(0.3), [255, 255, 255]),
            tile: TemplateConfig::new(
                TemplateShape::Cube,
                Vec3::new(1.0, 0.05, 1.0),
                [224, 224, 224],
            ),
        }
    }
}

/// Errors reported when a [`ViewerConfig`] holds unusable values.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The server URL is blank.
    #[error("server_url must not be empty")]
    EmptyServerUrl,
    /// Cells must have a positive, finite size.
    #[error("cell_size must be positive (received {cell_size})")]
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
    /// Convergence must be finite and non-negative.
    #[error("convergence_rate must be finite and non-negative (received {rate})")]
    InvalidConvergenceRate {
        /// Provided rate that failed validation.
        rate: f32,
    },
    /// Indicator separation must be finite and non-negative.
    #[error("light_separation must be finite and non-negative (received {separation})")]
    InvalidLightSeparation {
        /// Provided separation that failed validation.
        separation: f32,
    },
    /// Indicator height must be finite.
    #[error("light_height must be finite (received {height})")]
    InvalidLightHeight {
        /// Provided height that failed validation.
        height: f32,
    },
    /// The polling interval must be positive.
    #[error("request_every_seconds must be positive (received {seconds})")]
    InvalidRequestInterval {
        /// Provided interval that failed validation.
        seconds: f64,
    },
    /// The request timeout must be positive.
    #[error("request_timeout_seconds must be positive (received {seconds})")]
    InvalidRequestTimeout {
        /// Provided timeout that failed validation.
        seconds: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = ViewerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.request_interval(), Duration::from_millis(200));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: ViewerConfig = toml::from_str(
            r#"
            cell_size = 2.5
            smooth = false
            tie_break = "majority"

            [templates.signal]
            enabled = false
            "#,
        )
        .expect("partial configuration should parse");

        assert_eq!(config.cell_size, 2.5);
        assert!(!config.smooth);
        assert_eq!(config.tie_break, TieBreak::Majority);
        assert!(!config.templates.signal.enabled);
        assert!(config.templates.vehicle.enabled);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn world_origin_parses_from_array() {
        let config: ViewerConfig =
            toml::from_str("world_origin = [1.0, 0.0, -4.0]").expect("origin should parse");
        assert_eq!(config.world_origin, Vec3::new(1.0, 0.0, -4.0));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<ViewerConfig, _> = toml::from_str("cell_sise = 2.0");
        assert!(result.is_err());
    }

    #[test]
    fn validation_rejects_non_positive_cell_size() {
        let config = ViewerConfig {
            cell_size: 0.0,
            ..ViewerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCellSize { cell_size: 0.0 })
        );
    }

    #[test]
    fn validation_rejects_non_positive_interval() {
        let config = ViewerConfig {
            request_every_seconds: -1.0,
            ..ViewerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRequestInterval { .. })
        ));
    }

    #[test]
    fn default_timeout_is_exact() {
        assert_eq!(
            ViewerConfig::default().request_timeout(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn validation_rejects_non_finite_light_height() {
        for height in [f32::NAN, f32::INFINITY] {
            let config = ViewerConfig {
                light_height: height,
                ..ViewerConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidLightHeight { .. })
            ));
        }
    }

    #[test]
    fn fractional_interval_from_toml_is_exact() {
        let config: ViewerConfig =
            toml::from_str("request_every_seconds = 0.1").expect("interval should parse");
        assert_eq!(config.request_interval(), Duration::from_millis(100));
    }

    #[test]
    fn validation_rejects_negative_convergence() {
        let config = ViewerConfig {
            convergence_rate: -0.5,
            ..ViewerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConvergenceRate { .. })
        ));
    }
}
