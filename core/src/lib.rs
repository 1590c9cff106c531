#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the traffic viewer.
//!
//! This crate defines the wire model emitted by the remote simulation: the
//! static [`MapLayout`] fetched once per session and the per-tick
//! [`Snapshot`] that drives reconciliation. It also describes the
//! [`ConfigRequest`] the viewer posts back and the [`ViewerConfig`] every
//! adapter is built from. Transport adapters decode into these types, the
//! session feeds them to pure systems, and nothing here knows how a snapshot
//! is fetched or drawn.

mod config;

pub use config::{
    ConfigError, TemplateConfig, TemplateShape, TieBreak, ViewerConfig, VisualTemplates,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier the simulation assigns to a vehicle.
///
/// Identifiers are stable while the vehicle exists; a vehicle that leaves the
/// snapshot and later reappears under the same identifier is a new vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(u64);

impl VehicleId {
    /// Creates a new vehicle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier the simulation assigns to a single signal cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(u64);

impl SignalId {
    /// Creates a new signal identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location of a single simulation cell expressed as integer grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column index of the cell. Grows toward world +X.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row index of the cell. Grows toward world +Z.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Origin cell of the 2×2 intersection block that contains a signal cell.
///
/// Blocks are derived on the client and never transmitted. Two cells belong
/// to the same block exactly when their coordinates floor-divide by two to
/// the same pair, which keeps negative coordinates from colliding with
/// positive ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    x: i32,
    y: i32,
}

impl BlockKey {
    /// Returns the block containing the provided cell.
    #[must_use]
    pub const fn containing(cell: GridCoord) -> Self {
        Self {
            x: cell.x.div_euclid(2) * 2,
            y: cell.y.div_euclid(2) * 2,
        }
    }

    /// Lower-left cell of the block.
    #[must_use]
    pub const fn origin(&self) -> GridCoord {
        GridCoord::new(self.x, self.y)
    }
}

/// Direction of travel of a vehicle or lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// Travel toward increasing row indices.
    #[serde(rename = "N")]
    North,
    /// Travel toward increasing column indices.
    #[serde(rename = "E")]
    East,
    /// Travel toward decreasing row indices.
    #[serde(rename = "S")]
    South,
    /// Travel toward decreasing column indices.
    #[serde(rename = "W")]
    West,
}

impl Heading {
    /// Reports whether the heading runs along the east-west axis.
    #[must_use]
    pub const fn is_east_west(self) -> bool {
        matches!(self, Self::East | Self::West)
    }
}

/// Binary phase reported by a signal cell.
///
/// The phase carries no colour at this layer. Renderers apply the
/// convention that [`SignalPhase::Primary`] lets east-west traffic go while
/// [`SignalPhase::Secondary`] lets north-south traffic go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SignalPhase {
    /// Wire value `0`.
    Primary,
    /// Wire value `1`.
    Secondary,
}

impl TryFrom<u8> for SignalPhase {
    type Error = InvalidPhase;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Primary),
            1 => Ok(Self::Secondary),
            other => Err(InvalidPhase(other)),
        }
    }
}

impl From<SignalPhase> for u8 {
    fn from(phase: SignalPhase) -> Self {
        match phase {
            SignalPhase::Primary => 0,
            SignalPhase::Secondary => 1,
        }
    }
}

/// Raised when a signal reports a phase other than `0` or `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("signal phase must be 0 or 1 (received {0})")]
pub struct InvalidPhase(u8);

impl InvalidPhase {
    /// Raw phase value that failed validation.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

/// Signal timing strategy run by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Signals flip phase after a fixed number of ticks.
    #[default]
    Fixed,
    /// Signals adapt their cycle to observed demand.
    Adaptive,
}

impl SignalMode {
    /// Returns the other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Fixed => Self::Adaptive,
            Self::Adaptive => Self::Fixed,
        }
    }

    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Adaptive => "adaptive",
        }
    }
}

/// Per-tick state of a single vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleUpdate {
    /// Identifier assigned to the vehicle by the simulation.
    pub id: VehicleId,
    /// Cell currently occupied by the vehicle.
    #[serde(flatten)]
    pub cell: GridCoord,
    /// Direction the vehicle travels in.
    #[serde(rename = "dir")]
    pub heading: Heading,
    /// Current speed in cells per tick.
    #[serde(default)]
    pub speed: f32,
}

/// Per-tick state of a single signal cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalUpdate {
    /// Identifier assigned to the signal cell by the simulation.
    pub id: SignalId,
    /// Cell that hosts the signal.
    #[serde(flatten)]
    pub cell: GridCoord,
    /// Phase reported by the signal this tick.
    pub phase: SignalPhase,
}

/// Session-level aggregates reported alongside each snapshot.
///
/// Every field is optional because older simulation servers omit the
/// metrics block entirely.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Number of vehicles currently simulated.
    #[serde(default, rename = "count_cars")]
    pub car_count: Option<u32>,
    /// Mean vehicle speed in cells per tick.
    #[serde(default)]
    pub avg_speed: Option<f64>,
    /// Mean accumulated wait measured in ticks.
    #[serde(default, rename = "avg_wait")]
    pub avg_wait_ticks: Option<f64>,
    /// Mean accumulated wait converted to seconds.
    #[serde(default)]
    pub avg_wait_seconds: Option<f64>,
    /// Signal strategy currently active on the server.
    #[serde(default)]
    pub signal_mode: Option<SignalMode>,
    /// Number of ticks between fixed signal phase flips.
    #[serde(default)]
    pub light_cycle: Option<u32>,
}

/// Authoritative state of every dynamic entity at one tick.
///
/// A missing or `null` collection decodes as `None`, which reconciliation
/// treats as an empty tick for that entity class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonic tick counter of the simulation.
    pub tick: u64,
    /// Width of the simulation grid in cells.
    #[serde(default)]
    pub width: Option<u32>,
    /// Height of the simulation grid in cells.
    #[serde(default)]
    pub height: Option<u32>,
    /// Vehicles present during the tick.
    #[serde(default, rename = "cars")]
    pub vehicles: Option<Vec<VehicleUpdate>>,
    /// Signal cells present during the tick.
    #[serde(default, rename = "lights")]
    pub signals: Option<Vec<SignalUpdate>>,
    /// Aggregates reported for the tick.
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Named district a road cell belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Zone {
    /// Dense city centre.
    Downtown,
    /// Residential district.
    Residential,
    /// Industrial district.
    Industrial,
    /// Remaining named district.
    Other,
    /// Cell outside every named district.
    Outside,
}

impl Zone {
    /// Wire name of the zone.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downtown => "CENTRO",
            Self::Residential => "RESIDENCIAL",
            Self::Industrial => "INDUSTRIAL",
            Self::Other => "OTRA",
            Self::Outside => "FUERA",
        }
    }
}

impl From<String> for Zone {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CENTRO" => Self::Downtown,
            "RESIDENCIAL" => Self::Residential,
            "INDUSTRIAL" => Self::Industrial,
            "OTRA" => Self::Other,
            _ => Self::Outside,
        }
    }
}

impl From<Zone> for &'static str {
    fn from(zone: Zone) -> Self {
        zone.as_str()
    }
}

/// Single lane cell of the static road network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadCell {
    /// Location of the road cell.
    #[serde(flatten)]
    pub cell: GridCoord,
    /// Direction of travel permitted on the lane.
    #[serde(rename = "dir")]
    pub heading: Heading,
    /// District the cell belongs to.
    pub zone: Zone,
}

/// Single cell of an intersection block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionCell {
    /// Location of the intersection cell.
    #[serde(flatten)]
    pub cell: GridCoord,
    /// Whether the intersection is controlled by a signal.
    #[serde(default, rename = "hasLight")]
    pub has_light: bool,
}

/// Static road network fetched once per session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Width of the simulation grid in cells.
    pub width: u32,
    /// Height of the simulation grid in cells.
    pub height: u32,
    /// Lane cells composing the road network.
    #[serde(default)]
    pub roads: Vec<RoadCell>,
    /// Cells composing intersection blocks.
    #[serde(default)]
    pub intersections: Vec<IntersectionCell>,
}

impl MapLayout {
    /// Number of static cells the layout describes.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.roads.len() + self.intersections.len()
    }
}

/// Simulation parameters the viewer posts to the server.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigRequest {
    /// Signal timing strategy to activate.
    pub signal_mode: SignalMode,
    /// Ticks between fixed-mode phase flips. Always at least one.
    pub light_cycle: u32,
    /// Multiplier applied to every spawn probability. Never negative.
    pub base_spawn_scale: f32,
}

impl ConfigRequest {
    /// Default fixed-mode cycle length used by the simulation.
    pub const DEFAULT_LIGHT_CYCLE: u32 = 12;

    /// Creates a request, clamping the cycle to at least one tick and the
    /// spawn scale to a finite non-negative value.
    #[must_use]
    pub fn new(signal_mode: SignalMode, light_cycle: u32, base_spawn_scale: f32) -> Self {
        let base_spawn_scale = if base_spawn_scale.is_finite() {
            base_spawn_scale.max(0.0)
        } else {
            0.0
        };

        Self {
            signal_mode,
            light_cycle: light_cycle.max(1),
            base_spawn_scale,
        }
    }
}

impl Default for ConfigRequest {
    fn default() -> Self {
        Self::new(SignalMode::Fixed, Self::DEFAULT_LIGHT_CYCLE, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_key_floors_negative_coordinates() {
        assert_eq!(
            BlockKey::containing(GridCoord::new(-1, -2)).origin(),
            GridCoord::new(-2, -2)
        );
        assert_ne!(
            BlockKey::containing(GridCoord::new(-1, 0)),
            BlockKey::containing(GridCoord::new(1, 0))
        );
    }

    #[test]
    fn signal_phase_rejects_values_outside_binary_range() {
        assert_eq!(SignalPhase::try_from(0), Ok(SignalPhase::Primary));
        assert_eq!(SignalPhase::try_from(1), Ok(SignalPhase::Secondary));
        let error = SignalPhase::try_from(2).expect_err("phase 2 must be rejected");
        assert_eq!(error.value(), 2);
    }

    #[test]
    fn config_request_clamps_degenerate_values() {
        let request = ConfigRequest::new(SignalMode::Adaptive, 0, f32::NAN);
        assert_eq!(request.light_cycle, 1);
        assert_eq!(request.base_spawn_scale, 0.0);

        let request = ConfigRequest::new(SignalMode::Fixed, 9, -3.0);
        assert_eq!(request.base_spawn_scale, 0.0);
    }

    #[test]
    fn signal_mode_toggles_between_strategies() {
        assert_eq!(SignalMode::Fixed.toggled(), SignalMode::Adaptive);
        assert_eq!(SignalMode::Adaptive.toggled(), SignalMode::Fixed);
    }

    #[test]
    fn unknown_zone_names_fall_outside_every_district() {
        assert_eq!(Zone::from("PARQUE".to_owned()), Zone::Outside);
        assert_eq!(Zone::from("CENTRO".to_owned()), Zone::Downtown);
    }
}
