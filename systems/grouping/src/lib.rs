#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resolvers that turn raw snapshot items into keyed visual targets.
//!
//! Vehicles map one-to-one onto their identifiers. Signals either keep one
//! indicator per signal cell or collapse every cell of a 2×2 intersection
//! block into a pair of directional indicators, depending on configuration.
//! Resolvers never deduplicate: reconciliation keeps the first target it
//! sees for each key and ignores the rest.

mod signals;

pub use signals::{
    Axis, BlockGrouping, GroupedSignal, IdentityGrouping, SignalGrouping, SignalKey,
};

use traffic_viewer_core::{VehicleId, VehicleUpdate};
use traffic_viewer_registry::{Tint, VisualTarget};
use traffic_viewer_system_projection::{heading_yaw, GridProjector};

/// Speed below which a vehicle is drawn as stopped.
const STOPPED_BELOW: f32 = 0.2;
/// Speed below which a vehicle is drawn as slow.
const SLOW_BELOW: f32 = 0.6;

/// Strategy mapping snapshot items of one class onto keyed visual targets.
pub trait TargetResolver {
    /// Snapshot item consumed by the resolver.
    type Item;
    /// Stable key identifying the visual entity derived from an item.
    type Key: Ord + Copy;

    /// Appends the targets derived from a single item to `out`.
    fn resolve(&self, item: &Self::Item, out: &mut Vec<(Self::Key, VisualTarget)>);

    /// Appends the targets derived from every item to `out`, preserving
    /// snapshot order.
    fn resolve_all(&self, items: &[Self::Item], out: &mut Vec<(Self::Key, VisualTarget)>) {
        for item in items {
            self.resolve(item, out);
        }
    }
}

/// Resolver placing each vehicle in its lane and colouring it by speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleTargets {
    projector: GridProjector,
}

impl VehicleTargets {
    /// Creates a vehicle resolver backed by the provided projector.
    #[must_use]
    pub const fn new(projector: GridProjector) -> Self {
        Self { projector }
    }
}

impl TargetResolver for VehicleTargets {
    type Item = VehicleUpdate;
    type Key = VehicleId;

    fn resolve(&self, item: &VehicleUpdate, out: &mut Vec<(VehicleId, VisualTarget)>) {
        let position = self.projector.vehicle_target(item.cell, item.heading);
        out.push((
            item.id,
            VisualTarget::new(position, heading_yaw(item.heading), speed_tint(item.speed)),
        ));
    }
}

/// Colour band of a vehicle travelling at `speed` cells per tick.
///
/// Non-finite speeds fall in the stopped band.
#[must_use]
pub fn speed_tint(speed: f32) -> Tint {
    if !speed.is_finite() || speed < STOPPED_BELOW {
        Tint::Stopped
    } else if speed < SLOW_BELOW {
        Tint::Slow
    } else {
        Tint::Cruising
    }
}
