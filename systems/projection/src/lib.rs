#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure projection from simulation grid coordinates into world space.
//!
//! Column indices grow along world +X, row indices along world +Z and the
//! road surface lies in the plane `y = origin.y`.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;
use traffic_viewer_core::{BlockKey, GridCoord, Heading};

/// Share of a cell a vehicle is shifted sideways to sit in its lane.
const LANE_OFFSET_RATIO: f32 = 0.25;

/// Stateless mapping between grid cells and world positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridProjector {
    origin: Vec3,
    cell_size: f32,
}

impl GridProjector {
    /// Creates a projector anchored at `origin` with square cells of
    /// `cell_size` world units.
    #[must_use]
    pub const fn new(origin: Vec3, cell_size: f32) -> Self {
        Self { origin, cell_size }
    }

    /// World position of grid cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Projects the provided cell onto the road surface.
    #[must_use]
    pub fn to_world(&self, cell: GridCoord) -> Vec3 {
        self.origin + Vec3::new(cell.x() as f32, 0.0, cell.y() as f32) * self.cell_size
    }

    /// Shifts `position` sideways into the lane used by traffic travelling
    /// along `heading`.
    #[must_use]
    pub fn lane_offset(&self, position: Vec3, heading: Heading) -> Vec3 {
        let shift = self.cell_size * LANE_OFFSET_RATIO;
        let offset = match heading {
            Heading::East => Vec3::new(0.0, 0.0, shift),
            Heading::West => Vec3::new(0.0, 0.0, -shift),
            Heading::North => Vec3::new(-shift, 0.0, 0.0),
            Heading::South => Vec3::new(shift, 0.0, 0.0),
        };
        position + offset
    }

    /// Target position of a vehicle occupying `cell` while travelling along
    /// `heading`.
    #[must_use]
    pub fn vehicle_target(&self, cell: GridCoord, heading: Heading) -> Vec3 {
        self.lane_offset(self.to_world(cell), heading)
    }

    /// Centre of the 2×2 intersection block identified by `block`.
    #[must_use]
    pub fn block_center(&self, block: BlockKey) -> Vec3 {
        let half = self.cell_size * 0.5;
        self.to_world(block.origin()) + Vec3::new(half, 0.0, half)
    }
}

impl Default for GridProjector {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 1.0)
    }
}

/// Rotation about world +Y, in radians, of a model facing along `heading`.
///
/// A yaw of zero faces north, which is world +Z.
#[must_use]
pub fn heading_yaw(heading: Heading) -> f32 {
    match heading {
        Heading::North => 0.0,
        Heading::East => FRAC_PI_2,
        Heading::South => PI,
        Heading::West => 3.0 * FRAC_PI_2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_respects_origin_and_cell_size() {
        let projector = GridProjector::new(Vec3::new(10.0, 1.0, -5.0), 2.0);
        assert_eq!(
            projector.to_world(GridCoord::new(3, 4)),
            Vec3::new(16.0, 1.0, 3.0)
        );
    }

    #[test]
    fn negative_cells_project_behind_the_origin() {
        let projector = GridProjector::default();
        assert_eq!(
            projector.to_world(GridCoord::new(-2, -1)),
            Vec3::new(-2.0, 0.0, -1.0)
        );
    }

    #[test]
    fn yaw_increases_clockwise_from_north() {
        assert_eq!(heading_yaw(Heading::North), 0.0);
        assert!(heading_yaw(Heading::East) < heading_yaw(Heading::South));
        assert!(heading_yaw(Heading::South) < heading_yaw(Heading::West));
    }
}
