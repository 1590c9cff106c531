use std::collections::BTreeMap;

use glam::Vec3;
use traffic_viewer_core::{BlockKey, SignalId, SignalPhase, SignalUpdate, TieBreak, ViewerConfig};
use traffic_viewer_registry::{Tint, VisualTarget};
use traffic_viewer_system_projection::GridProjector;

use crate::TargetResolver;

/// Traffic axis a directional indicator controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Indicator governing east-west traffic.
    EastWest,
    /// Indicator governing north-south traffic.
    NorthSouth,
}

/// Key of a signal indicator tracked by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKey {
    /// Indicator mirroring one signal cell.
    Cell(SignalId),
    /// Directional indicator shared by every cell of an intersection block.
    Indicator {
        /// Block the indicator belongs to.
        block: BlockKey,
        /// Traffic axis the indicator controls.
        axis: Axis,
    },
}

/// Indicator positions and colours derived from one signal cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupedSignal {
    /// Block containing the signal cell.
    pub block: BlockKey,
    /// Indicator governing east-west traffic.
    pub east_west: VisualTarget,
    /// Indicator governing north-south traffic.
    pub north_south: VisualTarget,
}

/// Legacy strategy rendering one indicator above every signal cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdentityGrouping {
    projector: GridProjector,
    height: f32,
}

impl IdentityGrouping {
    /// Creates the strategy with indicators floating `height` above the road.
    #[must_use]
    pub const fn new(projector: GridProjector, height: f32) -> Self {
        Self { projector, height }
    }
}

impl TargetResolver for IdentityGrouping {
    type Item = SignalUpdate;
    type Key = SignalKey;

    fn resolve(&self, item: &SignalUpdate, out: &mut Vec<(SignalKey, VisualTarget)>) {
        let position = self.projector.to_world(item.cell) + Vec3::new(0.0, self.height, 0.0);
        let tint = match item.phase {
            SignalPhase::Primary => Tint::Go,
            SignalPhase::Secondary => Tint::Stop,
        };
        out.push((SignalKey::Cell(item.id), VisualTarget::new(position, 0.0, tint)));
    }
}

/// Directional strategy pairing an east-west and a north-south indicator per
/// intersection block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockGrouping {
    projector: GridProjector,
    separation: f32,
    height: f32,
    tie_break: TieBreak,
}

impl BlockGrouping {
    /// Creates the strategy. Indicators sit `separation` away from the block
    /// centre along their own axis and `height` above the road.
    #[must_use]
    pub const fn new(
        projector: GridProjector,
        separation: f32,
        height: f32,
        tie_break: TieBreak,
    ) -> Self {
        Self {
            projector,
            separation,
            height,
            tie_break,
        }
    }

    /// Computes both indicators for the block containing `signal`, coloured
    /// by the signal's own phase.
    #[must_use]
    pub fn group(&self, signal: &SignalUpdate) -> GroupedSignal {
        self.group_with_phase(signal, signal.phase)
    }

    fn group_with_phase(&self, signal: &SignalUpdate, phase: SignalPhase) -> GroupedSignal {
        let block = BlockKey::containing(signal.cell);
        let centre = self.projector.block_center(block);
        let (east_west, north_south) = match phase {
            SignalPhase::Primary => (Tint::Go, Tint::Stop),
            SignalPhase::Secondary => (Tint::Stop, Tint::Go),
        };

        GroupedSignal {
            block,
            east_west: VisualTarget::new(
                centre + Vec3::new(0.0, self.height, self.separation),
                0.0,
                east_west,
            ),
            north_south: VisualTarget::new(
                centre + Vec3::new(self.separation, self.height, 0.0),
                0.0,
                north_south,
            ),
        }
    }

    fn push_grouped(
        &self,
        signal: &SignalUpdate,
        phase: SignalPhase,
        out: &mut Vec<(SignalKey, VisualTarget)>,
    ) {
        let grouped = self.group_with_phase(signal, phase);
        out.push((
            SignalKey::Indicator {
                block: grouped.block,
                axis: Axis::EastWest,
            },
            grouped.east_west,
        ));
        out.push((
            SignalKey::Indicator {
                block: grouped.block,
                axis: Axis::NorthSouth,
            },
            grouped.north_south,
        ));
    }
}

impl TargetResolver for BlockGrouping {
    type Item = SignalUpdate;
    type Key = SignalKey;

    fn resolve(&self, item: &SignalUpdate, out: &mut Vec<(SignalKey, VisualTarget)>) {
        self.push_grouped(item, item.phase, out);
    }

    fn resolve_all(&self, items: &[SignalUpdate], out: &mut Vec<(SignalKey, VisualTarget)>) {
        match self.tie_break {
            TieBreak::FirstSeen => {
                for item in items {
                    self.resolve(item, out);
                }
            }
            TieBreak::Majority => {
                let decided = majority_phases(items);
                for item in items {
                    let block = BlockKey::containing(item.cell);
                    let phase = decided.get(&block).copied().unwrap_or(item.phase);
                    self.push_grouped(item, phase, out);
                }
            }
        }
    }
}

/// Most frequent phase per block; ties keep the first phase seen.
fn majority_phases(items: &[SignalUpdate]) -> BTreeMap<BlockKey, SignalPhase> {
    let mut tallies: BTreeMap<BlockKey, PhaseTally> = BTreeMap::new();
    for item in items {
        tallies
            .entry(BlockKey::containing(item.cell))
            .or_insert_with(|| PhaseTally::new(item.phase))
            .record(item.phase);
    }

    tallies
        .into_iter()
        .map(|(block, tally)| (block, tally.decide()))
        .collect()
}

#[derive(Clone, Copy, Debug)]
struct PhaseTally {
    first: SignalPhase,
    primary: usize,
    secondary: usize,
}

impl PhaseTally {
    fn new(first: SignalPhase) -> Self {
        Self {
            first,
            primary: 0,
            secondary: 0,
        }
    }

    fn record(&mut self, phase: SignalPhase) {
        match phase {
            SignalPhase::Primary => self.primary += 1,
            SignalPhase::Secondary => self.secondary += 1,
        }
    }

    fn decide(self) -> SignalPhase {
        match self.primary.cmp(&self.secondary) {
            std::cmp::Ordering::Greater => SignalPhase::Primary,
            std::cmp::Ordering::Less => SignalPhase::Secondary,
            std::cmp::Ordering::Equal => self.first,
        }
    }
}

/// Signal strategy selected by configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SignalGrouping {
    /// One indicator per signal cell.
    Identity(IdentityGrouping),
    /// Paired directional indicators per intersection block.
    Block(BlockGrouping),
}

impl SignalGrouping {
    /// Picks the strategy requested by `config`.
    #[must_use]
    pub fn from_config(config: &ViewerConfig, projector: GridProjector) -> Self {
        if config.directional_lights {
            Self::Block(BlockGrouping::new(
                projector,
                config.light_separation,
                config.light_height,
                config.tie_break,
            ))
        } else {
            Self::Identity(IdentityGrouping::new(projector, config.light_height))
        }
    }
}

impl TargetResolver for SignalGrouping {
    type Item = SignalUpdate;
    type Key = SignalKey;

    fn resolve(&self, item: &SignalUpdate, out: &mut Vec<(SignalKey, VisualTarget)>) {
        match self {
            Self::Identity(strategy) => strategy.resolve(item, out),
            Self::Block(strategy) => strategy.resolve(item, out),
        }
    }

    fn resolve_all(&self, items: &[SignalUpdate], out: &mut Vec<(SignalKey, VisualTarget)>) {
        match self {
            Self::Identity(strategy) => strategy.resolve_all(items, out),
            Self::Block(strategy) => strategy.resolve_all(items, out),
        }
    }
}
