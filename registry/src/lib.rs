#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative visual state owned by the traffic viewer.
//!
//! The registry maps a stable entity key onto the long-lived visual object
//! created for it, together with the position currently shown on screen and
//! the target most recently reported by the simulation. Reconciliation is the
//! only writer of targets; interpolation is the only writer of rendered
//! positions between snapshots. Visual objects are created and destroyed
//! through the [`VisualFactory`] seam so the registry never depends on a
//! rendering backend.

#[cfg(any(test, feature = "test_factory"))]
pub mod testing;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::Vec3;
use thiserror::Error;
use traffic_viewer_core::Zone;

/// Entity classes the viewer instantiates visuals for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualClass {
    /// Moving vehicles.
    Vehicle,
    /// Signal indicators, both single and directional.
    Signal,
    /// Static road and intersection tiles.
    Tile,
}

impl VisualClass {
    /// Human-readable name of the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Signal => "signal",
            Self::Tile => "tile",
        }
    }
}

impl fmt::Display for VisualClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour state assigned to a visual by reconciliation or map loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tint {
    /// Signal indicator allowing traffic through.
    Go,
    /// Signal indicator holding traffic back.
    Stop,
    /// Vehicle that is standing still or nearly so.
    Stopped,
    /// Vehicle accelerating or braking.
    Slow,
    /// Vehicle travelling close to its top speed.
    Cruising,
    /// Road tile painted with its district colour.
    Road(Zone),
    /// Intersection tile, highlighted when a signal controls it.
    Intersection {
        /// Whether the intersection hosts a signal.
        signalised: bool,
    },
}

/// Placement, orientation and colour a visual should display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualTarget {
    /// World-space position the visual converges toward.
    pub position: Vec3,
    /// Rotation about the world +Y axis in radians; zero faces +Z.
    pub yaw: f32,
    /// Colour state of the visual.
    pub tint: Tint,
}

impl VisualTarget {
    /// Creates a new visual target.
    #[must_use]
    pub const fn new(position: Vec3, yaw: f32, tint: Tint) -> Self {
        Self {
            position,
            yaw,
            tint,
        }
    }
}

/// Asset instantiation primitive used by reconciliation and map loading.
pub trait VisualFactory {
    /// Opaque handle identifying one instantiated visual.
    type Handle: Copy + Eq + fmt::Debug;

    /// Reports whether a template is configured for the provided class.
    fn supports(&self, class: VisualClass) -> bool;

    /// Instantiates a visual of the provided class at the target.
    ///
    /// Callers check [`VisualFactory::supports`] first; factories may treat a
    /// spawn request for an unsupported class as a logic error.
    fn spawn(&mut self, class: VisualClass, target: &VisualTarget) -> Self::Handle;

    /// Destroys a previously spawned visual.
    fn dispose(&mut self, handle: Self::Handle);
}

/// Raised when a class has no template to instantiate visuals from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("no visual template configured for {class} entities")]
pub struct MissingVisualResource {
    /// Class whose template is missing.
    pub class: VisualClass,
}

/// How the rendered position reacts to a new target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Leave the rendered position for interpolation to advance.
    Interpolate,
    /// Move the rendered position onto the target immediately.
    Snap,
}

/// Outcome of inserting or refreshing a registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// A new visual was spawned for a previously unknown key.
    Created,
    /// An existing entry received a fresh target.
    Updated,
}

/// Long-lived visual object tracked by the registry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualEntity<H> {
    handle: H,
    current: Vec3,
    target: VisualTarget,
}

impl<H: Copy> VisualEntity<H> {
    /// Handle of the visual object backing the entity.
    #[must_use]
    pub fn handle(&self) -> H {
        self.handle
    }

    /// Position currently displayed on screen.
    #[must_use]
    pub fn current_position(&self) -> Vec3 {
        self.current
    }

    /// Most recent target reported by the simulation.
    #[must_use]
    pub fn target(&self) -> &VisualTarget {
        &self.target
    }

    /// Distance left between the displayed position and the target.
    #[must_use]
    pub fn remaining_distance(&self) -> f32 {
        self.current.distance(self.target.position)
    }

    /// Moves the displayed position toward the target by the provided
    /// fraction of the remaining distance, clamped to `0.0..=1.0`.
    pub fn approach(&mut self, fraction: f32) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };

        if fraction >= 1.0 {
            self.current = self.target.position;
        } else {
            self.current += (self.target.position - self.current) * fraction;
        }
    }

    /// Moves the displayed position onto the target.
    pub fn snap_to_target(&mut self) {
        self.current = self.target.position;
    }
}

/// Registry of visual entities of one class keyed by a stable identifier.
///
/// Entries iterate in key order so that drawing and logging stay
/// deterministic across runs.
#[derive(Clone, Debug)]
pub struct EntityRegistry<K, H> {
    entries: BTreeMap<K, VisualEntity<H>>,
}

impl<K, H> Default for EntityRegistry<K, H> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy, H: Copy> EntityRegistry<K, H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the registry tracks no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retrieves the entity tracked under the provided key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&VisualEntity<H>> {
        self.entries.get(key)
    }

    /// Reports whether an entity is tracked under the provided key.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterator over the tracked keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Iterator over the tracked entities in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &VisualEntity<H>)> {
        self.entries.iter()
    }

    /// Mutable iterator over the tracked entities in key order.
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut VisualEntity<H>> {
        self.entries.values_mut()
    }

    /// Inserts a new entity or refreshes the target of an existing one.
    ///
    /// New entities spawn through `spawn` and start rendered exactly at their
    /// target so they never animate in from elsewhere. Existing entities keep
    /// their handle and rendered position unless `placement` requests a snap.
    pub fn upsert<S>(
        &mut self,
        key: K,
        target: VisualTarget,
        placement: Placement,
        spawn: S,
    ) -> Upsert
    where
        S: FnOnce(&VisualTarget) -> H,
    {
        if let Some(entity) = self.entries.get_mut(&key) {
            entity.target = target;
            if placement == Placement::Snap {
                entity.snap_to_target();
            }
            return Upsert::Updated;
        }

        let handle = spawn(&target);
        let _ = self.entries.insert(
            key,
            VisualEntity {
                handle,
                current: target.position,
                target,
            },
        );
        Upsert::Created
    }

    /// Removes every entity whose key is absent from `seen`, passing each
    /// removed handle to `dispose`. Returns the number of removed entities.
    pub fn prune<D>(&mut self, seen: &BTreeSet<K>, mut dispose: D) -> usize
    where
        D: FnMut(H),
    {
        let before = self.entries.len();
        self.entries.retain(|key, entity| {
            if seen.contains(key) {
                true
            } else {
                dispose(entity.handle);
                false
            }
        });
        before - self.entries.len()
    }

    /// Removes every entity, passing each handle to `dispose`. Returns the
    /// number of removed entities.
    pub fn clear<D>(&mut self, mut dispose: D) -> usize
    where
        D: FnMut(H),
    {
        let removed = std::mem::take(&mut self.entries);
        let count = removed.len();
        for entity in removed.into_values() {
            dispose(entity.handle);
        }
        count
    }
}
