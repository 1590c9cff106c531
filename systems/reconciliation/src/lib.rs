#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Applies each snapshot to the visual registries.
//!
//! Every pass makes the registry's key set equal to the set of keys derived
//! from the incoming collection: unknown keys spawn a visual, known keys get
//! a fresh target and keys that vanished are disposed. Collections are never
//! merged across ticks.

use std::collections::BTreeSet;
use std::fmt;

use traffic_viewer_core::ViewerConfig;
use traffic_viewer_registry::{
    EntityRegistry, MissingVisualResource, Placement, Upsert, VisualClass, VisualFactory,
    VisualTarget,
};
use traffic_viewer_system_grouping::TargetResolver;

/// Counts describing the changes applied by one reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Visuals spawned for keys seen for the first time.
    pub created: usize,
    /// Existing visuals that received a new target.
    pub updated: usize,
    /// Visuals disposed because their key vanished from the snapshot.
    pub removed: usize,
    /// Targets dropped because their key was already seen earlier in the
    /// same pass.
    pub ignored: usize,
}

impl ReconcileReport {
    /// Reports whether the pass changed the set of live visuals.
    #[must_use]
    pub fn changed_membership(&self) -> bool {
        self.created > 0 || self.removed > 0
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, updated {}, removed {}, ignored {}",
            self.created, self.updated, self.removed, self.ignored
        )
    }
}

/// Reconciles snapshot collections against entity registries.
#[derive(Debug)]
pub struct ReconciliationEngine {
    placement: Placement,
}

impl ReconciliationEngine {
    /// Creates an engine. When `smooth` is false every update snaps the
    /// rendered position onto the new target.
    #[must_use]
    pub fn new(smooth: bool) -> Self {
        let placement = if smooth {
            Placement::Interpolate
        } else {
            Placement::Snap
        };
        Self { placement }
    }

    /// Creates an engine honouring the smoothing flag of `config`.
    #[must_use]
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.smooth)
    }

    /// Placement applied to updated entities.
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Applies one collection of `class` items to `registry`.
    ///
    /// A `None` collection counts as empty and removes every entity of the
    /// class. When `factory` has no template for `class` the registry is left
    /// untouched and the missing resource is reported.
    pub fn reconcile<R, F>(
        &self,
        registry: &mut EntityRegistry<R::Key, F::Handle>,
        items: Option<&[R::Item]>,
        resolver: &R,
        factory: &mut F,
        class: VisualClass,
    ) -> Result<ReconcileReport, MissingVisualResource>
    where
        R: TargetResolver,
        F: VisualFactory,
    {
        if !factory.supports(class) {
            return Err(MissingVisualResource { class });
        }

        let mut targets: Vec<(R::Key, VisualTarget)> = Vec::new();
        resolver.resolve_all(items.unwrap_or_default(), &mut targets);

        let mut report = ReconcileReport::default();
        let mut seen = BTreeSet::new();
        for (key, target) in targets {
            if !seen.insert(key) {
                report.ignored += 1;
                continue;
            }

            match registry.upsert(key, target, self.placement, |target| {
                factory.spawn(class, target)
            }) {
                Upsert::Created => report.created += 1,
                Upsert::Updated => report.updated += 1,
            }
        }

        report.removed = registry.prune(&seen, |handle| factory.dispose(handle));
        Ok(report)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_smoothing_snaps() {
        assert_eq!(ReconciliationEngine::new(false).placement(), Placement::Snap);
        assert_eq!(
            ReconciliationEngine::default().placement(),
            Placement::Interpolate
        );
    }

    #[test]
    fn report_display_lists_every_count() {
        let report = ReconcileReport {
            created: 1,
            updated: 2,
            removed: 3,
            ignored: 4,
        };
        assert_eq!(
            report.to_string(),
            "created 1, updated 2, removed 3, ignored 4"
        );
        assert!(report.changed_membership());
    }
}
