use std::time::Duration;

use tracing::{debug, info, warn};
use traffic_viewer_core::{GridCoord, MapLayout, Snapshot, VehicleId, ViewerConfig};
use traffic_viewer_registry::{
    EntityRegistry, Placement, Tint, VisualClass, VisualFactory, VisualTarget,
};
use traffic_viewer_system_analytics::{Analytics, BaselineCapture};
use traffic_viewer_system_grouping::{SignalGrouping, SignalKey, VehicleTargets};
use traffic_viewer_system_interpolation::InterpolationScheduler;
use traffic_viewer_system_projection::GridProjector;
use traffic_viewer_system_reconciliation::ReconciliationEngine;

use crate::{LinkEvent, PollingTask, SessionEpoch, TaskStopped};

/// Effect of a [`LinkEvent`] handed to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// The static road network was rebuilt with the provided tile count.
    MapLoaded {
        /// Number of tiles spawned.
        tiles: usize,
    },
    /// A snapshot was reconciled into the registries.
    SnapshotApplied {
        /// Tick of the applied snapshot.
        tick: u64,
    },
    /// The event was fetched before the latest reset and was dropped.
    Stale,
}

/// Render-thread half of a session: owns every visual registry.
#[derive(Debug)]
pub struct SessionController<F: VisualFactory> {
    factory: F,
    projector: GridProjector,
    engine: ReconciliationEngine,
    scheduler: InterpolationScheduler,
    vehicle_targets: VehicleTargets,
    signal_grouping: SignalGrouping,
    vehicles: EntityRegistry<VehicleId, F::Handle>,
    signals: EntityRegistry<SignalKey, F::Handle>,
    tiles: EntityRegistry<GridCoord, F::Handle>,
    map: Option<MapLayout>,
    analytics: Analytics,
    epoch: SessionEpoch,
}

impl<F: VisualFactory> SessionController<F> {
    /// Creates a controller that instantiates visuals through `factory`.
    pub fn new(config: &ViewerConfig, factory: F) -> Self {
        let projector = GridProjector::new(config.world_origin, config.cell_size);
        Self {
            factory,
            projector,
            engine: ReconciliationEngine::from_config(config),
            scheduler: InterpolationScheduler::from_config(config),
            vehicle_targets: VehicleTargets::new(projector),
            signal_grouping: SignalGrouping::from_config(config, projector),
            vehicles: EntityRegistry::new(),
            signals: EntityRegistry::new(),
            tiles: EntityRegistry::new(),
            map: None,
            analytics: Analytics::new(),
            epoch: SessionEpoch::INITIAL,
        }
    }

    /// Applies an event received from the polling task.
    ///
    /// Events fetched under an older epoch than the controller's are
    /// discarded so nothing requested before a reset reaches the registries.
    pub fn handle_event(&mut self, event: LinkEvent) -> EventOutcome {
        if event.epoch() != self.epoch {
            debug!(
                event_epoch = event.epoch().get(),
                epoch = self.epoch.get(),
                "discarding event from previous session"
            );
            return EventOutcome::Stale;
        }

        match event {
            LinkEvent::MapLoaded { layout, .. } => EventOutcome::MapLoaded {
                tiles: self.load_map(layout),
            },
            LinkEvent::Snapshot { snapshot, .. } => {
                self.apply_snapshot(&snapshot);
                EventOutcome::SnapshotApplied {
                    tick: snapshot.tick,
                }
            }
        }
    }

    /// Applies every event the polling task delivered since the last call.
    pub fn pump(&mut self, task: &PollingTask) -> Vec<EventOutcome> {
        task.drain()
            .into_iter()
            .map(|event| self.handle_event(event))
            .collect()
    }

    /// Replaces the static tiles with those of `layout`. Returns the number
    /// of tiles spawned.
    pub fn load_map(&mut self, layout: MapLayout) -> usize {
        let _ = self.tiles.clear(|handle| self.factory.dispose(handle));

        if !self.factory.supports(VisualClass::Tile) {
            warn!(class = %VisualClass::Tile, "no visual template; road network hidden");
            self.map = Some(layout);
            return 0;
        }

        let roads = layout
            .roads
            .iter()
            .map(|road| (road.cell, Tint::Road(road.zone)));
        let intersections = layout.intersections.iter().map(|cell| {
            (
                cell.cell,
                Tint::Intersection {
                    signalised: cell.has_light,
                },
            )
        });

        let mut spawned = 0;
        for (cell, tint) in roads.chain(intersections) {
            if self.tiles.contains(&cell) {
                continue;
            }
            let target = VisualTarget::new(self.projector.to_world(cell), 0.0, tint);
            let _ = self.tiles.upsert(cell, target, Placement::Snap, |target| {
                self.factory.spawn(VisualClass::Tile, target)
            });
            spawned += 1;
        }

        info!(
            width = layout.width,
            height = layout.height,
            tiles = spawned,
            "road network loaded"
        );
        self.map = Some(layout);
        spawned
    }

    /// Reconciles both entity classes of `snapshot` and records its metrics.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        match self.engine.reconcile(
            &mut self.vehicles,
            snapshot.vehicles.as_deref(),
            &self.vehicle_targets,
            &mut self.factory,
            VisualClass::Vehicle,
        ) {
            Ok(report) => debug!(tick = snapshot.tick, %report, "vehicles reconciled"),
            Err(error) => warn!(tick = snapshot.tick, %error, "vehicle update skipped"),
        }

        match self.engine.reconcile(
            &mut self.signals,
            snapshot.signals.as_deref(),
            &self.signal_grouping,
            &mut self.factory,
            VisualClass::Signal,
        ) {
            Ok(report) => debug!(tick = snapshot.tick, %report, "signals reconciled"),
            Err(error) => warn!(tick = snapshot.tick, %error, "signal update skipped"),
        }

        self.analytics.observe(snapshot.tick, &snapshot.metrics);
    }

    /// Advances every rendered position by one frame lasting `dt`.
    pub fn advance_frame(&mut self, dt: Duration) {
        let _ = self.scheduler.step(&mut self.vehicles, dt);
        let _ = self.scheduler.step(&mut self.signals, dt);
    }

    /// Disposes every visual, forgets the map, metrics and baseline, and
    /// starts a new epoch. Returns the new epoch.
    pub fn reset(&mut self) -> SessionEpoch {
        let disposed = self.vehicles.clear(|handle| self.factory.dispose(handle))
            + self.signals.clear(|handle| self.factory.dispose(handle))
            + self.tiles.clear(|handle| self.factory.dispose(handle));
        self.map = None;
        self.analytics.clear();
        self.epoch = self.epoch.next();
        info!(epoch = self.epoch.get(), disposed, "session reset");
        self.epoch
    }

    /// Resets the controller and asks the polling task to restart the
    /// simulation under the new epoch.
    pub fn request_reset(&mut self, task: &PollingTask) -> Result<SessionEpoch, TaskStopped> {
        let epoch = self.reset();
        task.reset(epoch)?;
        Ok(epoch)
    }

    /// Stores the latest average wait as the comparison baseline.
    pub fn capture_baseline(&mut self) -> BaselineCapture {
        let capture = self.analytics.capture_baseline();
        match capture {
            BaselineCapture::Captured(seconds) => info!(seconds, "baseline captured"),
            BaselineCapture::Unavailable => warn!("baseline unavailable; no wait reported yet"),
        }
        capture
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    /// Vehicle visuals keyed by vehicle identifier.
    #[must_use]
    pub fn vehicles(&self) -> &EntityRegistry<VehicleId, F::Handle> {
        &self.vehicles
    }

    /// Signal indicator visuals.
    #[must_use]
    pub fn signals(&self) -> &EntityRegistry<SignalKey, F::Handle> {
        &self.signals
    }

    /// Static tile visuals keyed by cell.
    #[must_use]
    pub fn tiles(&self) -> &EntityRegistry<GridCoord, F::Handle> {
        &self.tiles
    }

    /// Road network of the current epoch, once loaded.
    #[must_use]
    pub fn map(&self) -> Option<&MapLayout> {
        self.map.as_ref()
    }

    /// Metrics and baseline bookkeeping.
    #[must_use]
    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    /// Factory used to instantiate visuals.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }
}
