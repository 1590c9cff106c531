use std::{sync::mpsc::RecvTimeoutError, time::Duration};

use anyhow::{bail, Result};
use tracing::{debug, info};
use traffic_viewer_core::ViewerConfig;
use traffic_viewer_rendering::VisualArena;
use traffic_viewer_system_session::{EventOutcome, PollingTask, SessionController};

const EVENT_WAIT: Duration = Duration::from_secs(1);

/// Drives the session without a window until `ticks` snapshots were applied.
pub(crate) fn run(
    mut controller: SessionController<VisualArena>,
    task: PollingTask,
    config: &ViewerConfig,
    ticks: u64,
) -> Result<()> {
    let frame = config.request_interval();
    let mut applied = 0_u64;

    while applied < ticks {
        let event = match task.recv_timeout(EVENT_WAIT) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                debug!("waiting for the simulation server");
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                bail!("polling task stopped after {applied} of {ticks} snapshots")
            }
        };

        match controller.handle_event(event) {
            EventOutcome::MapLoaded { tiles } => info!(tiles, "map loaded"),
            EventOutcome::SnapshotApplied { tick } => {
                applied += 1;
                controller.advance_frame(frame);
                info!(
                    tick,
                    vehicles = controller.vehicles().len(),
                    signals = controller.signals().len(),
                    "{}",
                    controller.analytics().panel()
                );
            }
            EventOutcome::Stale => {}
        }
    }

    task.cancel();
    Ok(())
}
