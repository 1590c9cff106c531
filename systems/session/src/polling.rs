use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use traffic_viewer_core::{ConfigRequest, MapLayout, Snapshot};

use crate::SimulationLink;

/// Generation counter distinguishing data fetched before and after a reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    /// Epoch of a freshly started session.
    pub const INITIAL: Self = Self(0);

    /// Epoch following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Numeric representation of the epoch.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Data delivered by the polling worker, tagged with the epoch it was
/// fetched under.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    /// The static road network arrived.
    MapLoaded {
        /// Epoch the map was fetched under.
        epoch: SessionEpoch,
        /// Decoded road network.
        layout: MapLayout,
    },
    /// A tick snapshot arrived.
    Snapshot {
        /// Epoch the snapshot was fetched under.
        epoch: SessionEpoch,
        /// Decoded snapshot.
        snapshot: Snapshot,
    },
}

impl LinkEvent {
    /// Epoch the event was fetched under.
    #[must_use]
    pub fn epoch(&self) -> SessionEpoch {
        match self {
            Self::MapLoaded { epoch, .. } | Self::Snapshot { epoch, .. } => *epoch,
        }
    }
}

#[derive(Debug)]
enum LinkCommand {
    ApplyConfig(ConfigRequest),
    Reset { epoch: SessionEpoch },
    Shutdown,
}

/// Raised when a command is sent after the polling worker exited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("polling task has stopped")]
pub struct TaskStopped;

/// Background worker driving the network cadence of a session.
///
/// The worker fetches the map first, retrying each interval until it
/// succeeds, then requests one snapshot per interval. Waits happen on the
/// command channel so configuration, reset and shutdown requests are served
/// without waiting for the interval to elapse. Failed requests are logged
/// and skipped; the cadence never backs off.
#[derive(Debug)]
pub struct PollingTask {
    commands: Sender<LinkCommand>,
    events: Receiver<LinkEvent>,
    worker: Option<JoinHandle<()>>,
}

impl PollingTask {
    /// Starts the worker thread.
    pub fn spawn<L>(link: L, interval: Duration) -> io::Result<Self>
    where
        L: SimulationLink,
    {
        let (commands, command_rx) = mpsc::channel();
        let (event_tx, events) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("simulation-poll".to_owned())
            .spawn(move || run(link, interval, &command_rx, &event_tx))?;

        Ok(Self {
            commands,
            events,
            worker: Some(worker),
        })
    }

    /// Queues a configuration update. Delivery is fire-and-forget.
    pub fn apply_config(&self, request: ConfigRequest) -> Result<(), TaskStopped> {
        self.send(LinkCommand::ApplyConfig(request))
    }

    /// Restarts the remote simulation and reloads the map under `epoch`.
    pub fn reset(&self, epoch: SessionEpoch) -> Result<(), TaskStopped> {
        self.send(LinkCommand::Reset { epoch })
    }

    /// Returns every event received so far without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<LinkEvent> {
        self.events.try_iter().collect()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<LinkEvent, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    /// Stops the worker and waits for it to exit. No event is produced after
    /// this returns.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn send(&self, command: LinkCommand) -> Result<(), TaskStopped> {
        self.commands.send(command).map_err(|_| TaskStopped)
    }

    fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.commands.send(LinkCommand::Shutdown);
        if worker.join().is_err() {
            warn!("polling worker panicked");
        }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<L>(
    mut link: L,
    interval: Duration,
    commands: &Receiver<LinkCommand>,
    events: &Sender<LinkEvent>,
) where
    L: SimulationLink,
{
    let mut epoch = SessionEpoch::INITIAL;
    let mut map_loaded = false;
    info!(interval_ms = interval.as_millis() as u64, "polling started");

    loop {
        let event = if map_loaded {
            match link.fetch_snapshot() {
                Ok(snapshot) => Some(LinkEvent::Snapshot { epoch, snapshot }),
                Err(error) => {
                    warn!(%error, "snapshot request failed; skipping tick");
                    None
                }
            }
        } else {
            match link.fetch_map() {
                Ok(layout) => {
                    map_loaded = true;
                    Some(LinkEvent::MapLoaded { epoch, layout })
                }
                Err(error) => {
                    warn!(%error, "map request failed; retrying");
                    None
                }
            }
        };

        if let Some(event) = event {
            if events.send(event).is_err() {
                debug!("session dropped its event receiver");
                return;
            }
        }

        let deadline = Instant::now() + interval;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match commands.recv_timeout(remaining) {
                Ok(LinkCommand::ApplyConfig(request)) => {
                    if let Err(error) = link.apply_config(&request) {
                        warn!(%error, "configuration request failed");
                    } else {
                        info!(
                            mode = request.signal_mode.as_str(),
                            cycle = request.light_cycle,
                            spawn_scale = request.base_spawn_scale,
                            "configuration applied"
                        );
                    }
                }
                Ok(LinkCommand::Reset { epoch: next }) => {
                    if let Err(error) = link.reset() {
                        warn!(%error, "reset request failed");
                    }
                    epoch = next;
                    map_loaded = false;
                    info!(epoch = epoch.get(), "simulation reset; reloading map");
                    break;
                }
                Ok(LinkCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    info!("polling stopped");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
    }
}
