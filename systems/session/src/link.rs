use thiserror::Error;
use traffic_viewer_core::{ConfigRequest, MapLayout, Snapshot};

/// Request/response channel to the remote simulation.
///
/// Implementations block until the exchange completes or fails. The
/// session performs at most one call at a time.
pub trait SimulationLink: Send + 'static {
    /// Fetches the static road network.
    fn fetch_map(&mut self) -> Result<MapLayout, LinkError>;

    /// Advances the simulation by one tick and returns the resulting state.
    fn fetch_snapshot(&mut self) -> Result<Snapshot, LinkError>;

    /// Pushes new simulation parameters.
    fn apply_config(&mut self, request: &ConfigRequest) -> Result<(), LinkError>;

    /// Restarts the simulation from its initial state.
    fn reset(&mut self) -> Result<(), LinkError>;
}

/// Failures reported by a [`SimulationLink`]. None of them are fatal: the
/// session logs them and skips the affected tick.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The request could not be delivered or timed out.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered with a body that does not decode.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}
