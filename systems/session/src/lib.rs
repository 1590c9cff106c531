#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestration of the fetch, reconcile and interpolate loop.
//!
//! The session is split across two threads. [`PollingTask`] owns the
//! [`SimulationLink`] and performs one request per interval on a worker
//! thread, posting [`LinkEvent`]s back over a channel. [`SessionController`]
//! lives on the render thread, owns every visual registry and applies those
//! events between frames. Registries never cross the thread boundary.

mod controller;
mod link;
mod polling;

pub use controller::{EventOutcome, SessionController};
pub use link::{LinkError, SimulationLink};
pub use polling::{LinkEvent, PollingTask, SessionEpoch, TaskStopped};
