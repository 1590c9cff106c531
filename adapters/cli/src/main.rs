#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that connects the traffic viewer to a simulation server.

mod args;
mod headless;
mod viewer;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use traffic_viewer_core::ViewerConfig;
use traffic_viewer_rendering::VisualArena;
use traffic_viewer_system_session::{PollingTask, SessionController};
use traffic_viewer_transport::HttpLink;

use crate::args::CliArgs;

/// Entry point for the traffic viewer command-line interface.
fn main() -> Result<()> {
    install_tracing();

    let args = CliArgs::parse();
    let config = args.load_config()?;
    info!(
        server = %config.server_url,
        smooth = config.smooth,
        directional_lights = config.directional_lights,
        interval_seconds = config.request_every_seconds,
        "starting traffic viewer"
    );

    let (controller, task) = start_session(&config)?;
    match args.headless {
        Some(ticks) => headless::run(controller, task, &config, ticks),
        None => viewer::run(controller, task, &config, &args),
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn start_session(
    config: &ViewerConfig,
) -> Result<(SessionController<VisualArena>, PollingTask)> {
    let arena = VisualArena::new(config.templates).context("invalid visual templates")?;
    let link = HttpLink::new(&config.server_url, config.request_timeout())
        .with_context(|| format!("failed to create HTTP client for {}", config.server_url))?;
    let task = PollingTask::spawn(link, config.request_interval())
        .context("failed to start the simulation polling thread")?;

    Ok((SessionController::new(config, arena), task))
}
