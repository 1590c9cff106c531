use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use traffic_viewer_core::ViewerConfig;

/// Command-line arguments accepted by the traffic viewer.
#[derive(Debug, Parser)]
#[command(name = "traffic-viewer", about = "Renders a remote traffic simulation in 3D.")]
pub(crate) struct CliArgs {
    /// Base URL of the simulation server. Overrides `server_url` from the config file.
    #[arg(long, value_name = "URL")]
    pub(crate) server: Option<String>,
    /// TOML file providing viewer settings.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// Snap visuals to each snapshot instead of converging smoothly.
    #[arg(long)]
    pub(crate) no_smooth: bool,
    /// Draw one indicator per signal cell instead of paired block indicators.
    #[arg(long)]
    pub(crate) legacy_lights: bool,
    /// Seconds between snapshot requests.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) interval: Option<f64>,
    /// Enables or disables vertical sync.
    #[arg(long, value_enum, value_name = "on|off")]
    pub(crate) vsync: Option<VsyncMode>,
    /// Logs frame timing metrics once per second.
    #[arg(long)]
    pub(crate) show_fps: bool,
    /// Runs without a window and exits after the given number of snapshots.
    #[arg(long, value_name = "TICKS")]
    pub(crate) headless: Option<u64>,
}

/// Vertical sync preference requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum VsyncMode {
    /// Synchronise presentation with the display refresh rate.
    On,
    /// Render as fast as possible.
    Off,
}

impl VsyncMode {
    pub(crate) fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

impl CliArgs {
    /// Reads the configuration file, applies command-line overrides and validates the result.
    pub(crate) fn load_config(&self) -> Result<ViewerConfig> {
        let config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                parse_config(&text)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => ViewerConfig::default(),
        };

        let config = self.apply_overrides(config);
        config.validate().context("invalid viewer configuration")?;
        Ok(config)
    }

    fn apply_overrides(&self, mut config: ViewerConfig) -> ViewerConfig {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if self.no_smooth {
            config.smooth = false;
        }
        if self.legacy_lights {
            config.directional_lights = false;
        }
        if let Some(interval) = self.interval {
            config.request_every_seconds = interval;
        }
        config
    }
}

fn parse_config(text: &str) -> Result<ViewerConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = CliArgs::try_parse_from([
            "traffic-viewer",
            "--server",
            "http://sim:9000",
            "--no-smooth",
            "--legacy-lights",
            "--interval",
            "0.5",
        ])
        .expect("arguments parse");

        let config = args.load_config().expect("configuration is valid");

        assert_eq!(config.server_url, "http://sim:9000");
        assert!(!config.smooth);
        assert!(!config.directional_lights);
        assert_eq!(config.request_every_seconds, 0.5);
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        let args = CliArgs::try_parse_from(["traffic-viewer", "--interval", "0"])
            .expect("arguments parse");
        assert!(args.load_config().is_err());
    }

    #[test]
    fn headless_and_vsync_parse() {
        let args = CliArgs::try_parse_from(["traffic-viewer", "--headless", "25", "--vsync", "off"])
            .expect("arguments parse");
        assert_eq!(args.headless, Some(25));
        assert_eq!(args.vsync, Some(VsyncMode::Off));
        assert!(!VsyncMode::Off.enabled());
    }

    #[test]
    fn config_file_overrides_are_layered() {
        let config = parse_config("server_url = \"http://file:1\"\nsmooth = true")
            .expect("configuration parses");
        let args = CliArgs::try_parse_from(["traffic-viewer", "--no-smooth"]).expect("parse");

        let config = args.apply_overrides(config);

        assert_eq!(config.server_url, "http://file:1");
        assert!(!config.smooth);
    }
}
