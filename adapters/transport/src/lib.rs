#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! HTTP implementation of the simulation link.
//!
//! The server exposes four endpoints: `GET /map` for the static road
//! network, `POST /` to advance one tick and read the resulting state,
//! `POST /config` to push parameters and `POST /reset` to restart. Bodies
//! are read as text and decoded separately so that an unreachable server
//! and an undecodable answer surface as different [`LinkError`] variants.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::debug;
use traffic_viewer_core::{ConfigRequest, MapLayout, Snapshot};
use traffic_viewer_system_session::{LinkError, SimulationLink};

const JSON: &str = "application/json";
const EMPTY_OBJECT: &str = "{}";

/// Blocking HTTP client bound to one simulation server.
#[derive(Clone, Debug)]
pub struct HttpLink {
    client: Client,
    endpoints: Endpoints,
}

impl HttpLink {
    /// Creates a link to the server rooted at `base_url`. Every request
    /// fails with [`LinkError::Transport`] once `timeout` elapses.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| LinkError::Transport(format!("http client init failed: {error}")))?;

        Ok(Self {
            client,
            endpoints: Endpoints::new(base_url),
        })
    }

    /// Endpoint URLs the link talks to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn exchange(&self, request: RequestBuilder, url: &str) -> Result<String, LinkError> {
        let response = request
            .send()
            .map_err(|error| LinkError::Transport(format!("{url}: request error: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkError::Transport(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .map_err(|error| LinkError::Transport(format!("{url}: unreadable body: {error}")))
    }

    fn post_json(&self, url: &str, body: String) -> Result<String, LinkError> {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON)
            .body(body);
        self.exchange(request, url)
    }
}

impl SimulationLink for HttpLink {
    fn fetch_map(&mut self) -> Result<MapLayout, LinkError> {
        let url = &self.endpoints.map;
        let body = self.exchange(self.client.get(url), url)?;
        let layout: MapLayout = decode(&body)?;
        debug!(
            width = layout.width,
            height = layout.height,
            cells = layout.cell_count(),
            "fetched map"
        );
        Ok(layout)
    }

    fn fetch_snapshot(&mut self) -> Result<Snapshot, LinkError> {
        let url = &self.endpoints.step;
        let body = self.post_json(url, EMPTY_OBJECT.to_owned())?;
        decode(&body)
    }

    fn apply_config(&mut self, request: &ConfigRequest) -> Result<(), LinkError> {
        let body = encode_config(request)?;
        let _ = self.post_json(&self.endpoints.config, body)?;
        debug!(
            mode = request.signal_mode.as_str(),
            light_cycle = request.light_cycle,
            spawn_scale = request.base_spawn_scale,
            "pushed configuration"
        );
        Ok(())
    }

    fn reset(&mut self) -> Result<(), LinkError> {
        let _ = self.post_json(&self.endpoints.reset, EMPTY_OBJECT.to_owned())?;
        Ok(())
    }
}

/// Fully qualified URLs of the server's endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    /// `GET` target returning the road network.
    pub map: String,
    /// `POST` target advancing the simulation by one tick.
    pub step: String,
    /// `POST` target accepting new parameters.
    pub config: String,
    /// `POST` target restarting the simulation.
    pub reset: String,
}

impl Endpoints {
    /// Derives every endpoint from the server's base URL, tolerating any
    /// number of trailing slashes.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim().trim_end_matches('/');
        Self {
            map: format!("{base}/map"),
            step: format!("{base}/"),
            config: format!("{base}/config"),
            reset: format!("{base}/reset"),
        }
    }
}

/// Decodes a JSON body, mapping failures onto [`LinkError::MalformedPayload`].
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, LinkError> {
    serde_json::from_str(body).map_err(|error| LinkError::MalformedPayload(error.to_string()))
}

fn encode_config(request: &ConfigRequest) -> Result<String, LinkError> {
    serde_json::to_string(request).map_err(|error| LinkError::MalformedPayload(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_viewer_core::SignalMode;

    #[test]
    fn endpoints_join_without_double_slashes() {
        let endpoints = Endpoints::new("http://localhost:8585//");
        assert_eq!(endpoints.map, "http://localhost:8585/map");
        assert_eq!(endpoints.step, "http://localhost:8585/");
        assert_eq!(endpoints.config, "http://localhost:8585/config");
        assert_eq!(endpoints.reset, "http://localhost:8585/reset");
    }

    #[test]
    fn config_body_uses_wire_names() {
        let body = encode_config(&ConfigRequest::new(SignalMode::Fixed, 12, 1.0))
            .expect("config encodes");
        let value: serde_json::Value = serde_json::from_str(&body).expect("body is json");
        assert_eq!(value["signal_mode"], "fixed");
        assert_eq!(value["light_cycle"], 12);
    }
}
