//! Relay endpoint bookkeeping.
//!
//! Endpoints are created the first time a URL appears in configuration and
//! are never removed afterwards, only deactivated. Probe cycles update
//! latency and failure counters: any successful probe resets the failure
//! counter, any failed probe increments it and deactivates the endpoint
//! until it probes healthy again.

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// A known relay endpoint and its probe history.
#[derive(Debug, Clone, Serialize)]
pub struct RelayEndpoint {
    /// Relay URL
    pub url: String,
    /// Whether the last probe reached the relay
    pub is_active: bool,
    /// Round-trip latency from the last successful probe
    pub last_probe_latency: Option<Duration>,
    /// Probe failures since the last success
    pub consecutive_failures: u32,
}

impl RelayEndpoint {
    fn new(url: String) -> Self {
        Self {
            url,
            is_active: true,
            last_probe_latency: None,
            consecutive_failures: 0,
        }
    }
}

/// Registry of every relay endpoint seen in configuration.
#[derive(Debug, Default)]
pub struct RelayRegistry {
    endpoints: Vec<RelayEndpoint>,
}

impl RelayRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add any URLs not yet registered, preserving configuration order.
    /// Existing endpoints keep their history; nothing is ever removed.
    pub fn sync_urls(&mut self, urls: &[String]) {
        for url in urls {
            if !self.endpoints.iter().any(|e| &e.url == url) {
                debug!("Registering relay endpoint: {}", url);
                self.endpoints.push(RelayEndpoint::new(url.clone()));
            }
        }
    }

    /// Record a successful probe.
    pub fn record_success(&mut self, url: &str, latency: Duration) {
        if let Some(endpoint) = self.endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.is_active = true;
            endpoint.last_probe_latency = Some(latency);
            endpoint.consecutive_failures = 0;
        }
    }

    /// Record a failed probe.
    pub fn record_failure(&mut self, url: &str) {
        if let Some(endpoint) = self.endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.is_active = false;
            endpoint.consecutive_failures += 1;
        }
    }

    /// Look up an endpoint by URL.
    pub fn endpoint(&self, url: &str) -> Option<&RelayEndpoint> {
        self.endpoints.iter().find(|e| e.url == url)
    }

    /// All registered endpoints, in registration order.
    pub fn endpoints(&self) -> &[RelayEndpoint] {
        &self.endpoints
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether no endpoints are registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
