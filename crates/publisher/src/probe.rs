//! Relay health probing.
//!
//! A probe opens a short-lived connection, sends a minimal read request,
//! waits for the first response frame, and reports reachability plus the
//! measured round trip. Probes absorb every transport failure; they never
//! return an error to the caller.

use crate::config::PublisherConfig;
use futures::{SinkExt, StreamExt};
use relaypub_core::{ClientMessage, Filter};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

/// Outcome of probing a single relay.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// Relay URL
    pub url: String,
    /// Whether the relay answered within the timeout
    pub reachable: bool,
    /// Round-trip time from request to first response
    pub latency: Duration,
    /// Failure description for unreachable relays
    pub error: Option<String>,
}

/// Probe a single relay. Never fails; unreachable relays come back with
/// `reachable == false` and an error string.
pub async fn probe_relay(url: &str, probe_timeout: Duration) -> ProbeResult {
    debug!("Probing relay: {}", url);
    match probe_inner(url, probe_timeout).await {
        Ok(latency) => {
            debug!("Relay {} answered in {:?}", url, latency);
            ProbeResult {
                url: url.to_string(),
                reachable: true,
                latency,
                error: None,
            }
        }
        Err(error) => {
            warn!("Failed to probe relay {}: {}", url, error);
            ProbeResult {
                url: url.to_string(),
                reachable: false,
                latency: Duration::ZERO,
                error: Some(error),
            }
        }
    }
}

async fn probe_inner(url: &str, probe_timeout: Duration) -> Result<Duration, String> {
    let (mut ws, _) = timeout(probe_timeout, connect_async(url))
        .await
        .map_err(|_| format!("connect timeout after {:?}", probe_timeout))?
        .map_err(|e| e.to_string())?;

    let request = ClientMessage::Req {
        subscription_id: "probe".to_string(),
        filters: vec![Filter::new().kinds(vec![1]).limit(1)],
    };
    let payload = request.to_json().map_err(|e| e.to_string())?;

    let started = Instant::now();
    ws.send(Message::text(payload))
        .await
        .map_err(|e| e.to_string())?;

    // Any frame counts as a sign of life; the subscription is closed right after.
    let latency = timeout(probe_timeout, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(_))) => return Ok(started.elapsed()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.to_string()),
                None => return Err("connection closed before response".to_string()),
            }
        }
    })
    .await
    .map_err(|_| format!("no response within {:?}", probe_timeout))??;

    let _ = ws.close(None).await;
    Ok(latency)
}

/// Probe every relay concurrently, bounded by the configured connection cap.
/// One result per input URL.
pub async fn probe_relays(urls: &[String], config: &PublisherConfig) -> Vec<ProbeResult> {
    debug!("Probing {} relays", urls.len());
    let probe_timeout = config.probe_timeout;

    let results: Vec<ProbeResult> = futures::stream::iter(urls.iter().cloned())
        .map(|url| async move { probe_relay(&url, probe_timeout).await })
        .buffer_unordered(config.max_concurrency.max(1))
        .collect()
        .await;

    let reachable = results.iter().filter(|r| r.reachable).count();
    debug!("{} of {} relays reachable", reachable, results.len());
    results
}
