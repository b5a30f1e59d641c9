//! Per-relay attempt results and their aggregation into a publish outcome.

use serde::Serialize;
use std::time::Duration;

/// Result of one publish attempt against one relay.
#[derive(Debug, Clone, Serialize)]
pub struct PublishAttemptResult {
    /// Relay URL
    pub relay_url: String,
    /// Whether the relay acknowledged the event as accepted
    pub success: bool,
    /// Acknowledgement message from the relay, when one arrived
    pub response: Option<String>,
    /// Transport or protocol error, when the attempt failed to complete
    pub error: Option<String>,
    /// Time from connection attempt to classification
    pub latency: Duration,
}

/// Aggregate outcome of one publish operation.
///
/// `success_rate` is always `success_count / total_relay_count` while
/// `total_relay_count > 0`. Whether the operation counts as accepted is
/// strategy-defined and set by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    /// Id of the published event
    pub event_id: String,
    /// Strategy-defined overall verdict
    pub accepted: bool,
    /// Relays that acknowledged acceptance, across all batches
    pub success_count: usize,
    /// Relays attempted, across all batches
    pub total_relay_count: usize,
    /// Cumulative acceptance ratio in [0, 1]
    pub success_rate: f64,
    /// The relay URL set of each dispatched batch, in order
    pub attempted_batches: Vec<Vec<String>>,
    /// Every per-relay result, in dispatch order
    pub results: Vec<PublishAttemptResult>,
}

impl PublishOutcome {
    /// Empty outcome for an event about to be published.
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            accepted: false,
            success_count: 0,
            total_relay_count: 0,
            success_rate: 0.0,
            attempted_batches: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Fold one batch of results into the aggregate.
    pub fn record_batch(&mut self, batch_urls: Vec<String>, results: Vec<PublishAttemptResult>) {
        self.success_count += results.iter().filter(|r| r.success).count();
        self.total_relay_count += results.len();
        self.attempted_batches.push(batch_urls);
        self.results.extend(results);
        self.success_rate = if self.total_relay_count > 0 {
            self.success_count as f64 / self.total_relay_count as f64
        } else {
            0.0
        };
    }

    /// Number of dispatch rounds recorded so far.
    pub fn attempts(&self) -> usize {
        self.attempted_batches.len()
    }
}
