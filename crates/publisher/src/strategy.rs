//! Publish strategies.
//!
//! Three interchangeable policies over the same dispatch primitive, selected
//! by `StrategyKind` in the publisher configuration:
//!
//! - simple: one batch to the first few configured relays, no probe
//! - adaptive: probe, rank, publish to the best batch, escalate through
//!   trailing windows of the ranking while the cumulative success rate stays
//!   below threshold, bounded by a maximum attempt count
//! - broadcast: every configured relay concurrently, with per-relay retries

use crate::config::{ConfigStore, PublisherConfig, SUCCESSFUL_RELAYS_KEY};
use crate::dispatch;
use crate::outcome::{PublishAttemptResult, PublishOutcome};
use crate::selector::RankedRelays;
use futures::future::join_all;
use relaypub_core::Event;
use tracing::{info, warn};

/// One-shot publish to the first `simple_relay_count` configured relays.
/// Accepted as soon as any relay acknowledges.
pub(crate) async fn publish_simple(
    event: &Event,
    urls: &[String],
    config: &PublisherConfig,
) -> PublishOutcome {
    let targets: Vec<String> = urls.iter().take(config.simple_relay_count).cloned().collect();

    let mut outcome = PublishOutcome::new(event.id.clone());
    let results = dispatch::publish_batch(event, &targets, config).await;
    outcome.record_batch(targets, results);
    outcome.accepted = outcome.success_count >= 1;
    outcome
}

/// Concurrent fan-out to every configured relay, retrying each relay up to
/// `broadcast_retries` times with a pause between attempts. Accepted as soon
/// as any relay acknowledges; no success-rate gating.
pub(crate) async fn publish_broadcast(
    event: &Event,
    urls: &[String],
    config: &PublisherConfig,
) -> PublishOutcome {
    let results = join_all(
        urls.iter()
            .map(|url| publish_with_retries(url, event, config)),
    )
    .await;

    let mut outcome = PublishOutcome::new(event.id.clone());
    outcome.record_batch(urls.to_vec(), results);
    outcome.accepted = outcome.success_count >= 1;
    outcome
}

async fn publish_with_retries(
    url: &str,
    event: &Event,
    config: &PublisherConfig,
) -> PublishAttemptResult {
    let retries = config.broadcast_retries.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result =
            dispatch::publish_to_relay(url, event, config.connect_timeout, config.ack_timeout)
                .await;
        if result.success || attempt >= retries {
            return result;
        }
        warn!("Relay {} attempt {} of {} failed", url, attempt, retries);
        tokio::time::sleep(config.broadcast_backoff).await;
    }
}

/// The adaptive retry loop, starting from an already-probed ranking.
///
/// Dispatches to `batch_for_attempt(1)`, then evaluates the cumulative
/// success rate: at or above threshold the loop is satisfied and the ranked
/// reachable set (bounded) is persisted as the known-good relay list; below
/// threshold it escalates to the next trailing window until `max_attempts`
/// rounds are exhausted. Events already delivered to some relays during
/// failed rounds stay delivered; their results remain visible either way.
pub(crate) async fn run_adaptive_loop(
    event: &Event,
    ranked: &RankedRelays,
    config: &PublisherConfig,
    store: &dyn ConfigStore,
) -> PublishOutcome {
    let mut outcome = PublishOutcome::new(event.id.clone());

    if ranked.is_empty() {
        warn!("No reachable relays after probing; nothing to dispatch");
        return outcome;
    }

    let mut attempt: u32 = 1;
    loop {
        let batch = ranked.batch_for_attempt(attempt, config.batch_size);
        let results = dispatch::publish_batch(event, &batch, config).await;
        outcome.record_batch(batch, results);

        if outcome.success_rate >= config.success_threshold {
            outcome.accepted = true;
            break;
        }
        if attempt >= config.max_attempts {
            warn!(
                "Failed to reach {:.0}% success after {} attempts (rate {:.2})",
                config.success_threshold * 100.0,
                attempt,
                outcome.success_rate
            );
            break;
        }
        warn!(
            "Low success rate ({:.2}). Attempt {}/{}. Trying next set of relays.",
            outcome.success_rate, attempt, config.max_attempts
        );
        attempt += 1;
    }

    if outcome.accepted {
        let known_good: Vec<String> = ranked
            .urls()
            .into_iter()
            .take(config.known_good_limit)
            .collect();
        store.set(SUCCESSFUL_RELAYS_KEY, &known_good.join(","));
        info!(
            "Updated known-good relay list with {} relays",
            known_good.len()
        );
    }

    outcome
}
