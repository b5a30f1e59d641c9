//! The publish orchestrator.
//!
//! A `Publisher` owns the configuration, the relay registry, and the signing
//! key, and runs one publish operation end to end: snapshot the configured
//! relay list, sign the event, hand it to the selected strategy, and record
//! what happened. Configuration and signing problems fail fast, before any
//! network activity; everything transport-level is absorbed into the
//! per-relay results of the returned outcome.

use crate::config::{parse_relay_urls, ConfigStore, PublisherConfig, StrategyKind, RELAY_URLS_KEY};
use crate::error::{PublishError, Result};
use crate::outcome::PublishOutcome;
use crate::probe;
use crate::registry::{RelayEndpoint, RelayRegistry};
use crate::selector::RankedRelays;
use crate::strategy;
use relaypub_core::{finalize_event, kind_for_change, parse_secret_key, Event, EventTemplate};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use url::Url;

/// Content to publish, before signing.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Event kind
    pub kind: u16,
    /// Content payload
    pub content: String,
    /// Ordered tag pairs
    pub tags: Vec<Vec<String>>,
    /// Timestamp override; defaults to the current time at signing
    pub created_at: Option<u64>,
}

impl EventDraft {
    /// A plain text note.
    pub fn note(content: impl Into<String>) -> Self {
        Self {
            kind: relaypub_core::KIND_SHORT_TEXT_NOTE,
            content: content.into(),
            tags: Vec::new(),
            created_at: None,
        }
    }
}

/// Multi-relay publish orchestrator.
pub struct Publisher {
    config: PublisherConfig,
    store: Arc<dyn ConfigStore>,
    registry: Mutex<RelayRegistry>,
}

impl Publisher {
    /// Create a publisher over a configuration store.
    pub fn new(store: Arc<dyn ConfigStore>, config: PublisherConfig) -> Self {
        Self {
            config,
            store,
            registry: Mutex::new(RelayRegistry::new()),
        }
    }

    /// Sign a draft and publish it with the configured strategy.
    pub async fn publish(&self, draft: EventDraft) -> Result<PublishOutcome> {
        let urls = self.relay_snapshot()?;
        let event = self.sign(draft)?;

        info!(
            "Publishing event {} (kind {}) to up to {} relays using {:?} strategy",
            event.id,
            event.kind,
            urls.len(),
            self.config.strategy
        );

        let outcome = match self.config.strategy {
            StrategyKind::Simple => strategy::publish_simple(&event, &urls, &self.config).await,
            StrategyKind::Broadcast => {
                strategy::publish_broadcast(&event, &urls, &self.config).await
            }
            StrategyKind::Adaptive => {
                let probes = probe::probe_relays(&urls, &self.config).await;
                {
                    let mut registry = self.registry.lock().unwrap();
                    registry.sync_urls(&urls);
                    for p in &probes {
                        if p.reachable {
                            registry.record_success(&p.url, p.latency);
                        } else {
                            registry.record_failure(&p.url);
                        }
                    }
                }
                let ranked = RankedRelays::from_probes(probes);
                strategy::run_adaptive_loop(&event, &ranked, &self.config, self.store.as_ref())
                    .await
            }
        };

        info!(
            "Publish of event {} finished: accepted={} ({}/{} relays, rate {:.2}, {} batches)",
            outcome.event_id,
            outcome.accepted,
            outcome.success_count,
            outcome.total_relay_count,
            outcome.success_rate,
            outcome.attempts()
        );
        Ok(outcome)
    }

    /// Publish a source module's change as a JSON envelope event.
    ///
    /// The payload is wrapped as `{"module", "type", "content"}`, tagged with
    /// the module and change kind, and mapped onto the event kind reserved
    /// for that change.
    pub async fn publish_for_source(
        &self,
        module: &str,
        change: &str,
        payload: &str,
        extra_tags: Vec<Vec<String>>,
    ) -> Result<PublishOutcome> {
        let content = serde_json::json!({
            "module": module,
            "type": change,
            "content": payload,
        })
        .to_string();

        let mut tags = extra_tags;
        tags.push(vec!["e".to_string(), module.to_string()]);
        tags.push(vec!["t".to_string(), change.to_string()]);

        info!("Publishing event for module {} ({})", module, change);
        self.publish(EventDraft {
            kind: kind_for_change(change),
            content,
            tags,
            created_at: None,
        })
        .await
    }

    /// A copy of the registry's endpoint bookkeeping.
    pub fn endpoints(&self) -> Vec<RelayEndpoint> {
        self.registry.lock().unwrap().endpoints().to_vec()
    }

    /// Read the configured relay list into an immutable per-call snapshot.
    /// Mid-loop configuration changes are deliberately not observed.
    fn relay_snapshot(&self) -> Result<Vec<String>> {
        let raw = self.store.get(RELAY_URLS_KEY).unwrap_or_default();
        let urls: Vec<String> = parse_relay_urls(&raw)
            .into_iter()
            .filter(|candidate| match Url::parse(candidate) {
                Ok(url) if url.scheme() == "ws" || url.scheme() == "wss" => true,
                Ok(url) => {
                    warn!(
                        "Skipping relay {} with unsupported scheme {}",
                        candidate,
                        url.scheme()
                    );
                    false
                }
                Err(e) => {
                    warn!("Skipping unparseable relay URL {}: {}", candidate, e);
                    false
                }
            })
            .collect();

        if urls.is_empty() {
            return Err(PublishError::Config(
                "no relay URLs configured".to_string(),
            ));
        }
        Ok(urls)
    }

    fn sign(&self, draft: EventDraft) -> Result<Event> {
        if self.config.secret_key.trim().is_empty() {
            return Err(PublishError::Config(
                "no signing key configured".to_string(),
            ));
        }
        let secret_key = parse_secret_key(&self.config.secret_key)?;

        let created_at = draft.created_at.unwrap_or_else(now_unix);
        let template = EventTemplate {
            created_at,
            kind: draft.kind,
            tags: draft.tags,
            content: draft.content,
        };
        Ok(finalize_event(&template, &secret_key)?)
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
