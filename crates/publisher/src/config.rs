//! Publisher configuration and the key-value configuration store.
//!
//! Relay URLs live under the `relay_urls` key as a comma-separated string
//! and are read into an immutable snapshot at the start of every publish
//! call; the adaptive strategy writes the ranked reachable set back under
//! `successful_relays` after a satisfied run.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// Configuration key holding the comma-separated relay URL list.
pub const RELAY_URLS_KEY: &str = "relay_urls";

/// Configuration key holding the last known-good relay list.
pub const SUCCESSFUL_RELAYS_KEY: &str = "successful_relays";

/// Key-value configuration storage.
///
/// The host application owns durable storage; the publisher only needs
/// string get/set for its two keys.
pub trait ConfigStore: Send + Sync {
    /// Read a configuration value.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a configuration value.
    fn set(&self, key: &str, value: &str);
}

/// In-memory configuration store.
#[derive(Default)]
pub struct MemoryConfigStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with relay URLs.
    pub fn with_relay_urls(urls: &[&str]) -> Self {
        let store = Self::new();
        store.set(RELAY_URLS_KEY, &urls.join(","));
        store
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

/// Parse a comma-separated relay URL list, dropping empty entries.
pub fn parse_relay_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(|url| url.to_string())
        .collect()
}

/// Which publish policy runs for a publish call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// One-shot batch to the first few configured relays, no probe, no retry.
    Simple,
    /// Probe, rank by latency, publish to the best batch, escalate while the
    /// cumulative success rate stays below threshold.
    #[default]
    Adaptive,
    /// Concurrent fan-out to every configured relay with per-relay retries.
    Broadcast,
}

/// Publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Signing key, as 64-char hex or bech32 `nsec`.
    pub secret_key: String,
    /// Publish policy to run.
    pub strategy: StrategyKind,
    /// Timeout for opening a probe connection and for its response.
    pub probe_timeout: Duration,
    /// Timeout for opening a publish connection.
    pub connect_timeout: Duration,
    /// Timeout waiting for a relay's OK acknowledgement.
    pub ack_timeout: Duration,
    /// Relays per adaptive batch.
    pub batch_size: usize,
    /// Relays used by the simple strategy.
    pub simple_relay_count: usize,
    /// Simultaneous connections per batch.
    pub max_concurrency: usize,
    /// Dispatch rounds before the adaptive loop gives up.
    pub max_attempts: u32,
    /// Cumulative success rate that satisfies the adaptive loop.
    pub success_threshold: f64,
    /// Bound on the persisted known-good relay list.
    pub known_good_limit: usize,
    /// Per-relay attempts in the broadcast strategy.
    pub broadcast_retries: u32,
    /// Pause between broadcast attempts.
    pub broadcast_backoff: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            strategy: StrategyKind::default(),
            probe_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            ack_timeout: Duration::from_secs(5),
            batch_size: 9,
            simple_relay_count: 5,
            max_concurrency: 10,
            max_attempts: 12,
            success_threshold: 0.5,
            known_good_limit: 108,
            broadcast_retries: 3,
            broadcast_backoff: Duration::from_secs(1),
        }
    }
}

impl PublisherConfig {
    /// Default configuration with the given signing key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }
}
