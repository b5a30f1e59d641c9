//! Multi-relay publish orchestrator.
//!
//! This crate publishes signed events to sets of relay servers:
//! - Health probing with round-trip latency measurement
//! - Latency-ranked relay selection
//! - Concurrent publish dispatch with bounded fan-out
//! - An adaptive retry loop that escalates through the relay ranking
//! - Interchangeable publish strategies selected by configuration
//! - Post-publish confirmation against the relays
//!
//! # Example
//!
//! ```rust,no_run
//! use relaypub::{EventDraft, MemoryConfigStore, Publisher, PublisherConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryConfigStore::with_relay_urls(&[
//!         "wss://relay.damus.io",
//!         "wss://nos.lol",
//!     ]));
//!     let config = PublisherConfig::new("<64-char hex or nsec key>");
//!     let publisher = Publisher::new(store, config);
//!
//!     let outcome = publisher
//!         .publish(EventDraft::note("Hello from relaypub"))
//!         .await
//!         .unwrap();
//!
//!     println!(
//!         "accepted={} ({}/{} relays)",
//!         outcome.accepted, outcome.success_count, outcome.total_relay_count
//!     );
//! }
//! ```

pub mod config;
pub mod confirm;
pub mod dispatch;
pub mod error;
pub mod outcome;
pub mod probe;
pub mod registry;
pub mod selector;
mod publisher;
mod strategy;

pub use config::{
    parse_relay_urls, ConfigStore, MemoryConfigStore, PublisherConfig, StrategyKind,
    RELAY_URLS_KEY, SUCCESSFUL_RELAYS_KEY,
};
pub use confirm::{confirm_event, confirm_on_relays};
pub use error::{PublishError, Result};
pub use outcome::{PublishAttemptResult, PublishOutcome};
pub use probe::{probe_relay, probe_relays, ProbeResult};
pub use publisher::{EventDraft, Publisher};
pub use registry::{RelayEndpoint, RelayRegistry};
pub use selector::RankedRelays;
