//! Adaptive retry loop tests: satisfaction, escalation, exhaustion, and the
//! known-good relay list written after a satisfied run.

use crate::mock_relay::{publisher_for, start_mock_relay, test_config, MockRelay, RelayBehavior};
use relaypub::{
    ConfigStore, EventDraft, MemoryConfigStore, Publisher, StrategyKind, SUCCESSFUL_RELAYS_KEY,
};
use std::sync::Arc;

async fn relay_set(accepting: usize, rejecting: usize) -> Vec<MockRelay> {
    let mut relays = Vec::new();
    for _ in 0..accepting {
        relays.push(start_mock_relay(RelayBehavior::Accept).await);
    }
    for _ in 0..rejecting {
        relays.push(start_mock_relay(RelayBehavior::Reject).await);
    }
    relays
}

#[tokio::test]
async fn test_satisfied_without_escalation_at_sixty_percent() {
    let relays = relay_set(6, 4).await;
    let refs: Vec<&_> = relays.iter().collect();

    let mut config = test_config(StrategyKind::Adaptive);
    config.batch_size = 10;
    let publisher = publisher_for(&refs, config);

    let outcome = publisher.publish(EventDraft::note("sixty")).await.unwrap();

    assert!(outcome.accepted);
    assert_eq!(outcome.attempts(), 1);
    assert_eq!(outcome.success_count, 6);
    assert_eq!(outcome.total_relay_count, 10);
    assert!((outcome.success_rate - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn test_escalates_below_threshold_instead_of_giving_up() {
    let relays = relay_set(4, 6).await;
    let refs: Vec<&_> = relays.iter().collect();

    let mut config = test_config(StrategyKind::Adaptive);
    config.batch_size = 10;
    config.max_attempts = 2;
    let publisher = publisher_for(&refs, config);

    let outcome = publisher.publish(EventDraft::note("forty")).await.unwrap();

    // 4 of 10 is under threshold: the first round must escalate, not exhaust
    assert_eq!(outcome.attempts(), 2);
    assert!(!outcome.accepted);
    assert!(outcome.success_rate < 0.5);
}

#[tokio::test]
async fn test_exhausts_after_max_attempts() {
    let relays = relay_set(0, 3).await;
    let refs: Vec<&_> = relays.iter().collect();

    let config = test_config(StrategyKind::Adaptive);
    let max_attempts = config.max_attempts;
    assert_eq!(max_attempts, 12);
    let publisher = publisher_for(&refs, config);

    let outcome = publisher.publish(EventDraft::note("doomed")).await.unwrap();

    assert!(!outcome.accepted);
    assert_eq!(outcome.attempts(), max_attempts as usize);
    assert_eq!(outcome.success_rate, 0.0);
    // Every batch accounted for every relay it targeted
    assert_eq!(outcome.results.len(), outcome.total_relay_count);
}

#[tokio::test]
async fn test_satisfied_run_persists_known_good_relays() {
    let relays = relay_set(3, 0).await;
    let refs: Vec<&_> = relays.iter().collect();

    let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
    let store = Arc::new(MemoryConfigStore::with_relay_urls(&urls));
    let publisher = Publisher::new(
        Arc::clone(&store) as Arc<dyn ConfigStore>,
        test_config(StrategyKind::Adaptive),
    );

    let outcome = publisher.publish(EventDraft::note("healthy")).await.unwrap();
    assert!(outcome.accepted);

    let known_good = store.get(SUCCESSFUL_RELAYS_KEY).unwrap();
    for relay in &relays {
        assert!(known_good.contains(&relay.url));
    }
}

#[tokio::test]
async fn test_exhausted_run_does_not_persist_known_good_relays() {
    let relays = relay_set(0, 2).await;
    let refs: Vec<&_> = relays.iter().collect();

    let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
    let store = Arc::new(MemoryConfigStore::with_relay_urls(&urls));
    let mut config = test_config(StrategyKind::Adaptive);
    config.max_attempts = 2;
    let publisher = Publisher::new(Arc::clone(&store) as Arc<dyn ConfigStore>, config);

    let outcome = publisher.publish(EventDraft::note("unhealthy")).await.unwrap();
    assert!(!outcome.accepted);
    assert!(store.get(SUCCESSFUL_RELAYS_KEY).is_none());
}

#[tokio::test]
async fn test_unreachable_relays_are_tracked_in_the_registry() {
    let healthy = start_mock_relay(RelayBehavior::Accept).await;

    // A port that refuses connections
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("ws://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let store = Arc::new(MemoryConfigStore::with_relay_urls(&[
        healthy.url.as_str(),
        dead_url.as_str(),
    ]));
    let publisher = Publisher::new(store, test_config(StrategyKind::Adaptive));

    let outcome = publisher.publish(EventDraft::note("survivors")).await.unwrap();

    // Only the reachable relay was dispatched to, and it was enough
    assert!(outcome.accepted);
    assert_eq!(outcome.total_relay_count, 1);

    let endpoints = publisher.endpoints();
    let healthy_endpoint = endpoints.iter().find(|e| e.url == healthy.url).unwrap();
    assert!(healthy_endpoint.is_active);
    assert_eq!(healthy_endpoint.consecutive_failures, 0);
    assert!(healthy_endpoint.last_probe_latency.is_some());

    let dead_endpoint = endpoints.iter().find(|e| e.url == dead_url).unwrap();
    assert!(!dead_endpoint.is_active);
    assert_eq!(dead_endpoint.consecutive_failures, 1);
}

#[tokio::test]
async fn test_failure_counter_accumulates_across_publishes() {
    let healthy = start_mock_relay(RelayBehavior::Accept).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("ws://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let store = Arc::new(MemoryConfigStore::with_relay_urls(&[
        healthy.url.as_str(),
        dead_url.as_str(),
    ]));
    let publisher = Publisher::new(store, test_config(StrategyKind::Adaptive));

    publisher.publish(EventDraft::note("one")).await.unwrap();
    publisher.publish(EventDraft::note("two")).await.unwrap();

    let endpoints = publisher.endpoints();
    let dead_endpoint = endpoints.iter().find(|e| e.url == dead_url).unwrap();
    assert_eq!(dead_endpoint.consecutive_failures, 2);
    // Deactivated but still registered
    assert_eq!(endpoints.len(), 2);
}
