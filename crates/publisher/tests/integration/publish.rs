//! Dispatch and strategy tests: one result per relay, simple any-success
//! semantics, broadcast retries, and the module event envelope.

use crate::mock_relay::{publisher_for, start_mock_relay, test_config, RelayBehavior};
use relaypub::{dispatch, EventDraft, StrategyKind};
use relaypub_core::{finalize_event, generate_secret_key, EventTemplate, KIND_REPO_COMMIT};
use std::time::Duration;

#[tokio::test]
async fn test_dispatch_reports_every_relay() {
    let accept = start_mock_relay(RelayBehavior::Accept).await;
    let reject = start_mock_relay(RelayBehavior::Reject).await;
    let silent = start_mock_relay(RelayBehavior::Silent).await;

    let secret_key = generate_secret_key();
    let event = finalize_event(
        &EventTemplate {
            created_at: 1617932115,
            kind: 1,
            tags: vec![],
            content: "batch accounting".to_string(),
        },
        &secret_key,
    )
    .unwrap();

    let urls = vec![accept.url.clone(), reject.url.clone(), silent.url.clone()];
    let config = test_config(StrategyKind::Simple);

    let results = dispatch::publish_batch(&event, &urls, &config).await;

    // Exactly one result per relay, timeouts included
    assert_eq!(results.len(), urls.len());
    for url in &urls {
        assert_eq!(results.iter().filter(|r| &r.relay_url == url).count(), 1);
    }

    let accepted = results.iter().find(|r| r.relay_url == accept.url).unwrap();
    assert!(accepted.success);
    assert!(accepted.error.is_none());

    let rejected = results.iter().find(|r| r.relay_url == reject.url).unwrap();
    assert!(!rejected.success);
    assert!(rejected.response.as_deref().unwrap().contains("blocked"));

    let timed_out = results.iter().find(|r| r.relay_url == silent.url).unwrap();
    assert!(!timed_out.success);
    assert!(timed_out.error.is_some());
}

#[tokio::test]
async fn test_simple_accepts_with_one_success() {
    let accept = start_mock_relay(RelayBehavior::Accept).await;
    let reject = start_mock_relay(RelayBehavior::Reject).await;

    let publisher = publisher_for(&[&accept, &reject], test_config(StrategyKind::Simple));
    let outcome = publisher.publish(EventDraft::note("hello")).await.unwrap();

    assert!(outcome.accepted);
    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.total_relay_count, 2);
    assert_eq!(outcome.attempts(), 1);
    assert_eq!(accept.stored.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_simple_rejected_everywhere_is_unaccepted_not_an_error() {
    let reject_a = start_mock_relay(RelayBehavior::Reject).await;
    let reject_b = start_mock_relay(RelayBehavior::Reject).await;

    let publisher = publisher_for(&[&reject_a, &reject_b], test_config(StrategyKind::Simple));
    let outcome = publisher.publish(EventDraft::note("hello")).await.unwrap();

    assert!(!outcome.accepted);
    assert_eq!(outcome.success_count, 0);
    assert_eq!(outcome.success_rate, 0.0);
    // Each relay still produced a diagnostic
    assert!(outcome.results.iter().all(|r| r.response.is_some()));
}

#[tokio::test]
async fn test_simple_uses_at_most_five_relays() {
    let mut relays = Vec::new();
    for _ in 0..7 {
        relays.push(start_mock_relay(RelayBehavior::Accept).await);
    }
    let refs: Vec<&_> = relays.iter().collect();

    let publisher = publisher_for(&refs, test_config(StrategyKind::Simple));
    let outcome = publisher.publish(EventDraft::note("hello")).await.unwrap();

    assert_eq!(outcome.total_relay_count, 5);
    assert_eq!(outcome.success_count, 5);
}

#[tokio::test]
async fn test_broadcast_retries_until_accepted() {
    let flaky = start_mock_relay(RelayBehavior::RejectFirst(2)).await;
    let reject = start_mock_relay(RelayBehavior::Reject).await;

    let publisher = publisher_for(&[&flaky, &reject], test_config(StrategyKind::Broadcast));
    let outcome = publisher.publish(EventDraft::note("persistent")).await.unwrap();

    // The flaky relay rejected twice, then the third attempt got through
    assert!(outcome.accepted);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(flaky.stored.lock().unwrap().len(), 1);

    let flaky_result = outcome
        .results
        .iter()
        .find(|r| r.relay_url == flaky.url)
        .unwrap();
    assert!(flaky_result.success);
}

#[tokio::test]
async fn test_broadcast_gives_up_after_bounded_retries() {
    let reject = start_mock_relay(RelayBehavior::Reject).await;

    let publisher = publisher_for(&[&reject], test_config(StrategyKind::Broadcast));
    let outcome = publisher.publish(EventDraft::note("doomed")).await.unwrap();

    assert!(!outcome.accepted);
    // One final result per relay, regardless of internal retries
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.total_relay_count, 1);
}

#[tokio::test]
async fn test_publish_for_source_wraps_envelope() {
    let accept = start_mock_relay(RelayBehavior::Accept).await;

    let publisher = publisher_for(&[&accept], test_config(StrategyKind::Simple));
    let outcome = publisher
        .publish_for_source("repo_bridge", "commit", r#"{"sha":"abc123"}"#, vec![])
        .await
        .unwrap();

    assert!(outcome.accepted);

    let stored = accept.stored.lock().unwrap();
    let event = &stored[0];
    assert_eq!(event["kind"].as_u64(), Some(KIND_REPO_COMMIT as u64));

    let content: serde_json::Value =
        serde_json::from_str(event["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["module"], "repo_bridge");
    assert_eq!(content["type"], "commit");
    assert_eq!(content["content"], r#"{"sha":"abc123"}"#);

    let tags = event["tags"].as_array().unwrap();
    assert!(tags
        .iter()
        .any(|t| t[0] == "e" && t[1] == "repo_bridge"));
    assert!(tags.iter().any(|t| t[0] == "t" && t[1] == "commit"));
}

#[tokio::test]
async fn test_slow_relay_still_counts_within_timeout() {
    let slow = start_mock_relay(RelayBehavior::DelayedAccept(100)).await;

    let mut config = test_config(StrategyKind::Simple);
    config.ack_timeout = Duration::from_millis(800);
    let publisher = publisher_for(&[&slow], config);

    let outcome = publisher.publish(EventDraft::note("patience")).await.unwrap();
    assert!(outcome.accepted);

    let result = &outcome.results[0];
    assert!(result.latency >= Duration::from_millis(100));
}
