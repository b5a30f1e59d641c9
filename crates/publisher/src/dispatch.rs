//! Concurrent publish dispatch.
//!
//! One short-lived connection per relay, capped concurrency per batch, one
//! result per relay no matter what happens on the wire. A relay accepts an
//! event by answering `["OK", <event id>, true, ...]`; anything else within
//! the acknowledgement window is skipped, and silence is a timeout.

use crate::config::PublisherConfig;
use crate::outcome::PublishAttemptResult;
use futures::{SinkExt, StreamExt};
use relaypub_core::{ClientMessage, Event, RelayMessage};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Publish an event to a single relay and wait for its acknowledgement.
/// Transport failures are absorbed into the returned result.
pub async fn publish_to_relay(
    url: &str,
    event: &Event,
    connect_timeout: Duration,
    ack_timeout: Duration,
) -> PublishAttemptResult {
    debug!("Publishing event {} to relay {}", event.id, url);
    let started = Instant::now();

    match publish_inner(url, event, connect_timeout, ack_timeout).await {
        Ok((accepted, message)) => {
            if accepted {
                debug!("Relay {} accepted event {}", url, event.id);
            } else {
                warn!("Relay {} rejected event {}: {}", url, event.id, message);
            }
            PublishAttemptResult {
                relay_url: url.to_string(),
                success: accepted,
                response: Some(message),
                error: None,
                latency: started.elapsed(),
            }
        }
        Err(error) => {
            warn!("Failed to publish to relay {}: {}", url, error);
            PublishAttemptResult {
                relay_url: url.to_string(),
                success: false,
                response: None,
                error: Some(error),
                latency: started.elapsed(),
            }
        }
    }
}

async fn publish_inner(
    url: &str,
    event: &Event,
    connect_timeout: Duration,
    ack_timeout: Duration,
) -> Result<(bool, String), String> {
    let (mut ws, _) = timeout(connect_timeout, connect_async(url))
        .await
        .map_err(|_| format!("connect timeout after {:?}", connect_timeout))?
        .map_err(|e| e.to_string())?;

    let payload = ClientMessage::Event(event.clone())
        .to_json()
        .map_err(|e| e.to_string())?;
    ws.send(Message::text(payload))
        .await
        .map_err(|e| e.to_string())?;

    let ack = timeout(ack_timeout, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    match RelayMessage::from_json(text.as_str()) {
                        Ok(RelayMessage::Ok {
                            event_id,
                            success,
                            message,
                        }) if event_id == event.id => return Ok((success, message)),
                        Ok(RelayMessage::Notice { message }) => {
                            debug!("Notice from {}: {}", url, message);
                        }
                        // Acks for other events, EOSE, AUTH challenges and
                        // unparseable frames are skipped while waiting.
                        _ => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.to_string()),
                None => return Err("connection closed before acknowledgement".to_string()),
            }
        }
    })
    .await
    .map_err(|_| format!("no acknowledgement within {:?}", ack_timeout))??;

    let _ = ws.close(None).await;
    Ok(ack)
}

/// Publish an event to a batch of relays concurrently.
///
/// Connections are capped at the configured concurrency; results are
/// collected behind a join barrier, exactly one per input relay.
pub async fn publish_batch(
    event: &Event,
    urls: &[String],
    config: &PublisherConfig,
) -> Vec<PublishAttemptResult> {
    debug!("Dispatching event {} to {} relays", event.id, urls.len());
    let connect_timeout = config.connect_timeout;
    let ack_timeout = config.ack_timeout;

    let results: Vec<PublishAttemptResult> = futures::stream::iter(urls.iter().cloned())
        .map(|url| {
            let event = event.clone();
            async move { publish_to_relay(&url, &event, connect_timeout, ack_timeout).await }
        })
        .buffer_unordered(config.max_concurrency.max(1))
        .collect()
        .await;

    let accepted = results.iter().filter(|r| r.success).count();
    info!(
        "Published event {} to {} out of {} relays",
        event.id,
        accepted,
        results.len()
    );
    results
}
