//! Post-publish confirmation.
//!
//! After a publish, a relay can be asked whether it actually stored the
//! event: subscribe with an id filter and watch for a matching EVENT before
//! the end-of-stored-events marker. Like probing, confirmation absorbs all
//! transport failures and just answers yes or no.

use futures::{SinkExt, StreamExt};
use relaypub_core::{ClientMessage, Filter, RelayMessage};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const CONFIRM_SUBSCRIPTION: &str = "verify";

/// Maximum frames to read per relay while looking for the event.
const MAX_FRAMES: usize = 3;

/// Ask one relay whether it has the event.
pub async fn confirm_event(url: &str, event_id: &str, wait: Duration) -> bool {
    match confirm_inner(url, event_id, wait).await {
        Ok(found) => {
            if found {
                info!("Event {} found on relay {}", event_id, url);
            }
            found
        }
        Err(error) => {
            warn!("Error checking relay {}: {}", url, error);
            false
        }
    }
}

async fn confirm_inner(url: &str, event_id: &str, wait: Duration) -> Result<bool, String> {
    let (mut ws, _) = timeout(wait, connect_async(url))
        .await
        .map_err(|_| format!("connect timeout after {:?}", wait))?
        .map_err(|e| e.to_string())?;

    let request = ClientMessage::Req {
        subscription_id: CONFIRM_SUBSCRIPTION.to_string(),
        filters: vec![Filter::new().ids(vec![event_id.to_string()])],
    };
    ws.send(Message::text(request.to_json().map_err(|e| e.to_string())?))
        .await
        .map_err(|e| e.to_string())?;

    let mut frames = 0;
    let found = loop {
        if frames >= MAX_FRAMES {
            break false;
        }
        let next = timeout(wait, ws.next())
            .await
            .map_err(|_| format!("no response within {:?}", wait))?;
        match next {
            Some(Ok(Message::Text(text))) => {
                frames += 1;
                match RelayMessage::from_json(text.as_str()) {
                    Ok(RelayMessage::Event { event, .. }) if event.id == event_id => break true,
                    Ok(RelayMessage::Eose { subscription_id })
                        if subscription_id == CONFIRM_SUBSCRIPTION =>
                    {
                        break false;
                    }
                    _ => {}
                }
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.to_string()),
            None => break false,
        }
    };

    let _ = ws
        .send(Message::text(
            ClientMessage::Close {
                subscription_id: CONFIRM_SUBSCRIPTION.to_string(),
            }
            .to_json()
            .map_err(|e| e.to_string())?,
        ))
        .await;
    let _ = ws.close(None).await;
    Ok(found)
}

/// Ask a set of relays, in rounds, whether any of them has the event.
/// Returns true on the first hit; pauses between rounds.
pub async fn confirm_on_relays(
    urls: &[String],
    event_id: &str,
    rounds: u32,
    pause: Duration,
    wait: Duration,
) -> bool {
    info!("Verifying publication of event {}", event_id);

    for round in 1..=rounds.max(1) {
        debug!("Verification round {} of {}", round, rounds);
        for url in urls {
            if confirm_event(url, event_id, wait).await {
                return true;
            }
        }
        if round < rounds {
            debug!(
                "Event not found yet; waiting {:?} before next round",
                pause
            );
            tokio::time::sleep(pause).await;
        }
    }

    warn!(
        "Failed to verify event {} on any relay after {} rounds",
        event_id, rounds
    );
    false
}
