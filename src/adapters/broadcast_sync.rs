//! In-process broadcast channel between sessions.
//!
//! A [`BroadcastHub`] plays the role of the named channel every tab of a
//! profile opens. Each session takes its own [`BroadcastSync`] endpoint from
//! the hub. Messages travel as JSON, tagged with the sender's endpoint id so
//! nobody hears its own announcements.

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::sync::SyncMessage;
use crate::traits::{SyncChannel, SyncError, SyncStream};

/// Default number of undelivered messages a slow endpoint may lag behind.
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct Frame {
    origin: Uuid,
    payload: String,
}

/// The shared channel.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<Frame>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// A fresh endpoint with its own identity.
    pub fn endpoint(&self) -> BroadcastSync {
        BroadcastSync {
            id: Uuid::new_v4(),
            tx: self.tx.clone(),
        }
    }
}

/// One session's endpoint on a [`BroadcastHub`].
#[derive(Debug, Clone)]
pub struct BroadcastSync {
    id: Uuid,
    tx: broadcast::Sender<Frame>,
}

impl BroadcastSync {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl SyncChannel for BroadcastSync {
    fn announce(&self, message: &SyncMessage) -> Result<(), SyncError> {
        let payload = message
            .to_json()
            .map_err(|e| SyncError::PostFailed(e.to_string()))?;
        let frame = Frame {
            origin: self.id,
            payload,
        };
        // No subscribers just means no sibling is listening.
        if self.tx.send(frame).is_err() {
            debug!("No listeners for {}", message.kind());
        }
        Ok(())
    }

    fn subscribe(&self) -> Result<SyncStream, SyncError> {
        let own_id = self.id;
        let rx = self.tx.subscribe();

        let frames = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(frame) => return Some((frame, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Sync listener lagged, {} messages dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        let messages = frames.filter_map(move |frame| async move {
            if frame.origin == own_id {
                return None;
            }
            match SyncMessage::from_json(&frame.payload) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("Ignoring malformed sync message: {}", e);
                    None
                }
            }
        });

        Ok(Box::pin(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_siblings_receive_sender_does_not() {
        let hub = BroadcastHub::new();
        let a = hub.endpoint();
        let b = hub.endpoint();
        let c = hub.endpoint();

        let mut a_rx = a.subscribe().unwrap();
        let mut b_rx = b.subscribe().unwrap();
        let mut c_rx = c.subscribe().unwrap();

        a.announce(&SyncMessage::Started).unwrap();
        b.announce(&SyncMessage::Failed).unwrap();

        assert_eq!(b_rx.next().await, Some(SyncMessage::Started));
        assert_eq!(c_rx.next().await, Some(SyncMessage::Started));
        assert_eq!(c_rx.next().await, Some(SyncMessage::Failed));
        assert_eq!(a_rx.next().await, Some(SyncMessage::Failed));

        let nothing = tokio::time::timeout(Duration::from_millis(20), b_rx.next()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_completed_carries_tokens() {
        let hub = BroadcastHub::new();
        let a = hub.endpoint();
        let b = hub.endpoint();
        let mut b_rx = b.subscribe().unwrap();

        let message = SyncMessage::Completed {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
        };
        a.announce(&message).unwrap();
        assert_eq!(b_rx.next().await, Some(message));
    }

    #[test]
    fn test_announce_without_listeners_is_ok() {
        let hub = BroadcastHub::new();
        assert!(hub.endpoint().announce(&SyncMessage::Started).is_ok());
    }

    #[test]
    fn test_endpoints_have_distinct_ids() {
        let hub = BroadcastHub::new();
        assert_ne!(hub.endpoint().id(), hub.endpoint().id());
    }
}
