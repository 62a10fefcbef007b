//! Cross-context synchronization.
//!
//! [`CrossContextSync`] is a tab's view of the shared broadcast channel. When
//! no channel is available it quietly does nothing, and the tab falls back to
//! tab-local single-flight refresh.

mod message;

pub use message::SyncMessage;

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::traits::{SyncChannel, SyncStream};

/// Announces local refresh transitions and delivers siblings' ones.
pub struct CrossContextSync {
    channel: Option<Arc<dyn SyncChannel>>,
    connected: bool,
    /// Subscription taken at construction so nothing announced before
    /// [`on_message`](Self::on_message) is missed.
    inbound: Mutex<Option<SyncStream>>,
}

impl CrossContextSync {
    /// Attach to a broadcast channel.
    ///
    /// If subscribing fails the synchronizer still announces when it can, but
    /// receives nothing.
    pub fn new(channel: Arc<dyn SyncChannel>) -> Self {
        let inbound = match channel.subscribe() {
            Ok(stream) => Some(stream),
            Err(e) => {
                debug!("Cross-context sync unavailable, using tab-local refresh: {}", e);
                None
            }
        };
        Self {
            channel: Some(channel),
            connected: inbound.is_some(),
            inbound: Mutex::new(inbound),
        }
    }

    /// A synchronizer that neither sends nor receives.
    pub fn disabled() -> Self {
        Self {
            channel: None,
            connected: false,
            inbound: Mutex::new(None),
        }
    }

    /// Whether sibling messages can be received.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Post `message` to sibling tabs. Failures are logged and swallowed.
    pub fn announce(&self, message: &SyncMessage) {
        let Some(channel) = &self.channel else {
            return;
        };
        match channel.announce(message) {
            Ok(()) => debug!("Announced {}", message.kind()),
            Err(e) => warn!("Failed to announce {}: {}", message.kind(), e),
        }
    }

    /// Deliver every sibling message to `handler` on a background task.
    ///
    /// Messages are handled one at a time in arrival order. Returns `None`
    /// when there is nothing to listen to, or when a handler is already
    /// installed.
    pub fn on_message<F, Fut>(&self, mut handler: F) -> Option<JoinHandle<()>>
    where
        F: FnMut(SyncMessage) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut stream = self.inbound.lock().ok()?.take()?;
        Some(tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                debug!("Received {}", message.kind());
                handler(message).await;
            }
            debug!("Cross-context sync stream closed");
        }))
    }
}

impl std::fmt::Debug for CrossContextSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossContextSync")
            .field("enabled", &self.channel.is_some())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockSyncChannel;
    use tokio::sync::mpsc;

    #[test]
    fn test_disabled_is_noop() {
        let sync = CrossContextSync::disabled();
        sync.announce(&SyncMessage::Started);
        assert!(!sync.is_connected());
    }

    #[tokio::test]
    async fn test_disabled_has_no_listener() {
        let sync = CrossContextSync::disabled();
        assert!(sync.on_message(|_| async {}).is_none());
    }

    #[test]
    fn test_announce_reaches_channel() {
        let channel = Arc::new(MockSyncChannel::new());
        let sync = CrossContextSync::new(channel.clone());
        sync.announce(&SyncMessage::Started);
        sync.announce(&SyncMessage::Failed);
        assert_eq!(
            channel.announced(),
            vec![SyncMessage::Started, SyncMessage::Failed]
        );
    }

    #[test]
    fn test_announce_failure_is_swallowed() {
        let channel = Arc::new(MockSyncChannel::new());
        channel.set_announce_fails(true);
        let sync = CrossContextSync::new(channel.clone());
        sync.announce(&SyncMessage::Started);
        assert!(channel.announced().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_channel_degrades_to_noop() {
        let channel = Arc::new(MockSyncChannel::unavailable());
        let sync = CrossContextSync::new(channel);
        assert!(!sync.is_connected());
        assert!(sync.on_message(|_| async {}).is_none());
    }

    #[tokio::test]
    async fn test_messages_delivered_in_order() {
        let channel = Arc::new(MockSyncChannel::new());
        let sync = CrossContextSync::new(channel.clone());

        // Injected before the handler exists; still delivered.
        channel.inject(SyncMessage::Started);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = sync
            .on_message(move |msg| {
                let _ = tx.send(msg);
                async {}
            })
            .unwrap();

        channel.inject(SyncMessage::Completed {
            access_token: "a".to_string(),
            refresh_token: None,
        });

        assert_eq!(rx.recv().await, Some(SyncMessage::Started));
        assert!(matches!(rx.recv().await, Some(SyncMessage::Completed { .. })));

        assert!(sync.on_message(|_| async {}).is_none());
        assert!(sync.is_connected());
        handle.abort();
    }
}
