//! Session lifecycle events.
//!
//! UI code subscribes to these to redirect to sign-in or refresh cached
//! views. Delivery is best effort: slow subscribers may miss events.

use tokio::sync::broadcast;
use tracing::debug;

/// Default number of events buffered per subscriber.
const EVENT_CAPACITY: usize = 32;

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new access token is in the store.
    TokenRefreshed,
    /// The session ended involuntarily; the user must sign in again.
    ReauthenticationRequired { reason: String },
    /// The user signed out.
    LoggedOut,
}

/// Fan-out of [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn emit(&self, event: SessionEvent) {
        debug!("Session event: {:?}", event);
        // Nobody listening is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(SessionEvent::TokenRefreshed);
        bus.emit(SessionEvent::LoggedOut);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TokenRefreshed);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedOut);
    }

    #[test]
    fn test_emit_without_subscribers() {
        EventBus::new().emit(SessionEvent::LoggedOut);
    }
}
