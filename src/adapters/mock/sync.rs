//! Mock broadcast channel for testing.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::sync::SyncMessage;
use crate::traits::{SyncChannel, SyncError, SyncStream};

/// A [`SyncChannel`] that records announcements and lets tests inject
/// messages as if a sibling tab had sent them.
#[derive(Debug, Clone)]
pub struct MockSyncChannel {
    announced: Arc<Mutex<Vec<SyncMessage>>>,
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<SyncMessage>>>>,
    announce_fails: Arc<Mutex<bool>>,
    available: bool,
}

impl Default for MockSyncChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSyncChannel {
    pub fn new() -> Self {
        Self {
            announced: Arc::new(Mutex::new(Vec::new())),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            announce_fails: Arc::new(Mutex::new(false)),
            available: true,
        }
    }

    /// A channel whose subscription always fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn set_announce_fails(&self, fails: bool) {
        *self.announce_fails.lock().unwrap() = fails;
    }

    /// Messages announced so far, in order.
    pub fn announced(&self) -> Vec<SyncMessage> {
        self.announced.lock().unwrap().clone()
    }

    /// Deliver `message` to every subscriber.
    pub fn inject(&self, message: SyncMessage) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(message.clone()).is_ok());
    }
}

impl SyncChannel for MockSyncChannel {
    fn announce(&self, message: &SyncMessage) -> Result<(), SyncError> {
        if *self.announce_fails.lock().unwrap() {
            return Err(SyncError::PostFailed("Mock announce failure".to_string()));
        }
        self.announced.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn subscribe(&self) -> Result<SyncStream, SyncError> {
        if !self.available {
            return Err(SyncError::Unavailable("Mock channel unavailable".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        })))
    }
}
