//! Cross-context broadcast channel abstraction.
//!
//! A `SyncChannel` is one tab's endpoint on a publish/subscribe channel shared
//! by every tab of the same profile. Messages a tab announces are delivered to
//! every *other* endpoint, never back to the sender.

use std::pin::Pin;

use futures::Stream;
use thiserror::Error;

use crate::sync::SyncMessage;

/// Stream of messages announced by other tabs.
pub type SyncStream = Pin<Box<dyn Stream<Item = SyncMessage> + Send>>;

/// Broadcast channel failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// The runtime offers no broadcast primitive.
    #[error("broadcast channel unavailable: {0}")]
    Unavailable(String),

    /// The message could not be posted.
    #[error("failed to post message: {0}")]
    PostFailed(String),
}

/// One tab's endpoint on the shared broadcast channel.
pub trait SyncChannel: Send + Sync {
    /// Post a message to every other tab.
    fn announce(&self, message: &SyncMessage) -> Result<(), SyncError>;

    /// Subscribe to messages from other tabs.
    fn subscribe(&self) -> Result<SyncStream, SyncError>;
}
