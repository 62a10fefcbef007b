//! In-memory token store mirrored to durable storage.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::credentials::Credential;
use crate::traits::CredentialsProvider;

/// Single source of truth for the current credential.
///
/// Reads are served from memory. Writes update memory first and are then
/// mirrored to the [`CredentialsProvider`]; a failed write is logged and the
/// in-memory copy stays authoritative.
pub struct TokenStore {
    current: RwLock<Option<Credential>>,
    provider: Arc<dyn CredentialsProvider>,
    /// Serializes writes so the durable copy ends in the same state as memory.
    write_lock: tokio::sync::Mutex<()>,
}

impl TokenStore {
    pub fn new(provider: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            current: RwLock::new(None),
            provider,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Hydrate the in-memory copy from durable storage.
    pub async fn load(&self) -> Option<Credential> {
        let _guard = self.write_lock.lock().await;
        let loaded = match self.provider.load().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Failed to load stored credentials: {}", e);
                None
            }
        };
        debug!("Token store loaded (present: {})", loaded.is_some());
        self.replace(loaded.clone());
        loaded
    }

    /// The current credential, if any.
    pub fn get(&self) -> Option<Credential> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.get().map(|c| c.access_token)
    }

    /// The current refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.get()
            .map(|c| c.refresh_token)
            .filter(|token| !token.is_empty())
    }

    /// Replace the credential.
    pub async fn set(&self, credential: Credential) {
        let _guard = self.write_lock.lock().await;
        self.replace(Some(credential.clone()));
        if let Err(e) = self.provider.save(&credential).await {
            warn!("Failed to persist credentials: {}", e);
        }
    }

    /// Forget the credential.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        self.replace(None);
        if let Err(e) = self.provider.clear().await {
            warn!("Failed to clear stored credentials: {}", e);
        }
    }

    fn replace(&self, credential: Option<Credential>) {
        match self.current.write() {
            Ok(mut guard) => *guard = credential,
            Err(poisoned) => *poisoned.into_inner() = credential,
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.get().is_some())
            .finish()
    }
}
