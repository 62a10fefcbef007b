//! File-based credentials provider adapter.
//!
//! Wraps [`CredentialsManager`] so the token store can persist to
//! `~/.sessionlink/credentials.json` (or any explicit path).

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::auth::credentials::{Credential, CredentialsManager};
use crate::traits::{CredentialsError, CredentialsProvider};

/// File-based credentials provider.
///
/// # Example
///
/// ```ignore
/// use sessionlink::adapters::FileCredentialsProvider;
/// use sessionlink::auth::TokenStore;
///
/// let provider = FileCredentialsProvider::new()?;
/// let store = TokenStore::new(Arc::new(provider));
/// store.load().await;
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialsProvider {
    manager: CredentialsManager,
}

impl FileCredentialsProvider {
    /// Create a provider for the default location.
    ///
    /// Fails if the home directory cannot be determined.
    pub fn new() -> Result<Self, CredentialsError> {
        CredentialsManager::new()
            .map(|manager| Self { manager })
            .ok_or_else(|| CredentialsError::Unavailable("no home directory".to_string()))
    }

    /// Create a provider for an explicit file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            manager: CredentialsManager::with_path(path),
        }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &Path {
        self.manager.credentials_path()
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn load(&self) -> Result<Option<Credential>, CredentialsError> {
        // A missing or unreadable file is an empty store, not an error.
        Ok(self.manager.load())
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialsError> {
        self.manager
            .save(credential)
            .map_err(|e| CredentialsError::SaveFailed(e.to_string()))
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        self.manager
            .clear()
            .map_err(|e| CredentialsError::ClearFailed(e.to_string()))
    }
}
