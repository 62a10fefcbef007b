//! Durable credential storage.
//!
//! The provider holds whatever must survive a restart. The in-memory copy
//! that requests read from lives in [`crate::auth::TokenStore`], which writes
//! through to the provider and tolerates its failures.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Credential;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CredentialsError {
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load credential: {0}")]
    LoadFailed(String),

    #[error("failed to save credential: {0}")]
    SaveFailed(String),

    #[error("failed to clear credential: {0}")]
    ClearFailed(String),
}

/// Where the credential is persisted between runs.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// `Ok(None)` when nothing is stored.
    async fn load(&self) -> Result<Option<Credential>, CredentialsError>;

    /// Replace the stored credential.
    async fn save(&self, credential: &Credential) -> Result<(), CredentialsError>;

    /// Remove the stored credential. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), CredentialsError>;
}
