//! In-memory credentials provider for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::auth::Credential;
use crate::traits::{CredentialsError, CredentialsProvider};

#[derive(Debug, Default)]
struct Failures {
    load: bool,
    save: bool,
    clear: bool,
}

/// In-memory credentials provider for testing.
///
/// Clones share the same storage, so a test can keep a handle and inspect
/// what a session persisted.
///
/// # Example
///
/// ```ignore
/// use sessionlink::adapters::mock::InMemoryCredentials;
/// use sessionlink::auth::Credential;
///
/// let provider = InMemoryCredentials::with_credential(Credential::new("a", "r"));
/// let store = TokenStore::new(Arc::new(provider.clone()));
/// store.clear().await;
/// assert!(provider.stored().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentials {
    credential: Arc<Mutex<Option<Credential>>>,
    failures: Arc<Mutex<Failures>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        let provider = Self::new();
        provider.set_stored(Some(credential));
        provider
    }

    pub fn set_load_should_fail(&self, should_fail: bool) {
        self.failures.lock().unwrap().load = should_fail;
    }

    pub fn set_save_should_fail(&self, should_fail: bool) {
        self.failures.lock().unwrap().save = should_fail;
    }

    pub fn set_clear_should_fail(&self, should_fail: bool) {
        self.failures.lock().unwrap().clear = should_fail;
    }

    /// The stored credential, read synchronously.
    pub fn stored(&self) -> Option<Credential> {
        self.credential.lock().unwrap().clone()
    }

    /// Replace the stored credential without going through the trait.
    pub fn set_stored(&self, credential: Option<Credential>) {
        *self.credential.lock().unwrap() = credential;
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl CredentialsProvider for InMemoryCredentials {
    async fn load(&self) -> Result<Option<Credential>, CredentialsError> {
        if self.failures.lock().unwrap().load {
            return Err(CredentialsError::LoadFailed("Mock load failure".to_string()));
        }
        Ok(self.stored())
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialsError> {
        if self.failures.lock().unwrap().save {
            return Err(CredentialsError::SaveFailed("Mock save failure".to_string()));
        }
        self.set_stored(Some(credential.clone()));
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        if self.failures.lock().unwrap().clear {
            return Err(CredentialsError::ClearFailed("Mock clear failure".to_string()));
        }
        self.set_stored(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() {
        let provider = InMemoryCredentials::new();
        assert!(provider.load().await.unwrap().is_none());

        provider.save(&Credential::new("a", "r")).await.unwrap();
        assert_eq!(provider.load().await.unwrap(), Some(Credential::new("a", "r")));
        assert_eq!(provider.save_count(), 1);

        provider.clear().await.unwrap();
        assert!(provider.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let provider = InMemoryCredentials::new();
        let clone = provider.clone();
        clone.save(&Credential::new("a", "r")).await.unwrap();
        assert!(provider.stored().is_some());
    }

    #[tokio::test]
    async fn test_failures() {
        let provider = InMemoryCredentials::with_credential(Credential::new("a", "r"));

        provider.set_load_should_fail(true);
        assert!(matches!(
            provider.load().await,
            Err(CredentialsError::LoadFailed(_))
        ));

        provider.set_save_should_fail(true);
        assert!(matches!(
            provider.save(&Credential::new("b", "r")).await,
            Err(CredentialsError::SaveFailed(_))
        ));
        assert_eq!(provider.stored().map(|c| c.access_token), Some("a".to_string()));

        provider.set_clear_should_fail(true);
        assert!(provider.clear().await.is_err());
        assert!(provider.stored().is_some());
    }
}
