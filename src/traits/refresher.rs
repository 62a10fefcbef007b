//! Token refresher trait abstraction.
//!
//! The refresher is the only thing that talks to the refresh endpoint, and
//! only the refresh coordinator calls it.

use async_trait::async_trait;
use thiserror::Error;

use super::http::HttpError;

/// Tokens returned by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Present when the backend rotated the refresh token. The previous one
    /// must be considered spent.
    pub refresh_token: Option<String>,
}

/// Refresh endpoint failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefreshError {
    #[error("refresh token rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("refresh request failed: {0}")]
    Transport(#[from] HttpError),

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),
}

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError>;
}
