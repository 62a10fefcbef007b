//! Credential handling.
//!
//! - [`Credential`] and its file storage ([`CredentialsManager`])
//! - [`expiry`]: decoding the access token's `exp` claim
//! - [`TokenStore`]: the in-memory source of truth, mirrored to storage
//! - [`RefreshClient`]: the refresh endpoint

pub mod credentials;
pub mod expiry;
pub mod refresh_api;
pub mod token_store;

pub use credentials::{Credential, CredentialsManager};
pub use expiry::{is_expiring_soon, is_expiring_soon_at, token_expiration};
pub use refresh_api::{RefreshClient, TokenResponse};
pub use token_store::TokenStore;
