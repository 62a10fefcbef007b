//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - sends prepared requests
//! - [`CredentialsProvider`] - durable credential storage
//! - [`TokenRefresher`] - the refresh endpoint
//! - [`SyncChannel`] - cross-context broadcast channel
//! - [`CookieSource`] - readable cookies (cross-site-protection token)

pub mod cookies;
pub mod credentials;
pub mod http;
pub mod refresher;
pub mod sync;

pub use cookies::{CookieSource, NoCookies};
pub use credentials::{CredentialsError, CredentialsProvider};
pub use http::{Headers, HttpClient, HttpError, HttpRequest, Method, Response};
pub use refresher::{RefreshError, RefreshedTokens, TokenRefresher};
pub use sync::{SyncChannel, SyncError, SyncStream};
