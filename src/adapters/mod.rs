//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileCredentialsProvider`] - file-based credential storage
//! - [`BroadcastHub`] / [`BroadcastSync`] - in-process channel between sessions
//! - [`CookieJar`] - cookies parsed from a `Cookie` header
//! - [`ResponseCookies`] - cookies set by the server, shared with the HTTP client
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for every port.

pub mod broadcast_sync;
pub mod cookie_jar;
pub mod file_credentials;
pub mod mock;
pub mod reqwest_http;
pub mod response_cookies;

pub use broadcast_sync::{BroadcastHub, BroadcastSync};
pub use cookie_jar::CookieJar;
pub use file_credentials::FileCredentialsProvider;
pub use mock::{InMemoryCredentials, MockHttpClient, MockSyncChannel, MockTokenRefresher};
pub use reqwest_http::ReqwestHttpClient;
pub use response_cookies::ResponseCookies;
