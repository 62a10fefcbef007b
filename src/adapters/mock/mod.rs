//! Mock implementations for testing.
//!
//! Test doubles for every port, so the coordinator and pipeline can be
//! exercised without network, file system or sibling processes.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - scripted HTTP responses with request recording
//! - [`InMemoryCredentials`] - in-memory credential storage
//! - [`MockTokenRefresher`] - scripted refresh endpoint
//! - [`MockSyncChannel`] - broadcast channel with message injection

pub mod credentials;
pub mod http;
pub mod refresher;
pub mod sync;

pub use credentials::InMemoryCredentials;
pub use http::{MockHttpClient, MockResponse};
pub use refresher::MockTokenRefresher;
pub use sync::MockSyncChannel;
