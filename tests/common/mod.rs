//! Common test utilities for integration tests.
//!
//! Tabs are [`Session`]s built over shared mocks: the same backend
//! ([`MockHttpClient`]), the same refresh endpoint ([`MockTokenRefresher`])
//! and the same persisted credential ([`InMemoryCredentials`]), the way
//! browser tabs share a server and local storage.
//!
//! ```ignore
//! let backend = Backend::new();
//! let hub = BroadcastHub::new();
//! let a = backend.tab_on(&hub).await;
//! let b = backend.tab_on(&hub).await;
//! ```

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use sessionlink::adapters::mock::{InMemoryCredentials, MockHttpClient, MockTokenRefresher};
use sessionlink::adapters::BroadcastHub;
use sessionlink::traits::Response;
use sessionlink::{Credential, RefreshState, Session, SessionConfig};

pub const BASE_URL: &str = "http://api.test/api";

/// Absolute URL for `path` under [`BASE_URL`].
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// A signed-looking token whose payload carries `exp`.
pub fn jwt_with_exp(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user-1","exp":{}}}"#, exp));
    format!("{}.{}.signature", header, payload)
}

/// A token that expires `secs` from now.
pub fn jwt_expiring_in(secs: i64) -> String {
    jwt_with_exp(chrono::Utc::now().timestamp() + secs)
}

/// Credential that is good for an hour.
pub fn test_credential() -> Credential {
    Credential::new("test-access-token", "test-refresh-token")
}

/// `{"success": true, "data": data}` with status 200.
pub fn ok(data: Value) -> Response {
    Response::json_body(200, &json!({"success": true, "data": data}))
}

pub fn unauthorized() -> Response {
    Response::json_body(
        401,
        &json!({"success": false, "message": "Token expired", "error": {"code": "TOKEN_EXPIRED"}}),
    )
}

pub fn config() -> SessionConfig {
    SessionConfig::new(BASE_URL)
        .with_retry_base_delay(Duration::from_millis(100))
        .with_watchdog(Duration::from_secs(30))
}

/// The server side shared by every tab.
#[derive(Clone, Default)]
pub struct Backend {
    pub http: MockHttpClient,
    pub refresher: MockTokenRefresher,
    pub credentials: InMemoryCredentials,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with `credential` already persisted.
    pub fn signed_in(credential: Credential) -> Self {
        Self {
            credentials: InMemoryCredentials::with_credential(credential),
            ..Self::default()
        }
    }

    pub fn builder(&self, config: SessionConfig) -> sessionlink::SessionBuilder {
        Session::builder(config)
            .with_http_client(Arc::new(self.http.clone()))
            .with_refresher(Arc::new(self.refresher.clone()))
            .with_credentials_provider(Arc::new(self.credentials.clone()))
    }

    /// A tab with no sibling channel.
    pub async fn tab(&self) -> Session {
        self.builder(config()).build().await.unwrap()
    }

    /// A tab joined to `hub`.
    pub async fn tab_on(&self, hub: &BroadcastHub) -> Session {
        self.builder(config())
            .with_sync_channel(Arc::new(hub.endpoint()))
            .build()
            .await
            .unwrap()
    }
}

/// Yield until `session` reaches `state`, giving listener tasks a chance to
/// run. Panics if it never does.
pub async fn wait_for_state(session: &Session, state: RefreshState) {
    for _ in 0..1000 {
        if session.refresh_state() == state {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "session stuck in {} waiting for {}",
        session.refresh_state(),
        state
    );
}

/// Yield until `condition` holds. Panics if it never does.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
