//! Captured outbound request, replayable after a token refresh.

use std::time::Duration;

use crate::traits::{Headers, HttpRequest, Method};

/// Header carrying the bearer token.
pub const AUTHORIZATION: &str = "Authorization";

/// An outbound call as it left the outbound stage.
///
/// Replay after a refresh swaps the bearer token and nothing else; the
/// request is never rebuilt from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub method: Method,
    /// Path as given by the caller, used for allow-list and timeout matching.
    pub path: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    pub timeout: Duration,
    /// Whether the request may go through the refresh path.
    pub authenticated: bool,
    /// Already replayed once after a refresh.
    pub retried: bool,
}

impl RequestRecord {
    /// The access token currently attached, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Attach `token` as the bearer token, replacing any previous one.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers
            .insert(AUTHORIZATION.to_string(), format!("Bearer {}", token));
    }

    /// The request to put on the wire.
    pub fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            timeout: self.timeout,
        }
    }
}
