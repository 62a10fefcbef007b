//! Request pipeline.
//!
//! Outbound, a request gets its bearer token, its cross-site-protection
//! header and its timeout, and is captured as a [`RequestRecord`]. Inbound,
//! the response is classified:
//!
//! | Outcome | Handling |
//! |---------|----------|
//! | no response | [`RetryPolicy`] |
//! | 2xx | envelope unwrapped, `success: false` is a business error |
//! | 401 | refresh through the coordinator and replay once |
//! | other | business error if enveloped, else system error |

pub mod envelope;
pub mod record;
pub mod retry;

pub use record::RequestRecord;
pub use retry::{RetryFailure, RetryPolicy};

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::{expiry, TokenStore};
use crate::config::SessionConfig;
use crate::coordinator::RefreshCoordinator;
use crate::error::{AuthError, ErrorContext, NetworkError, SessionError, SessionResult};
use crate::events::{EventBus, SessionEvent};
use crate::traits::{CookieSource, Headers, HttpClient, Method, Response};

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Wins over the timeout table.
    pub timeout: Option<Duration>,
    /// Extra headers. Authorization and the CSRF header are set by the
    /// pipeline and take precedence.
    pub headers: Headers,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// What to do with a 401.
enum Unauthorized {
    Replay,
    Fail(SessionError),
}

/// Attaches credentials, sends, classifies, and replays after refresh.
pub struct RequestPipeline {
    config: Arc<SessionConfig>,
    http: Arc<dyn HttpClient>,
    store: Arc<TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
    cookies: Arc<dyn CookieSource>,
    events: EventBus,
    retry: RetryPolicy,
}

impl RequestPipeline {
    pub fn new(
        config: Arc<SessionConfig>,
        http: Arc<dyn HttpClient>,
        store: Arc<TokenStore>,
        coordinator: Arc<RefreshCoordinator>,
        cookies: Arc<dyn CookieSource>,
        events: EventBus,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            http,
            store,
            coordinator,
            cookies,
            events,
            retry,
        }
    }

    /// Build the outbound record for a call.
    ///
    /// Starts a background refresh when the attached token is about to
    /// expire; the call itself still goes out with the current token.
    pub fn prepare(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> RequestRecord {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        if body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        headers.extend(options.headers.clone());

        let authenticated = !self.config.is_unauthenticated(path);
        let mut record = RequestRecord {
            method,
            path: path.to_string(),
            url: self.config.url_for(path),
            headers,
            body: body.map(Value::to_string),
            timeout: options
                .timeout
                .unwrap_or_else(|| self.config.timeout_for(path)),
            authenticated,
            retried: false,
        };

        if authenticated {
            if let Some(token) = self.store.access_token() {
                if expiry::is_expiring_soon(&token, self.config.refresh_lead_time)
                    && self.coordinator.trigger_background()
                {
                    info!("Access token expires soon, refreshing in background");
                }
                record.set_bearer(&token);
            }
        }

        if method.is_mutating() {
            if let Some(csrf) = self.cookies.cookie(&self.config.csrf_cookie_name) {
                record
                    .headers
                    .insert(self.config.csrf_header_name.clone(), csrf);
            }
        }

        record
    }

    /// Run a call through the whole pipeline.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> SessionResult<Value> {
        let record = self.prepare(method, path, body, options);
        self.dispatch(record).await
    }

    /// Send a prepared record, replaying it once after a refresh on 401.
    pub async fn dispatch(&self, mut record: RequestRecord) -> SessionResult<Value> {
        loop {
            let response = self.send(&record).await?;

            if response.status == 401 {
                match self.on_unauthorized(&mut record, &response).await {
                    Unauthorized::Replay => continue,
                    Unauthorized::Fail(err) => {
                        return Err(self.with_request_context(err, &record, 0))
                    }
                }
            }

            let result = if response.is_success() {
                envelope::decode_success(&response)
            } else {
                Err(envelope::decode_failure(&response))
            };
            return result.map_err(|err| {
                debug!("{} {} failed: {}", record.method, record.path, err);
                self.with_request_context(err, &record, 0)
            });
        }
    }

    async fn send(&self, record: &RequestRecord) -> SessionResult<Response> {
        let request = record.to_http();
        self.retry
            .send(self.http.as_ref(), &request)
            .await
            .map_err(|failure| {
                let err =
                    NetworkError::from_http_error(&failure.error, &record.url, record.timeout);
                self.with_request_context(err.into(), record, failure.retries)
            })
    }

    async fn on_unauthorized(
        &self,
        record: &mut RequestRecord,
        response: &Response,
    ) -> Unauthorized {
        if !record.authenticated {
            return Unauthorized::Fail(envelope::rejected(response).into());
        }

        if record.retried {
            warn!(
                "{} {} rejected again after token refresh, ending session",
                record.method, record.path
            );
            self.store.clear().await;
            self.events.emit(SessionEvent::ReauthenticationRequired {
                reason: "request rejected after token refresh".to_string(),
            });
            return Unauthorized::Fail(AuthError::SessionExpired.into());
        }

        record.retried = true;
        debug!("{} {} got 401, waiting for a fresh token", record.method, record.path);
        let rejected = record.bearer().map(str::to_string);
        match self.coordinator.acquire(rejected.as_deref()).await {
            Ok(token) => {
                record.set_bearer(&token);
                Unauthorized::Replay
            }
            Err(err) => Unauthorized::Fail(err.into()),
        }
    }

    fn with_request_context(
        &self,
        err: SessionError,
        record: &RequestRecord,
        retries: u32,
    ) -> SessionError {
        err.with_context(
            ErrorContext::new("request")
                .with_request(record.method.as_str(), record.url.clone())
                .with_retry_count(retries),
        )
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("base_url", &self.config.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}
