//! Mock token refresher for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::traits::{RefreshError, RefreshedTokens, TokenRefresher};

/// Scriptable [`TokenRefresher`].
///
/// Without scripted results every call succeeds with `access-{n}` and a
/// rotated `refresh-{n}`, `n` being the 1-based call number. A refresh can be
/// held in flight with [`hold`](Self::hold) until [`release`](Self::release).
#[derive(Debug, Clone)]
pub struct MockTokenRefresher {
    results: Arc<Mutex<VecDeque<Result<RefreshedTokens, RefreshError>>>>,
    received: Arc<Mutex<Vec<String>>>,
    latency: Arc<Mutex<Option<Duration>>>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for MockTokenRefresher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTokenRefresher {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            results: Arc::new(Mutex::new(VecDeque::new())),
            received: Arc::new(Mutex::new(Vec::new())),
            latency: Arc::new(Mutex::new(None)),
            gate: Arc::new(gate),
        }
    }

    /// Queue the outcome of the next unscripted call.
    pub fn push_result(&self, result: Result<RefreshedTokens, RefreshError>) {
        self.results.lock().unwrap().push_back(result);
    }

    /// Queue a success.
    pub fn push_tokens(&self, access_token: &str, refresh_token: Option<&str>) {
        self.push_result(Ok(RefreshedTokens {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
        }));
    }

    /// Queue a rejection with `status`.
    pub fn push_rejection(&self, status: u16) {
        self.push_result(Err(RefreshError::Rejected {
            status,
            message: "Invalid refresh token".to_string(),
        }));
    }

    /// Delay every refresh by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Block refreshes that start from now on until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let held refreshes complete.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Number of refresh calls made.
    pub fn call_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Refresh tokens presented, in call order.
    pub fn received_tokens(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let call = {
            let mut received = self.received.lock().unwrap();
            received.push(refresh_token.to_string());
            received.len()
        };

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let scripted = self.results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(RefreshedTokens {
                access_token: format!("access-{}", call),
                refresh_token: Some(format!("refresh-{}", call)),
            })
        })
    }
}
