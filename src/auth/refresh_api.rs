//! Refresh endpoint client.
//!
//! `POST {refresh_url}` with `{"refresh_token": "..."}`. The response is
//! `{access_token, refresh_token?, token_type?, expires_in?}`, optionally
//! wrapped in the `{success, data}` envelope.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::traits::{
    Headers, HttpClient, HttpRequest, Method, RefreshError, RefreshedTokens, Response,
    TokenRefresher,
};

/// Response from the refresh endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenResponse> for RefreshedTokens {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
        }
    }
}

/// [`TokenRefresher`] that calls the refresh endpoint through an [`HttpClient`].
pub struct RefreshClient {
    http: Arc<dyn HttpClient>,
    url: String,
    timeout: Duration,
}

impl RefreshClient {
    pub fn new(http: Arc<dyn HttpClient>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse(response: &Response) -> Result<RefreshedTokens, RefreshError> {
        let value: serde_json::Value = response
            .json()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        let payload = match value.get("success").and_then(|s| s.as_bool()) {
            Some(false) => {
                return Err(RefreshError::Rejected {
                    status: response.status,
                    message: envelope_message(&value),
                })
            }
            Some(true) => value.get("data").cloned().unwrap_or(serde_json::Value::Null),
            None => value,
        };

        let tokens: TokenResponse = serde_json::from_value(payload)
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        if tokens.access_token.is_empty() {
            return Err(RefreshError::InvalidResponse(
                "empty access_token".to_string(),
            ));
        }
        Ok(tokens.into())
    }
}

fn envelope_message(value: &serde_json::Value) -> String {
    value
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Token refresh failed")
        .to_string()
}

#[async_trait]
impl TokenRefresher for RefreshClient {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let request = HttpRequest {
            method: Method::Post,
            url: self.url.clone(),
            headers,
            body: Some(serde_json::json!({ "refresh_token": refresh_token }).to_string()),
            timeout: self.timeout,
        };

        debug!("POST {} (token refresh)", self.url);
        let response = self.http.send(&request).await?;

        if !response.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .ok()
                .map(|v| envelope_message(&v))
                .or_else(|| response.text().ok().filter(|t| !t.is_empty()))
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!("Token refresh rejected with HTTP {}", response.status);
            return Err(RefreshError::Rejected {
                status: response.status,
                message,
            });
        }

        Self::parse(&response)
    }
}
