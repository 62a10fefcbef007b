//! Retry policy for connection-level failures.
//!
//! Only requests that got no response are retried. Retry `n` waits
//! `n * base_delay`; any response, whatever its status, ends the loop.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::traits::{HttpClient, HttpError, HttpRequest, Response};

/// A request that never got a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryFailure {
    /// The last transport error.
    pub error: HttpError,
    /// Retries made after the initial attempt.
    pub retries: u32,
}

/// Linear backoff over transient transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Send `request`, retrying transient failures.
    ///
    /// Each attempt is bounded by the request's timeout.
    pub async fn send(
        &self,
        http: &dyn HttpClient,
        request: &HttpRequest,
    ) -> Result<Response, RetryFailure> {
        let mut retries = 0;
        loop {
            let started = Instant::now();
            let error = match tokio::time::timeout(request.timeout, http.send(request)).await {
                Ok(Ok(response)) => {
                    debug!(
                        "{} {} -> {} in {:?}",
                        request.method,
                        request.url,
                        response.status,
                        started.elapsed()
                    );
                    return Ok(response);
                }
                Ok(Err(error)) => error,
                Err(_) => HttpError::Timeout(format!("no response within {:?}", request.timeout)),
            };

            if !error.is_transient() || retries >= self.max_retries {
                warn!(
                    "{} {} failed after {:?} ({} retries): {}",
                    request.method,
                    request.url,
                    started.elapsed(),
                    retries,
                    error
                );
                return Err(RetryFailure { error, retries });
            }

            retries += 1;
            let delay = self.delay_for(retries);
            warn!(
                "{} {} failed after {:?}: {}; retry {}/{} in {:?}",
                request.method,
                request.url,
                started.elapsed(),
                error,
                retries,
                self.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}
