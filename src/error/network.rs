//! Network-related error types.
//!
//! A `NetworkError` means no HTTP response was received at all. Responses
//! with error statuses are classified elsewhere.

use std::fmt;
use std::time::Duration;

use crate::traits::HttpError;

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed or was aborted.
    ConnectionFailed { url: String, message: String },

    /// Request timed out.
    Timeout { url: String, duration_secs: u64 },

    /// Request was cancelled before a response arrived.
    Cancelled,

    /// The request URL could not be used.
    InvalidUrl { url: String },

    /// Generic transport error.
    Other { message: String },
}

impl NetworkError {
    /// Build a `NetworkError` from a transport-level `HttpError`.
    ///
    /// `timeout` is the duration the request was allowed, reported on timeouts.
    pub fn from_http_error(err: &HttpError, url: &str, timeout: Duration) -> Self {
        match err {
            HttpError::ConnectionFailed(message) | HttpError::Io(message) => {
                NetworkError::ConnectionFailed {
                    url: url.to_string(),
                    message: message.clone(),
                }
            }
            HttpError::Timeout(_) => NetworkError::Timeout {
                url: url.to_string(),
                duration_secs: timeout.as_secs(),
            },
            HttpError::Cancelled => NetworkError::Cancelled,
            HttpError::InvalidUrl(_) => NetworkError::InvalidUrl {
                url: url.to_string(),
            },
            HttpError::Other(message) => NetworkError::Other {
                message: message.clone(),
            },
        }
    }

    /// Check if this error is transient and the request can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NetworkError::ConnectionFailed { .. } | NetworkError::Timeout { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to connect to the server. Please check your internet connection."
                    .to_string()
            }
            NetworkError::Timeout { duration_secs, .. } => format!(
                "The request timed out after {} seconds. The server may be slow or unreachable.",
                duration_secs
            ),
            NetworkError::Cancelled => "The request was cancelled.".to_string(),
            NetworkError::InvalidUrl { url } => format!("The address '{}' is not valid.", url),
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::Cancelled => "E_NET_CANCEL",
            NetworkError::InvalidUrl { .. } => "E_NET_URL",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::Timeout { url, duration_secs } => {
                write!(f, "Request to '{}' timed out after {} seconds", url, duration_secs)
            }
            NetworkError::Cancelled => write!(f, "Request cancelled"),
            NetworkError::InvalidUrl { url } => write!(f, "Invalid URL: {}", url),
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}
