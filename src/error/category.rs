//! Error category classification for unified error handling.
//!
//! Categories drive the coarse handling decision for a failed request:
//! retry locally, refresh and replay, or surface to the caller.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No response was received (connection, DNS, timeout).
    /// Retried locally by the retry policy.
    Network,

    /// Authentication failures. Triggers refresh-and-replay once, then terminal.
    Auth,

    /// The backend answered with a structured failure envelope.
    /// Never retried; the caller renders the message and hint.
    Business,

    /// Unstructured HTTP 5xx failures.
    Server,

    /// Unstructured HTTP 4xx failures and malformed requests.
    Client,

    /// Local failures (storage, invalid response bodies).
    System,

    /// Invalid configuration values.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are retried by the retry policy.
    ///
    /// Only connection-level failures qualify; server errors that produced a
    /// response are surfaced as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Business => "business",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::System => "system",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns a user-friendly description of the category.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network connectivity issue",
            ErrorCategory::Auth => "Authentication problem",
            ErrorCategory::Business => "Request rejected by the server",
            ErrorCategory::Server => "Server-side issue",
            ErrorCategory::Client => "Invalid request",
            ErrorCategory::System => "Local system error",
            ErrorCategory::Configuration => "Configuration problem",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your internet connection and try again",
            ErrorCategory::Auth => "Please sign in again",
            ErrorCategory::Business => "Review the request and try again",
            ErrorCategory::Server => {
                "The server may be experiencing issues. Please try again later"
            }
            ErrorCategory::Client => "Check the request parameters and try again",
            ErrorCategory::System => "Check file permissions and available disk space",
            ErrorCategory::Configuration => "Check your configuration settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
