//! Authentication-related error types.

use std::fmt;

/// Authentication-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// No credential is stored (never signed in, or the session was terminated).
    NotAuthenticated,

    /// A request that was already replayed with a refreshed token was rejected again.
    SessionExpired,

    /// The refresh endpoint rejected the refresh token or answered unusably.
    RefreshFailed { message: String },

    /// The refresh did not settle within the watchdog duration.
    RefreshTimedOut { after_secs: u64 },

    /// A 401 on an endpoint that is exempt from the refresh path
    /// (login, refresh, health).
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
        recovery_hint: Option<String>,
    },
}

impl AuthError {
    /// Check if this error requires the user to sign in again.
    pub fn requires_reauth(&self) -> bool {
        match self {
            AuthError::NotAuthenticated
            | AuthError::SessionExpired
            | AuthError::RefreshFailed { .. }
            | AuthError::RefreshTimedOut { .. } => true,
            AuthError::Rejected { status, .. } => *status == 401,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::NotAuthenticated => {
                "You are not signed in. Please sign in to continue.".to_string()
            }
            AuthError::SessionExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            AuthError::RefreshFailed { .. } => {
                "Failed to renew your session. Please sign in again.".to_string()
            }
            AuthError::RefreshTimedOut { .. } => {
                "Renewing your session took too long. Please sign in again.".to_string()
            }
            AuthError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            AuthError::Rejected { .. } => "Authentication failed.".to_string(),
        }
    }

    /// Server-provided recovery hint, if any.
    pub fn server_hint(&self) -> Option<&str> {
        match self {
            AuthError::Rejected { recovery_hint, .. } => recovery_hint.as_deref(),
            _ => None,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "E_AUTH_NOT_AUTH",
            AuthError::SessionExpired => "E_AUTH_SESSION_EXP",
            AuthError::RefreshFailed { .. } => "E_AUTH_REFRESH_FAIL",
            AuthError::RefreshTimedOut { .. } => "E_AUTH_REFRESH_TIMEOUT",
            AuthError::Rejected { .. } => "E_AUTH_REJECTED",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::SessionExpired => {
                write!(f, "Request rejected after token refresh; session expired")
            }
            AuthError::RefreshFailed { message } => {
                write!(f, "Token refresh failed: {}", message)
            }
            AuthError::RefreshTimedOut { after_secs } => {
                write!(f, "Token refresh timed out after {} seconds", after_secs)
            }
            AuthError::Rejected {
                status,
                code,
                message,
                ..
            } => match code {
                Some(code) => write!(f, "Authentication rejected ({}, {}): {}", status, code, message),
                None => write!(f, "Authentication rejected ({}): {}", status, message),
            },
        }
    }
}

impl std::error::Error for AuthError {}
