//! System-related error types.
//!
//! Covers HTTP failures that carried no structured envelope, response bodies
//! that could not be decoded, and local environment problems.

use std::fmt;

/// Coarse classification of an unstructured HTTP failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// 4xx
    Client,
    /// 5xx
    Server,
    /// Anything else that is not a success (1xx, 3xx).
    Unexpected,
}

impl HttpErrorKind {
    /// Classify a status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => HttpErrorKind::Client,
            500..=599 => HttpErrorKind::Server,
            _ => HttpErrorKind::Unexpected,
        }
    }
}

/// System-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemError {
    /// The server answered with an error status and no failure envelope.
    HttpStatus {
        status: u16,
        kind: HttpErrorKind,
        message: String,
    },

    /// A success response whose body was not valid JSON.
    InvalidResponse { message: String },

    /// Could not determine the home directory for credential storage.
    NoHomeDirectory,

    /// Generic system error.
    Other { message: String },
}

impl SystemError {
    /// Build an `HttpStatus` error from a status and raw body.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        SystemError::HttpStatus {
            status,
            kind: HttpErrorKind::from_status(status),
            message: message.into(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            SystemError::HttpStatus { status, .. } => match *status {
                400 => "The request was invalid. Please try again.".to_string(),
                403 => "Access denied. You don't have permission for this action.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The server is experiencing issues. Please try again later.".to_string()
                }
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            SystemError::InvalidResponse { .. } => {
                "Received an invalid response from the server. Please try again.".to_string()
            }
            SystemError::NoHomeDirectory => {
                "Could not determine your home directory.".to_string()
            }
            SystemError::Other { message } => format!("System error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SystemError::HttpStatus {
                kind: HttpErrorKind::Client,
                ..
            } => "E_HTTP_CLIENT",
            SystemError::HttpStatus {
                kind: HttpErrorKind::Server,
                ..
            } => "E_HTTP_SERVER",
            SystemError::HttpStatus { .. } => "E_HTTP_OTHER",
            SystemError::InvalidResponse { .. } => "E_SYS_INVALID_RESPONSE",
            SystemError::NoHomeDirectory => "E_SYS_NO_HOME",
            SystemError::Other { .. } => "E_SYS_OTHER",
        }
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::HttpStatus {
                status, message, ..
            } => write!(f, "HTTP {} error: {}", status, message),
            SystemError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            SystemError::NoHomeDirectory => write!(f, "Could not determine home directory"),
            SystemError::Other { message } => write!(f, "System error: {}", message),
        }
    }
}

impl std::error::Error for SystemError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_status() {
        assert_eq!(HttpErrorKind::from_status(404), HttpErrorKind::Client);
        assert_eq!(HttpErrorKind::from_status(503), HttpErrorKind::Server);
        assert_eq!(HttpErrorKind::from_status(302), HttpErrorKind::Unexpected);
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(SystemError::http_status(404, "missing").error_code(), "E_HTTP_CLIENT");
        assert_eq!(SystemError::http_status(502, "bad gateway").error_code(), "E_HTTP_SERVER");
    }

    #[test]
    fn test_user_messages_hide_raw_body() {
        let err = SystemError::http_status(500, "Traceback (most recent call last) ...");
        assert!(!err.user_message().contains("Traceback"));
        assert!(err.to_string().contains("Traceback"));
    }
}
