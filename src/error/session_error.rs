//! Unified error type for session operations.
//!
//! `SessionError` is what callers of the request pipeline receive. It keeps
//! the four failure classes apart (network, auth, business, system) so the
//! UI layer can decide between "sign in again" and "show a message".

use std::fmt;

use super::auth::AuthError;
use super::business::BusinessError;
use super::category::ErrorCategory;
use super::context::ErrorContext;
use super::network::NetworkError;
use super::system::{HttpErrorKind, SystemError};
use crate::config::ConfigError;

/// Unified error type for the session layer.
#[derive(Debug)]
pub enum SessionError {
    /// No response was received, after exhausting retries.
    Network(NetworkError),

    /// Authentication failure; terminal once surfaced.
    Auth(AuthError),

    /// Structured failure envelope from the backend.
    Business(BusinessError),

    /// Unstructured HTTP failure or local problem.
    System(SystemError),

    /// Invalid configuration.
    Config(ConfigError),

    /// Wrapped error with additional context.
    WithContext {
        error: Box<SessionError>,
        context: ErrorContext,
    },
}

impl SessionError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::Network(_) => ErrorCategory::Network,
            SessionError::Auth(_) => ErrorCategory::Auth,
            SessionError::Business(_) => ErrorCategory::Business,
            SessionError::System(SystemError::HttpStatus { kind, .. }) => match kind {
                HttpErrorKind::Client => ErrorCategory::Client,
                HttpErrorKind::Server | HttpErrorKind::Unexpected => ErrorCategory::Server,
            },
            SessionError::System(_) => ErrorCategory::System,
            SessionError::Config(_) => ErrorCategory::Configuration,
            SessionError::WithContext { error, .. } => error.category(),
        }
    }

    /// Check if this error would be retried by the retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Network(err) => err.is_retryable(),
            SessionError::WithContext { error, .. } => error.is_retryable(),
            _ => false,
        }
    }

    /// Check if this error requires re-authentication.
    pub fn requires_reauth(&self) -> bool {
        match self {
            SessionError::Auth(err) => err.requires_reauth(),
            SessionError::WithContext { error, .. } => error.requires_reauth(),
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Network(err) => err.user_message(),
            SessionError::Auth(err) => err.user_message(),
            SessionError::Business(err) => err.user_message(),
            SessionError::System(err) => err.user_message(),
            SessionError::Config(err) => format!("Configuration error: {}", err),
            SessionError::WithContext { error, .. } => error.user_message(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Network(err) => err.error_code(),
            SessionError::Auth(err) => err.error_code(),
            SessionError::Business(err) => err.error_code(),
            SessionError::System(err) => err.error_code(),
            SessionError::Config(_) => "E_CONFIG",
            SessionError::WithContext { error, .. } => error.error_code(),
        }
    }

    /// Get the recovery hint for this error.
    ///
    /// Server-provided hints take precedence over the category default.
    pub fn recovery_hint(&self) -> String {
        let server_hint = match self.inner() {
            SessionError::Business(err) => err.recovery_hint.as_deref(),
            SessionError::Auth(err) => err.server_hint(),
            _ => None,
        };
        server_hint
            .map(str::to_string)
            .unwrap_or_else(|| self.category().recovery_hint().to_string())
    }

    /// Attach context to this error.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        SessionError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    /// Get the context if this error has one attached.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SessionError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the inner error without context.
    pub fn inner(&self) -> &SessionError {
        match self {
            SessionError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Network(err) => write!(f, "{}", err),
            SessionError::Auth(err) => write!(f, "{}", err),
            SessionError::Business(err) => write!(f, "{}", err),
            SessionError::System(err) => write!(f, "{}", err),
            SessionError::Config(err) => write!(f, "{}", err),
            SessionError::WithContext { error, context } => {
                write!(f, "{} ({})", error, context)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Network(err) => Some(err),
            SessionError::Auth(err) => Some(err),
            SessionError::Business(err) => Some(err),
            SessionError::System(err) => Some(err),
            SessionError::Config(err) => Some(err),
            SessionError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<NetworkError> for SessionError {
    fn from(err: NetworkError) -> Self {
        SessionError::Network(err)
    }
}

impl From<AuthError> for SessionError {
    fn from(err: AuthError) -> Self {
        SessionError::Auth(err)
    }
}

impl From<BusinessError> for SessionError {
    fn from(err: BusinessError) -> Self {
        SessionError::Business(err)
    }
}

impl From<SystemError> for SessionError {
    fn from(err: SystemError) -> Self {
        SessionError::System(err)
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::System(SystemError::InvalidResponse {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_http_status_category_follows_kind() {
        let client: SessionError = SystemError::http_status(404, "nope").into();
        assert_eq!(client.category(), ErrorCategory::Client);

        let server: SessionError = SystemError::http_status(503, "down").into();
        assert_eq!(server.category(), ErrorCategory::Server);
        assert!(!server.is_retryable());
    }

    #[test]
    fn test_business_hint_overrides_category_hint() {
        let err: SessionError = BusinessError {
            status: 200,
            code: Some("E1".to_string()),
            error_type: None,
            message: "Bad mapping".to_string(),
            detail: None,
            recovery_hint: Some("Re-upload the file".to_string()),
            data: None,
        }
        .into();
        assert_eq!(err.recovery_hint(), "Re-upload the file");

        let plain: SessionError = NetworkError::Cancelled.into();
        assert_eq!(plain.recovery_hint(), ErrorCategory::Network.recovery_hint());
    }

    #[test]
    fn test_with_context_preserves_classification() {
        let err: SessionError = NetworkError::Timeout {
            url: "/scan".to_string(),
            duration_secs: 120,
        }
        .into();
        let with_ctx = err.with_context(ErrorContext::new("request").with_retry_count(3));

        assert_eq!(with_ctx.category(), ErrorCategory::Network);
        assert!(with_ctx.is_retryable());
        assert_eq!(with_ctx.context().map(|c| c.retry_count), Some(3));
        assert!(matches!(with_ctx.inner(), SessionError::Network(_)));
        assert!(with_ctx.source().is_some());
    }

    #[test]
    fn test_reauth_only_for_auth_errors() {
        let auth: SessionError = AuthError::SessionExpired.into();
        assert!(auth.requires_reauth());
        assert_eq!(auth.category(), ErrorCategory::Auth);

        let http_401: SessionError = SystemError::http_status(401, "x").into();
        assert!(!http_401.requires_reauth());
    }

    #[test]
    fn test_json_error_is_invalid_response() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: SessionError = json_err.into();
        assert!(matches!(
            err,
            SessionError::System(SystemError::InvalidResponse { .. })
        ));
    }
}
