//! Result type alias for session operations.

use super::context::ErrorContext;
use super::session_error::SessionError;

/// Type alias for Results using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;

/// Extension trait for Result types to add context to errors.
pub trait ResultExt<T> {
    /// Add context to an error if the result is Err.
    fn context(self, ctx: ErrorContext) -> SessionResult<T>;

    /// Add context using a closure (only called on error).
    fn with_context<F>(self, f: F) -> SessionResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<SessionError>,
{
    fn context(self, ctx: ErrorContext) -> SessionResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F>(self, f: F) -> SessionResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
