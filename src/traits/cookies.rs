//! Cookie source abstraction.
//!
//! The cross-site-protection token is issued by the backend as a readable
//! cookie and echoed back in a header on mutating requests.

/// Read-only access to the cookies visible to the application.
pub trait CookieSource: Send + Sync {
    /// Value of the named cookie, already URL-decoded.
    fn cookie(&self, name: &str) -> Option<String>;
}

/// A cookie source that never has any cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCookies;

impl CookieSource for NoCookies {
    fn cookie(&self, _name: &str) -> Option<String> {
        None
    }
}
