//! Unified error handling for the session layer.
//!
//! # Error Categories
//!
//! | Category | Description | Handling |
//! |----------|-------------|----------|
//! | Network | No response received | Retried with linear backoff |
//! | Auth | 401 / refresh failure | Refresh and replay once, then terminal |
//! | Business | `success: false` envelope | Surfaced with code and hint |
//! | Client / Server | Unstructured 4xx / 5xx | Surfaced |
//! | System | Invalid body, storage | Surfaced |
//! | Configuration | Bad settings | Surfaced at startup |

mod auth;
mod business;
mod category;
mod context;
mod network;
mod result;
mod session_error;
mod system;

pub use auth::AuthError;
pub use business::BusinessError;
pub use category::ErrorCategory;
pub use context::ErrorContext;
pub use network::NetworkError;
pub use result::{ResultExt, SessionResult};
pub use session_error::SessionError;
pub use system::{HttpErrorKind, SystemError};
