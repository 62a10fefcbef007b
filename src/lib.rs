//! Sessionlink - token lifecycle and cross-context session synchronization
//!
//! Keeps a bearer credential fresh for an API client that may run as
//! several concurrent contexts sharing one persisted credential. At most
//! one refresh is in flight per context, siblings learn about each other's
//! refreshes over a [`traits::SyncChannel`], and requests rejected with 401
//! are replayed once with the new token.

pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod session;
pub mod sync;
pub mod traits;

pub use auth::Credential;
pub use config::SessionConfig;
pub use coordinator::{RefreshCoordinator, RefreshState};
pub use error::{SessionError, SessionResult};
pub use events::SessionEvent;
pub use pipeline::RequestOptions;
pub use session::{Session, SessionBuilder};
pub use traits::Method;
