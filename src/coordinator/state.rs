//! Refresh state machine states.

use std::fmt;

/// Where a tab stands with respect to token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    /// No refresh known to be in flight.
    #[default]
    Idle,
    /// This tab is calling the refresh endpoint.
    Refreshing,
    /// Another tab announced a refresh; this tab waits for its outcome.
    Observing,
}

impl RefreshState {
    /// Whether new callers must queue instead of starting a refresh.
    pub fn is_busy(&self) -> bool {
        !matches!(self, RefreshState::Idle)
    }
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshState::Idle => write!(f, "idle"),
            RefreshState::Refreshing => write!(f, "refreshing"),
            RefreshState::Observing => write!(f, "observing"),
        }
    }
}

/// How a refresh cycle ended, reported on the way back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Succeeded,
    Failed,
}
