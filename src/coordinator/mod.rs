//! Single-flight token refresh.
//!
//! One [`RefreshCoordinator`] per tab. It is the only caller of the refresh
//! endpoint. Callers that need a new token while a refresh is in flight (here
//! or, as announced over the sync channel, in a sibling tab) queue up and are
//! resumed together when it settles.
//!
//! ```text
//!            acquire / trigger_background
//!   Idle ─────────────────────────────────▶ Refreshing ──success/failure──▶ Idle
//!    │  ▲                                        ▲
//!    │  │ completed / failed / watchdog          │ watchdog with waiters
//!    ▼  │                                        │
//!   Observing ───────────────────────────────────┘
//!   (sibling announced `started`)
//! ```

mod state;
mod waiters;

pub use state::{RefreshState, Settlement};
pub use waiters::{WaiterId, WaiterOutcome, WaiterQueue};

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{Credential, TokenStore};
use crate::error::AuthError;
use crate::events::{EventBus, SessionEvent};
use crate::sync::{CrossContextSync, SyncMessage};
use crate::traits::TokenRefresher;

#[derive(Debug, Default)]
struct Inner {
    state: RefreshState,
    waiters: WaiterQueue,
    /// Identifies the refresh this tab is running; a settled refresh whose
    /// id no longer matches was superseded and its outcome is dropped.
    refresh_id: u64,
    watchdog_id: u64,
    watchdog: Option<JoinHandle<()>>,
    last_settlement: Option<Settlement>,
}

impl Inner {
    fn begin_refresh(&mut self) -> u64 {
        self.disarm_watchdog();
        self.state = RefreshState::Refreshing;
        self.refresh_id += 1;
        self.refresh_id
    }

    fn settle(&mut self, settlement: Settlement) {
        self.disarm_watchdog();
        self.state = RefreshState::Idle;
        self.refresh_id += 1;
        self.last_settlement = Some(settlement);
    }

    fn disarm_watchdog(&mut self) {
        self.watchdog_id += 1;
        if let Some(handle) = self.watchdog.take() {
            handle.abort();
        }
    }
}

/// Removes a waiter from the queue if its caller stops waiting.
struct WithdrawOnDrop<'a> {
    coordinator: &'a RefreshCoordinator,
    id: WaiterId,
}

impl Drop for WithdrawOnDrop<'_> {
    fn drop(&mut self) {
        if self.coordinator.lock().waiters.withdraw(self.id) {
            debug!("Waiter {} withdrawn", self.id);
        }
    }
}

/// The per-tab refresh state machine.
pub struct RefreshCoordinator {
    store: Arc<TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    sync: Arc<CrossContextSync>,
    events: EventBus,
    watchdog: Duration,
    inner: Mutex<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        sync: Arc<CrossContextSync>,
        events: EventBus,
        watchdog: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            refresher,
            sync,
            events,
            watchdog,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Feed sibling messages from the sync channel into this coordinator.
    ///
    /// The listener holds only a weak reference and stops once the
    /// coordinator is dropped.
    pub fn listen(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let weak = Arc::downgrade(self);
        self.sync.on_message(move |message| {
            let weak = Weak::clone(&weak);
            async move {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.handle_remote(message).await;
                }
            }
        })
    }

    pub fn state(&self) -> RefreshState {
        self.lock().state
    }

    /// How the most recent refresh cycle ended.
    pub fn last_settlement(&self) -> Option<Settlement> {
        self.lock().last_settlement
    }

    /// Number of callers waiting for the current refresh.
    pub fn pending_waiters(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Get a usable access token after the current one was rejected.
    ///
    /// `rejected_token` is the token the server refused. If the store already
    /// holds a different one, another caller refreshed in the meantime and it
    /// is returned immediately. Otherwise the caller joins the waiter queue,
    /// starting a refresh if none is in flight.
    ///
    /// Dropping the returned future withdraws the caller without affecting
    /// the refresh or other waiters.
    pub async fn acquire(self: &Arc<Self>, rejected_token: Option<&str>) -> WaiterOutcome {
        let (id, rx, started) = {
            let mut inner = self.lock();

            let Some(credential) = self.store.get() else {
                return Err(AuthError::NotAuthenticated);
            };
            if let Some(rejected) = rejected_token {
                if credential.access_token != rejected {
                    debug!("Rejected token is stale, using the current one");
                    return Ok(credential.access_token);
                }
            }

            if inner.state == RefreshState::Idle && credential.refresh_token.is_empty() {
                return Err(AuthError::NotAuthenticated);
            }

            let (id, rx) = inner.waiters.enqueue();
            let started = match inner.state {
                RefreshState::Idle => Some((inner.begin_refresh(), credential.refresh_token)),
                state => {
                    debug!("Refresh already {}, queued waiter {}", state, id);
                    None
                }
            };
            (id, rx, started)
        };

        if let Some((refresh_id, refresh_token)) = started {
            self.spawn_refresh(refresh_id, refresh_token);
        }

        let _withdraw = WithdrawOnDrop {
            coordinator: self,
            id,
        };
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::RefreshFailed {
                message: "refresh abandoned".to_string(),
            }),
        }
    }

    /// Start a refresh without waiting for it, unless one is already in
    /// flight here or in a sibling. Returns whether a refresh was started.
    pub fn trigger_background(self: &Arc<Self>) -> bool {
        let started = {
            let mut inner = self.lock();
            if inner.state.is_busy() {
                return false;
            }
            let Some(refresh_token) = self.store.refresh_token() else {
                return false;
            };
            (inner.begin_refresh(), refresh_token)
        };

        debug!("Starting background token refresh");
        self.spawn_refresh(started.0, started.1);
        true
    }

    /// Apply a message announced by a sibling tab.
    pub async fn handle_remote(self: &Arc<Self>, message: SyncMessage) {
        match message {
            SyncMessage::Started => self.on_remote_started(),
            SyncMessage::Completed {
                access_token,
                refresh_token,
            } => self.on_remote_completed(access_token, refresh_token).await,
            SyncMessage::Failed => self.on_remote_failed().await,
        }
    }

    fn on_remote_started(self: &Arc<Self>) {
        let mut inner = self.lock();
        match inner.state {
            RefreshState::Idle => {
                info!("Sibling started a token refresh, observing");
                inner.state = RefreshState::Observing;
                self.arm_watchdog(&mut inner);
            }
            RefreshState::Observing => {
                debug!("Sibling refresh still running, re-arming watchdog");
                self.arm_watchdog(&mut inner);
            }
            RefreshState::Refreshing => {
                debug!("Ignoring sibling refresh start while refreshing");
            }
        }
    }

    async fn on_remote_completed(&self, access_token: String, refresh_token: Option<String>) {
        let signed_in = match self.store.get() {
            Some(current) => {
                if current.access_token != access_token {
                    let refresh_token = refresh_token.unwrap_or(current.refresh_token);
                    self.store
                        .set(Credential::new(access_token.clone(), refresh_token))
                        .await;
                    info!("Adopted access token refreshed by a sibling");
                    self.events.emit(SessionEvent::TokenRefreshed);
                }
                true
            }
            None => false,
        };

        let mut inner = self.lock();
        match inner.state {
            RefreshState::Idle => debug!("Sibling completion while idle, nothing waiting"),
            state if !signed_in => {
                inner.settle(Settlement::Failed);
                let rejected = inner.waiters.reject_all(&AuthError::NotAuthenticated);
                debug!(
                    "Sibling refresh completed while {} and signed out, rejected {} waiters",
                    state, rejected
                );
            }
            state => {
                if state == RefreshState::Refreshing {
                    info!("Sibling refresh completed first, dropping our own");
                }
                inner.settle(Settlement::Succeeded);
                let resumed = inner.waiters.resolve_all(&access_token);
                debug!("Resumed {} waiters with sibling's token", resumed);
            }
        }
    }

    async fn on_remote_failed(&self) {
        let rejected = {
            let mut inner = self.lock();
            if inner.state != RefreshState::Observing {
                debug!("Ignoring sibling refresh failure while {}", inner.state);
                return;
            }
            inner.settle(Settlement::Failed);
            inner.waiters.reject_all(&AuthError::RefreshFailed {
                message: "token refresh failed in another session".to_string(),
            })
        };

        warn!(
            "Sibling token refresh failed, ending session ({} waiters rejected)",
            rejected
        );
        self.store.clear().await;
        self.events.emit(SessionEvent::ReauthenticationRequired {
            reason: "token refresh failed in another session".to_string(),
        });
    }

    fn arm_watchdog(self: &Arc<Self>, inner: &mut Inner) {
        inner.disarm_watchdog();
        let watchdog_id = inner.watchdog_id;
        let weak = Arc::downgrade(self);
        let duration = self.watchdog;
        inner.watchdog = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(coordinator) = weak.upgrade() {
                coordinator.on_watchdog(watchdog_id);
            }
        }));
    }

    fn on_watchdog(self: &Arc<Self>, watchdog_id: u64) {
        let restart = {
            let mut inner = self.lock();
            if inner.watchdog_id != watchdog_id || inner.state != RefreshState::Observing {
                return;
            }
            inner.watchdog = None;
            warn!(
                "No word from sibling refresh after {:?}, resetting",
                self.watchdog
            );
            inner.state = RefreshState::Idle;

            if inner.waiters.is_empty() {
                None
            } else {
                match self.store.refresh_token() {
                    Some(refresh_token) => Some((inner.begin_refresh(), refresh_token)),
                    None => {
                        inner.waiters.reject_all(&AuthError::NotAuthenticated);
                        None
                    }
                }
            }
        };

        if let Some((refresh_id, refresh_token)) = restart {
            info!("Refreshing locally for waiters stranded by the sibling");
            self.spawn_refresh(refresh_id, refresh_token);
        }
    }

    fn spawn_refresh(self: &Arc<Self>, refresh_id: u64, refresh_token: String) {
        self.sync.announce(&SyncMessage::Started);
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.run_refresh(refresh_id, refresh_token).await;
        });
    }

    async fn run_refresh(&self, refresh_id: u64, refresh_token: String) {
        info!("Refreshing access token");
        let outcome =
            match tokio::time::timeout(self.watchdog, self.refresher.refresh(&refresh_token)).await
            {
                Ok(Ok(tokens)) => Ok(tokens),
                Ok(Err(e)) => Err(AuthError::RefreshFailed {
                    message: e.to_string(),
                }),
                Err(_) => Err(AuthError::RefreshTimedOut {
                    after_secs: self.watchdog.as_secs(),
                }),
            };

        if !self.is_current(refresh_id) {
            debug!("Refresh {} was superseded, dropping its outcome", refresh_id);
            return;
        }

        match outcome {
            Ok(tokens) => {
                let current = match self.store.get() {
                    Some(current) if current.refresh_token == refresh_token => current,
                    Some(current) => {
                        let mut inner = self.lock();
                        inner.settle(Settlement::Succeeded);
                        inner.waiters.resolve_all(&current.access_token);
                        info!("Signed in again during refresh, discarding new tokens");
                        return;
                    }
                    None => {
                        let mut inner = self.lock();
                        inner.settle(Settlement::Failed);
                        inner.waiters.reject_all(&AuthError::NotAuthenticated);
                        info!("Signed out during refresh, discarding new tokens");
                        return;
                    }
                };
                let credential = current.rotated(&tokens);
                self.store.set(credential.clone()).await;

                let resumed = {
                    let mut inner = self.lock();
                    inner.settle(Settlement::Succeeded);
                    inner.waiters.resolve_all(&credential.access_token)
                };
                self.sync.announce(&SyncMessage::Completed {
                    access_token: credential.access_token,
                    refresh_token: Some(credential.refresh_token),
                });
                self.events.emit(SessionEvent::TokenRefreshed);
                info!("Access token refreshed, {} waiting requests resumed", resumed);
            }
            Err(error) => {
                warn!("Token refresh failed: {}", error);
                self.store.clear().await;
                let rejected = {
                    let mut inner = self.lock();
                    inner.settle(Settlement::Failed);
                    inner.waiters.reject_all(&error)
                };
                self.sync.announce(&SyncMessage::Failed);
                self.events.emit(SessionEvent::ReauthenticationRequired {
                    reason: error.to_string(),
                });
                debug!("{} waiting requests rejected", rejected);
            }
        }
    }

    fn is_current(&self, refresh_id: u64) -> bool {
        let inner = self.lock();
        inner.state == RefreshState::Refreshing && inner.refresh_id == refresh_id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("RefreshCoordinator")
            .field("state", &inner.state)
            .field("waiters", &inner.waiters.len())
            .finish()
    }
}
