//! Session facade.
//!
//! A [`Session`] is one execution context (one "tab"): its own token store,
//! refresh coordinator and request pipeline, optionally joined to sibling
//! sessions through a [`SyncChannel`].
//!
//! ```ignore
//! let session = Session::builder(SessionConfig::from_env()?).build().await?;
//! session.login(Credential::new(access, refresh)).await;
//! let items = session.get("/items").await?;
//! ```

use reqwest::cookie::Jar;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::adapters::{CookieJar, FileCredentialsProvider, ReqwestHttpClient, ResponseCookies};
use crate::auth::{Credential, RefreshClient, TokenStore};
use crate::config::SessionConfig;
use crate::coordinator::{RefreshCoordinator, RefreshState};
use crate::error::{ErrorContext, ResultExt, SessionResult, SystemError};
use crate::events::{EventBus, SessionEvent};
use crate::pipeline::{RequestOptions, RequestPipeline};
use crate::sync::CrossContextSync;
use crate::traits::{
    CookieSource, CredentialsProvider, HttpClient, Method, NoCookies, SyncChannel, TokenRefresher,
};

/// Assembles a [`Session`], defaulting every collaborator that is not set.
pub struct SessionBuilder {
    config: SessionConfig,
    http: Option<Arc<dyn HttpClient>>,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    sync: Option<Arc<dyn SyncChannel>>,
    cookies: Option<Arc<dyn CookieSource>>,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            http: None,
            credentials: None,
            refresher: None,
            sync: None,
            cookies: None,
        }
    }

    /// Defaults to [`ReqwestHttpClient`].
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Defaults to a credentials file, at `credentials_path` if configured.
    pub fn with_credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Defaults to [`RefreshClient`] against the configured refresh path.
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Without a channel the session coordinates only with itself.
    pub fn with_sync_channel(mut self, channel: Arc<dyn SyncChannel>) -> Self {
        self.sync = Some(channel);
        self
    }

    /// Defaults to the cookies the server sets on the default HTTP client,
    /// seeded with the configured cookie header.
    pub fn with_cookies(mut self, cookies: Arc<dyn CookieSource>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Wire everything up and load the persisted credential.
    pub async fn build(self) -> SessionResult<Session> {
        let config = Arc::new(self.config);

        // The default client keeps server-set cookies where the CSRF header
        // can read them, unless a cookie source was supplied.
        let (http, response_cookies): (Arc<dyn HttpClient>, Option<ResponseCookies>) =
            match self.http {
                Some(http) => (http, None),
                None => match (&self.cookies, Url::parse(&config.base_url)) {
                    (None, Ok(url)) => {
                        let jar = Arc::new(Jar::default());
                        let http = ReqwestHttpClient::with_cookie_store(Arc::clone(&jar))
                            .map_err(|e| SystemError::Other {
                                message: e.to_string(),
                            })?;
                        let cookies = ResponseCookies::new(jar, url);
                        if let Some(header) = &config.cookie_header {
                            cookies.seed(header);
                        }
                        (Arc::new(http), Some(cookies))
                    }
                    _ => (Arc::new(ReqwestHttpClient::new()), None),
                },
            };

        let credentials: Arc<dyn CredentialsProvider> = match self.credentials {
            Some(provider) => provider,
            None => match &config.credentials_path {
                Some(path) => Arc::new(FileCredentialsProvider::with_path(path)),
                None => Arc::new(
                    FileCredentialsProvider::new().map_err(|_| SystemError::NoHomeDirectory)?,
                ),
            },
        };

        let refresher: Arc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(RefreshClient::new(
                Arc::clone(&http),
                config.refresh_url(),
                config.timeout_for(&config.refresh_path),
            )),
        };

        let sync = Arc::new(match self.sync {
            Some(channel) => CrossContextSync::new(channel),
            None => CrossContextSync::disabled(),
        });

        let cookies: Arc<dyn CookieSource> = match (self.cookies, response_cookies) {
            (Some(cookies), _) => cookies,
            (None, Some(cookies)) => Arc::new(cookies),
            (None, None) => match &config.cookie_header {
                Some(header) => Arc::new(CookieJar::parse(header)),
                None => Arc::new(NoCookies),
            },
        };

        let store = Arc::new(TokenStore::new(credentials));
        if store.load().await.is_some() {
            debug!("Restored persisted credential");
        }

        let events = EventBus::new();
        let coordinator = RefreshCoordinator::new(
            Arc::clone(&store),
            refresher,
            Arc::clone(&sync),
            events.clone(),
            config.watchdog,
        );
        let listener = coordinator.listen();

        let pipeline = RequestPipeline::new(
            Arc::clone(&config),
            http,
            Arc::clone(&store),
            Arc::clone(&coordinator),
            cookies,
            events.clone(),
        );

        Ok(Session {
            config,
            store,
            coordinator,
            pipeline,
            sync,
            events,
            listener,
        })
    }
}

/// One execution context sharing credentials with its siblings.
pub struct Session {
    config: Arc<SessionConfig>,
    store: Arc<TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
    pipeline: RequestPipeline,
    sync: Arc<CrossContextSync>,
    events: EventBus,
    listener: Option<JoinHandle<()>>,
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Store a credential obtained by signing in.
    pub async fn login(&self, credential: Credential) {
        self.store.set(credential).await;
        info!("Signed in");
    }

    /// Drop the credential. A refresh in flight is discarded when it settles.
    pub async fn logout(&self) {
        self.store.clear().await;
        self.events.emit(SessionEvent::LoggedOut);
        info!("Signed out");
    }

    pub fn credential(&self) -> Option<Credential> {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.coordinator.state()
    }

    /// Whether sibling messages are being exchanged.
    pub fn is_synced(&self) -> bool {
        self.sync.is_connected()
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> SessionResult<Value> {
        self.pipeline.execute(method, path, body, options).await
    }

    /// Like [`Session::request`], deserializing the unwrapped payload.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> SessionResult<T> {
        let value = self
            .request(method, path, body, &RequestOptions::default())
            .await?;
        serde_json::from_value(value).with_context(|| {
            ErrorContext::new("decode response")
                .with_request(method.as_str(), self.config.url_for(path))
        })
    }

    pub async fn get(&self, path: &str) -> SessionResult<Value> {
        self.request(Method::Get, path, None, &RequestOptions::default())
            .await
    }

    pub async fn delete(&self, path: &str) -> SessionResult<Value> {
        self.request(Method::Delete, path, None, &RequestOptions::default())
            .await
    }

    pub async fn post(&self, path: &str, body: &Value) -> SessionResult<Value> {
        self.request(Method::Post, path, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn put(&self, path: &str, body: &Value) -> SessionResult<Value> {
        self.request(Method::Put, path, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> SessionResult<Value> {
        self.request(Method::Patch, path, Some(body), &RequestOptions::default())
            .await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
