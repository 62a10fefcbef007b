//! Session configuration.
//!
//! Every tunable of the session layer lives here: endpoints, the per-path
//! timeout table, refresh lead time, retry policy, watchdog and the
//! cross-site-protection cookie/header pair.

use regex::Regex;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for requests that match no timeout rule.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default window before expiry in which a background refresh starts.
pub const DEFAULT_REFRESH_LEAD_TIME: Duration = Duration::from_secs(5 * 60);

/// Default time a tab waits for a sibling's refresh before giving up on it.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(30);

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default unit of the linear retry backoff.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Paths that never carry a bearer token and never trigger a refresh.
const DEFAULT_UNAUTHENTICATED_PATHS: &[&str] = &["/auth/login", "/auth/refresh", "/health"];

/// Slow endpoints and their timeouts, in match order.
const DEFAULT_TIMEOUT_TABLE: &[(&str, u64)] = &[
    ("/scan", 120),
    ("/preview", 60),
    ("/ingest", 180),
    ("/dashboard", 45),
    ("/collection", 300),
    ("/mapping", 90),
    ("/data-sync/batch", 60),
    ("/data-sync/single", 120),
];

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("invalid timeout pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A path pattern and the timeout applied to requests matching it.
#[derive(Debug, Clone)]
pub struct TimeoutRule {
    pattern: Regex,
    timeout: Duration,
}

impl TimeoutRule {
    /// Build a rule from a regular expression.
    pub fn new(pattern: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern, timeout })
    }

    /// Build a rule matching a literal path fragment anywhere in the path.
    pub fn literal(fragment: &str, timeout: Duration) -> Self {
        Self {
            // An escaped literal is always a valid pattern.
            pattern: Regex::new(&regex::escape(fragment))
                .unwrap_or_else(|_| unreachable!("escaped literal")),
            timeout,
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// Configuration for a session.
///
/// Use the builder methods to customize it.
///
/// # Example
///
/// ```ignore
/// use sessionlink::config::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("https://app.example.com/api")
///     .with_max_retries(5)
///     .with_watchdog(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prefix joined to every relative request path
    pub base_url: String,
    /// Path of the refresh endpoint, relative to `base_url`
    pub refresh_path: String,
    /// Path fragments that never get a bearer token
    pub unauthenticated_paths: Vec<String>,
    /// Timeout for requests no rule matches
    pub default_timeout: Duration,
    /// Ordered timeout rules; the first match wins
    pub timeout_rules: Vec<TimeoutRule>,
    /// Refresh this long before the access token expires
    pub refresh_lead_time: Duration,
    /// Retries after the initial attempt for connection-level failures
    pub max_retries: u32,
    /// Retry `n` waits `n * retry_base_delay`
    pub retry_base_delay: Duration,
    /// How long a tab waits on a sibling's refresh
    pub watchdog: Duration,
    /// Cookie carrying the cross-site-protection token
    pub csrf_cookie_name: String,
    /// Header the cross-site-protection token is echoed in
    pub csrf_header_name: String,
    /// Override for the credentials file location
    pub credentials_path: Option<PathBuf>,
    /// Raw `Cookie` header used as the cookie source (CLI only)
    pub cookie_header: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            unauthenticated_paths: DEFAULT_UNAUTHENTICATED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            default_timeout: DEFAULT_TIMEOUT,
            timeout_rules: DEFAULT_TIMEOUT_TABLE
                .iter()
                .map(|(fragment, secs)| TimeoutRule::literal(fragment, Duration::from_secs(*secs)))
                .collect(),
            refresh_lead_time: DEFAULT_REFRESH_LEAD_TIME,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            watchdog: DEFAULT_WATCHDOG,
            csrf_cookie_name: "csrf_token".to_string(),
            csrf_header_name: "X-CSRF-Token".to_string(),
            credentials_path: None,
            cookie_header: None,
        }
    }
}

impl SessionConfig {
    /// Create a config with default values for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Replace the unauthenticated allow-list.
    pub fn with_unauthenticated_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unauthenticated_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Add a timeout rule ahead of the existing ones.
    pub fn with_timeout_rule(mut self, rule: TimeoutRule) -> Self {
        self.timeout_rules.insert(0, rule);
        self
    }

    /// Replace the whole timeout table.
    pub fn with_timeout_rules(mut self, rules: Vec<TimeoutRule>) -> Self {
        self.timeout_rules = rules;
        self
    }

    pub fn with_refresh_lead_time(mut self, lead_time: Duration) -> Self {
        self.refresh_lead_time = lead_time;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    pub fn with_csrf_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.csrf_cookie_name = name.into();
        self
    }

    pub fn with_csrf_header_name(mut self, name: impl Into<String>) -> Self {
        self.csrf_header_name = name.into();
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    /// Build a config from `SESSIONLINK_*` environment variables over the
    /// defaults.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `SESSIONLINK_BASE_URL` | base URL |
    /// | `SESSIONLINK_REFRESH_PATH` | refresh endpoint path |
    /// | `SESSIONLINK_TIMEOUT_SECS` | default timeout |
    /// | `SESSIONLINK_TIMEOUTS` | extra rules, `pattern=secs` comma separated |
    /// | `SESSIONLINK_REFRESH_LEAD_SECS` | refresh lead time |
    /// | `SESSIONLINK_MAX_RETRIES` | retries after the first attempt |
    /// | `SESSIONLINK_RETRY_BASE_MS` | backoff unit |
    /// | `SESSIONLINK_WATCHDOG_SECS` | sibling refresh watchdog |
    /// | `SESSIONLINK_CSRF_COOKIE` / `SESSIONLINK_CSRF_HEADER` | CSRF names |
    /// | `SESSIONLINK_CREDENTIALS_PATH` | credentials file |
    /// | `SESSIONLINK_COOKIE` | raw `Cookie` header |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = env_string("SESSIONLINK_BASE_URL") {
            config.base_url = url;
        }
        if let Some(path) = env_string("SESSIONLINK_REFRESH_PATH") {
            config.refresh_path = path;
        }
        if let Some(secs) = env_parse::<u64>("SESSIONLINK_TIMEOUT_SECS")? {
            config.default_timeout = Duration::from_secs(secs);
        }
        if let Some(rules) = env_string("SESSIONLINK_TIMEOUTS") {
            let mut rules = parse_timeout_rules(&rules)?;
            rules.append(&mut config.timeout_rules);
            config.timeout_rules = rules;
        }
        if let Some(secs) = env_parse::<u64>("SESSIONLINK_REFRESH_LEAD_SECS")? {
            config.refresh_lead_time = Duration::from_secs(secs);
        }
        if let Some(retries) = env_parse::<u32>("SESSIONLINK_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(ms) = env_parse::<u64>("SESSIONLINK_RETRY_BASE_MS")? {
            config.retry_base_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("SESSIONLINK_WATCHDOG_SECS")? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "SESSIONLINK_WATCHDOG_SECS".to_string(),
                    value: secs.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.watchdog = Duration::from_secs(secs);
        }
        if let Some(name) = env_string("SESSIONLINK_CSRF_COOKIE") {
            config.csrf_cookie_name = name;
        }
        if let Some(name) = env_string("SESSIONLINK_CSRF_HEADER") {
            config.csrf_header_name = name;
        }
        if let Some(path) = env_string("SESSIONLINK_CREDENTIALS_PATH") {
            config.credentials_path = Some(PathBuf::from(path));
        }
        if let Some(cookie) = env_string("SESSIONLINK_COOKIE") {
            config.cookie_header = Some(cookie);
        }

        Ok(config)
    }

    /// Timeout for `path`: the first matching rule, else the default.
    pub fn timeout_for(&self, path: &str) -> Duration {
        self.timeout_rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(TimeoutRule::timeout)
            .unwrap_or(self.default_timeout)
    }

    /// Whether `path` is on the unauthenticated allow-list.
    pub fn is_unauthenticated(&self, path: &str) -> bool {
        self.unauthenticated_paths
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
    }

    /// Absolute URL for `path`. Absolute inputs are returned unchanged.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Absolute URL of the refresh endpoint.
    pub fn refresh_url(&self) -> String {
        self.url_for(&self.refresh_path)
    }
}

/// Parse `pattern=secs` pairs separated by commas.
pub fn parse_timeout_rules(input: &str) -> Result<Vec<TimeoutRule>, ConfigError> {
    input.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (pattern, secs) = entry.rsplit_once('=').ok_or_else(|| ConfigError::InvalidValue {
                name: "SESSIONLINK_TIMEOUTS".to_string(),
                value: entry.to_string(),
                reason: "expected pattern=seconds".to_string(),
            })?;
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "SESSIONLINK_TIMEOUTS".to_string(),
                value: entry.to_string(),
                reason: "timeout is not a number of seconds".to_string(),
            })?;
            TimeoutRule::new(pattern.trim(), Duration::from_secs(secs))
        })
        .collect()
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
