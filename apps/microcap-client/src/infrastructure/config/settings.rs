//! Client Configuration Settings
//!
//! Configuration types for the client, loaded from environment variables.

use std::time::Duration;

/// Backend deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local backend on the developer machine.
    #[default]
    Development,
    /// Hosted production backend.
    Production,
}

impl Environment {
    /// Parse environment from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Backend origin used when no override is configured.
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::Development => "http://127.0.0.1:5001",
            Self::Production => "https://api.yourdomain.com",
        }
    }
}

/// Backoff policy for transient (5xx) responses.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: f64,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, without the `/api/v1` prefix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy.
    pub retry: RetryConfig,
}

impl ApiConfig {
    /// Settings for `base_url` with default timeout and retry policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// Realtime stream settings.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Streaming endpoint.
    pub url: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REALTIME_URL.to_string(),
        }
    }
}

/// Default streaming endpoint.
pub const DEFAULT_REALTIME_URL: &str = "wss://socket.polygon.io/stocks";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend deployment.
    pub environment: Environment,
    /// HTTP API settings.
    pub api: ApiConfig,
    /// Realtime stream settings.
    pub realtime: RealtimeConfig,
    /// Capacity of the session and feed event channels.
    pub event_capacity: usize,
    /// Identifier used by the binary to sign in when no token is stored.
    pub login_email: Option<String>,
}

impl ClientConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL override is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL override is set but empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("MICROCAP_ENV")
            .map(|s| Environment::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let base_url = match lookup("MICROCAP_API_BASE_URL") {
            Some(url) => non_empty("MICROCAP_API_BASE_URL", url)?,
            None => environment.default_base_url().to_string(),
        };

        let realtime_url = match lookup("MICROCAP_REALTIME_URL") {
            Some(url) => non_empty("MICROCAP_REALTIME_URL", url)?,
            None => DEFAULT_REALTIME_URL.to_string(),
        };

        let defaults = RetryConfig::default();
        let retry = RetryConfig {
            max_retries: parse_or(&lookup, "MICROCAP_RETRY_MAX_RETRIES", defaults.max_retries),
            initial_backoff: parse_millis_or(
                &lookup,
                "MICROCAP_RETRY_INITIAL_BACKOFF_MS",
                defaults.initial_backoff,
            ),
            multiplier: parse_multiplier_or(
                &lookup,
                "MICROCAP_RETRY_MULTIPLIER",
                defaults.multiplier,
            ),
            max_backoff: defaults.max_backoff,
        };

        let api = ApiConfig {
            base_url,
            timeout: parse_secs_or(&lookup, "MICROCAP_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT),
            retry,
        };

        let login_email = lookup("MICROCAP_LOGIN_EMAIL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            environment,
            api,
            realtime: RealtimeConfig { url: realtime_url },
            event_capacity: parse_or(
                &lookup,
                "MICROCAP_EVENT_CHANNEL_CAPACITY",
                DEFAULT_EVENT_CAPACITY,
            ),
            login_email,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(trimmed.to_string())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Backoff multipliers must be finite and at least 1.0.
fn parse_multiplier_or<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|m| m.is_finite() && *m >= 1.0)
        .unwrap_or(default)
}

fn parse_secs_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_millis_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
