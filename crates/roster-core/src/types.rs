//! Record types and configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A record as exchanged with upstream and stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque identifier assigned by upstream.
    pub id: String,

    #[serde(rename = "employee_name")]
    pub name: String,

    #[serde(rename = "employee_salary")]
    pub salary: u64,

    #[serde(rename = "employee_age")]
    pub age: i32,

    #[serde(rename = "employee_title")]
    pub title: String,

    /// Upstream does not always return the email, so it may be missing.
    #[serde(rename = "employee_email", default)]
    pub email: Option<String>,
}

/// Body of the upstream create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInput {
    pub name: String,
    pub salary: u64,
    pub age: i32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Upstream response envelope: `{"status": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,

    pub data: Option<T>,
}

/// Body of the upstream delete call.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeleteRequest<'a> {
    pub name: &'a str,
}

/// Roster configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Base URL of the upstream record API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Cache server host.
    #[serde(default = "default_cache_host")]
    pub cache_host: String,

    /// Cache server port.
    #[serde(default = "default_cache_port")]
    pub cache_port: u16,

    /// Total attempts per upstream call (including the first).
    #[serde(default = "default_max_attempts")]
    pub retry_max_attempts: u32,

    /// Delay before the first retry, in milliseconds. Doubles per retry.
    #[serde(default = "default_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8112/api/v1/employee".to_string()
}

fn default_cache_host() -> String {
    "127.0.0.1".to_string()
}

fn default_cache_port() -> u16 {
    6379
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            cache_host: default_cache_host(),
            cache_port: default_cache_port(),
            retry_max_attempts: default_max_attempts(),
            retry_initial_delay_ms: default_initial_delay_ms(),
            timeout_secs: default_timeout(),
        }
    }
}

impl RosterConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `ROSTER_API_URL` | Upstream record API base URL |
    /// | `ROSTER_CACHE_HOST` | Cache server host |
    /// | `ROSTER_CACHE_PORT` | Cache server port |
    /// | `ROSTER_RETRY_MAX_ATTEMPTS` | Attempts per upstream call |
    /// | `ROSTER_RETRY_INITIAL_DELAY_MS` | First backoff delay |
    /// | `ROSTER_API_TIMEOUT` | Upstream request timeout (seconds) |
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("ROSTER_API_URL").unwrap_or_else(|_| default_api_url()),
            cache_host: std::env::var("ROSTER_CACHE_HOST")
                .unwrap_or_else(|_| default_cache_host()),
            cache_port: parse_env("ROSTER_CACHE_PORT").unwrap_or_else(default_cache_port),
            retry_max_attempts: parse_env("ROSTER_RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(default_max_attempts),
            retry_initial_delay_ms: parse_env("ROSTER_RETRY_INITIAL_DELAY_MS")
                .unwrap_or_else(default_initial_delay_ms),
            timeout_secs: parse_env("ROSTER_API_TIMEOUT").unwrap_or_else(default_timeout),
        }
    }

    /// Set the upstream base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the cache server address.
    pub fn with_cache(mut self, host: impl Into<String>, port: u16) -> Self {
        self.cache_host = host.into();
        self.cache_port = port;
        self
    }

    /// Set retry attempts and initial delay.
    pub fn with_retry(mut self, max_attempts: u32, initial_delay: Duration) -> Self {
        self.retry_max_attempts = max_attempts;
        self.retry_initial_delay_ms = initial_delay.as_millis() as u64;
        self
    }

    /// `host:port` of the cache server.
    pub fn cache_addr(&self) -> String {
        format!("{}:{}", self.cache_host, self.cache_port)
    }

    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
