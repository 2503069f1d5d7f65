use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_OPEN_BASE_URL, DEFAULT_STALE_AFTER_SECS,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    #[serde(default)]
    pub token_cache: TokenCacheConfig,
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    pub metrics: MetricsConfig,
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenCacheConfig {
    /// seconds after a successful refresh before the access token is fetched again.
    /// invariant: > 0 and at most the 7200s validity the platform declares
    #[serde(default = "default_stale_after_seconds")]
    pub stale_after_seconds: u64,
    /// hand out the previous access token when every refresh attempt failed
    #[serde(default)]
    pub serve_stale_on_failure: bool,
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            stale_after_seconds: DEFAULT_STALE_AFTER_SECS,
            serve_stale_on_failure: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// max delay for retrying
    /// invariant: >= base_delay_ms.
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_open_base_url")]
    pub open_base_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            api_base_url: default_api_base_url(),
            open_base_url: default_open_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_stale_after_seconds() -> u64 {
    DEFAULT_STALE_AFTER_SECS
}

fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_open_base_url() -> String {
    DEFAULT_OPEN_BASE_URL.to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
