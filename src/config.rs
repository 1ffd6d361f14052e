//! Configuration Module
//!
//! Handles loading and managing client configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
use crate::retry::Backoff;

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the chat backend, without a trailing slash
    pub api_base_url: String,
    /// Path of the streaming chat endpoint
    pub chat_stream_path: String,
    /// Optional bearer token sent with every request
    pub api_token: Option<String>,
    /// Default TTL in seconds for cache entries without explicit TTL
    pub cache_default_ttl: u64,
    /// Background sweep interval in seconds
    pub cache_sweep_interval: u64,
    /// Total attempts allowed per retried call
    pub retry_max_attempts: u32,
    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
    /// Backoff strategy between retries
    pub retry_backoff: Backoff,
    /// Ring buffer capacity of the analytics recorder
    pub analytics_capacity: usize,
    /// Optional stream inactivity timeout in seconds, None = no timeout
    pub stream_idle_timeout: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_BASE_URL` - Backend base URL (default: http://localhost:8000)
    /// - `CHAT_STREAM_PATH` - Streaming endpoint path (default: /chat/stream)
    /// - `API_TOKEN` - Bearer token (default: unset)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `RETRY_MAX_ATTEMPTS` - Attempts per call (default: 3)
    /// - `RETRY_DELAY_MS` - Base retry delay (default: 1000)
    /// - `RETRY_BACKOFF` - `exponential` or `linear` (default: exponential)
    /// - `ANALYTICS_CAPACITY` - Recorder capacity (default: 100)
    /// - `STREAM_IDLE_TIMEOUT` - Inactivity timeout in seconds (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            chat_stream_path: env::var("CHAT_STREAM_PATH").unwrap_or(defaults.chat_stream_path),
            api_token: env::var("API_TOKEN").ok().filter(|v| !v.is_empty()),
            cache_default_ttl: parse_var::<u64>("CACHE_DEFAULT_TTL").unwrap_or(defaults.cache_default_ttl),
            cache_sweep_interval: parse_var::<u64>("CACHE_SWEEP_INTERVAL")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.cache_sweep_interval),
            retry_max_attempts: parse_var::<u32>("RETRY_MAX_ATTEMPTS")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.retry_max_attempts),
            retry_delay_ms: parse_var::<u64>("RETRY_DELAY_MS").unwrap_or(defaults.retry_delay_ms),
            retry_backoff: env::var("RETRY_BACKOFF")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_backoff),
            analytics_capacity: parse_var::<usize>("ANALYTICS_CAPACITY")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.analytics_capacity),
            stream_idle_timeout: parse_var::<u64>("STREAM_IDLE_TIMEOUT").filter(|v| *v > 0),
        }
    }

    /// Full URL of the streaming chat endpoint.
    pub fn chat_stream_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.chat_stream_path)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_default_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.stream_idle_timeout.map(Duration::from_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            chat_stream_path: "/chat/stream".to_string(),
            api_token: None,
            cache_default_ttl: DEFAULT_TTL.as_secs(),
            cache_sweep_interval: DEFAULT_SWEEP_INTERVAL.as_secs(),
            retry_max_attempts: 3,
            retry_delay_ms: 1000,
            retry_backoff: Backoff::Exponential,
            analytics_capacity: 100,
            stream_idle_timeout: None,
        }
    }
}
