//! API Client
//!
//! One-shot JSON GETs against the chat backend, short-circuited by the TTL
//! cache and wrapped in the retry executor.

use serde_json::{Map, Value};
use tracing::debug;

use crate::analytics::SharedAnalytics;
use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::retry::{retry, Backoff, RetryOptions};

/// Client for idempotent GET-style backend calls.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    cache: SharedCache<String, Value>,
    analytics: Option<SharedAnalytics>,
    max_attempts: u32,
    retry_delay: std::time::Duration,
    backoff: Backoff,
}

impl ApiClient {
    /// Creates a client for `config.api_base_url` backed by `cache`.
    pub fn new(http: reqwest::Client, config: &Config, cache: SharedCache<String, Value>) -> Self {
        Self {
            http,
            base_url: config.api_base_url.clone(),
            api_token: config.api_token.clone(),
            cache,
            analytics: None,
            max_attempts: config.retry_max_attempts,
            retry_delay: config.retry_delay(),
            backoff: config.retry_backoff,
        }
    }

    /// Records an `api_retry` event for every retried call.
    pub fn with_analytics(mut self, analytics: SharedAnalytics) -> Self {
        self.analytics = Some(analytics);
        self
    }

    // == Fetch JSON ==
    /// Returns the JSON body at `path`, from cache when a fresh copy exists.
    ///
    /// Misses are fetched with retries (network failures and 5xx only) and
    /// cached with the cache's default TTL. Failed calls are not cached.
    pub async fn fetch_json(&self, path: &str) -> Result<Value> {
        if let Some(cached) = self.cache.write().await.get(path) {
            debug!(path, "API cache hit");
            return Ok(cached);
        }

        let url = format!("{}{}", self.base_url, path);
        let value = retry(|| self.get_once(&url), self.retry_options(path)).await?;

        self.cache
            .write()
            .await
            .set(path.to_string(), value.clone(), None);
        Ok(value)
    }

    /// Drops the cached response for `path`, if any.
    pub async fn invalidate(&self, path: &str) -> bool {
        self.cache.write().await.delete(path)
    }

    fn retry_options(&self, path: &str) -> RetryOptions<ClientError> {
        let options = RetryOptions::new()
            .max_attempts(self.max_attempts)
            .delay(self.retry_delay)
            .backoff(self.backoff);

        match &self.analytics {
            Some(analytics) => {
                let analytics = analytics.clone();
                let path = path.to_string();
                options.on_retry(move |attempt, err: &ClientError| {
                    let mut properties = Map::new();
                    properties.insert("path".to_string(), Value::from(path.clone()));
                    properties.insert("attempt".to_string(), Value::from(attempt));
                    properties.insert("error".to_string(), Value::from(err.to_string()));
                    if let Ok(mut recorder) = analytics.lock() {
                        recorder.track("api_retry", Some(properties));
                    }
                })
            }
            None => options,
        }
    }

    async fn get_once(&self, url: &str) -> Result<Value> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
