//! Application Context
//!
//! Owns every long-lived component of the client core. Construct one at
//! start-up, hand clones of its parts to whoever needs them, and call
//! [`AppContext::shutdown`] on the way out.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::analytics::{AnalyticsRecorder, SharedAnalytics};
use crate::api::ApiClient;
use crate::cache::{SharedCache, TtlCache};
use crate::config::Config;
use crate::stream::StreamReader;
use crate::tasks::spawn_sweep_task;

/// Explicitly constructed replacement for process-wide singletons.
#[derive(Debug)]
pub struct AppContext {
    /// Response cache shared with the sweep task
    pub cache: SharedCache<String, Value>,
    pub analytics: SharedAnalytics,
    pub streams: StreamReader,
    pub api: ApiClient,
    sweep_handle: JoinHandle<()>,
}

impl AppContext {
    /// Builds all components from configuration and starts the cache sweep.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    /// Same as [`AppContext::from_config`] with a caller-provided HTTP client.
    pub fn with_http(http: reqwest::Client, config: &Config) -> Self {
        let cache: SharedCache<String, Value> =
            Arc::new(RwLock::new(TtlCache::new(config.default_ttl())));
        let analytics: SharedAnalytics =
            Arc::new(Mutex::new(AnalyticsRecorder::new(config.analytics_capacity)));

        let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval());
        let streams = StreamReader::from_config(http.clone(), config);
        let api = ApiClient::new(http, config, cache.clone()).with_analytics(analytics.clone());

        info!(base_url = %config.api_base_url, "Client context initialized");

        Self {
            cache,
            analytics,
            streams,
            api,
            sweep_handle,
        }
    }

    /// Whether the background sweep is still running.
    pub fn is_running(&self) -> bool {
        !self.sweep_handle.is_finished()
    }

    /// Stops background work. Components stay usable; only the sweep ends.
    pub async fn shutdown(self) {
        self.sweep_handle.abort();
        let _ = self.sweep_handle.await;
        info!("Client context shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_context_sweeps_shared_cache() {
        let config = Config {
            cache_sweep_interval: 10,
            ..Config::default()
        };
        let ctx = AppContext::from_config(&config);

        ctx.cache.write().await.set(
            "/sessions".to_string(),
            Value::from("stale"),
            Some(Duration::from_secs(1)),
        );
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert!(ctx.cache.read().await.is_empty());
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweep() {
        let ctx = AppContext::from_config(&Config::default());
        assert!(ctx.is_running());

        let cache = ctx.cache.clone();
        ctx.shutdown().await;

        // The aborted sweep task has released its reference.
        assert_eq!(Arc::strong_count(&cache), 1);
    }

    #[tokio::test]
    async fn test_analytics_capacity_from_config() {
        let config = Config {
            analytics_capacity: 5,
            ..Config::default()
        };
        let ctx = AppContext::from_config(&config);

        assert_eq!(ctx.analytics.lock().unwrap().capacity(), 5);
        ctx.shutdown().await;
    }
}
