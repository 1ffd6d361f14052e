//! Chat Client Core - the layer between a chat UI and its backend
//!
//! Provides a TTL cache with background sweep, a retry executor with
//! backoff, an incremental chat stream reader and an in-memory analytics
//! buffer.

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod retry;
pub mod stream;
pub mod tasks;

pub use config::Config;
pub use context::AppContext;
pub use error::{ClientError, Result};
pub use tasks::spawn_sweep_task;
