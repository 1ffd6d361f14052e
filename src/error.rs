//! Error types for the chat client core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Client Error Enum ==
/// Unified error type for network calls and stream ingestion.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection refused, dropped mid-body, DNS failure and the like
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A line of the response stream was not a valid chunk
    #[error("Malformed stream line ({reason}): {line}")]
    Parse { line: String, reason: String },

    /// No bytes arrived within the configured inactivity window
    #[error("Stream timed out after {0:?} without data")]
    Timeout(std::time::Duration),

    /// A request body could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Returns the HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// == reqwest Conversion ==
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ClientError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            };
        }
        ClientError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the chat client core.
pub type Result<T> = std::result::Result<T, ClientError>;
