//! Response DTOs for the chat backend
//!
//! Defines the shape of each object in the streamed response body.

use serde::{Deserialize, Serialize};

/// One incremental unit of the assistant's streamed answer.
///
/// Only `chunk` and `done` are always meaningful; the rest carry tool and
/// status metadata when the backend has any. An `error` value is an
/// application-level failure reported in-band; the stream itself stays open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Text delta, possibly empty
    #[serde(default)]
    pub chunk: String,
    /// Whether this is the final chunk of the answer
    #[serde(default)]
    pub done: bool,
    /// Tool currently running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Tools used while producing the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Free-form progress status, e.g. "searching"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl StreamChunk {
    /// Creates a text chunk.
    pub fn text(chunk: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            ..Self::default()
        }
    }

    /// Whether the backend reported an application-level error in this chunk.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
