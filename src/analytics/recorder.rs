//! Analytics Recorder
//!
//! Fixed-capacity ring buffer of recently tracked events, kept in memory for
//! local inspection. Nothing is sent over the network.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Number of events kept unless configured otherwise
pub const DEFAULT_CAPACITY: usize = 100;

// == Analytics Event ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

// == Analytics Recorder ==
/// Keeps the most recent `capacity` events, dropping the oldest first.
#[derive(Debug)]
pub struct AnalyticsRecorder {
    events: VecDeque<AnalyticsEvent>,
    capacity: usize,
}

impl Default for AnalyticsRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AnalyticsRecorder {
    /// Creates an empty recorder. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    // == Track ==
    /// Records an event stamped with the current time.
    pub fn track(&mut self, name: impl Into<String>, properties: Option<Map<String, Value>>) {
        let event = AnalyticsEvent {
            name: name.into(),
            properties,
            timestamp: Utc::now(),
        };
        debug!(event = %event.name, "Tracked analytics event");

        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    // == Events ==
    /// Returns a copy of the buffered events, oldest first.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
