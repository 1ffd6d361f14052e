//! Analytics Module
//!
//! In-process event recorder for local debugging.

mod recorder;

use std::sync::{Arc, Mutex};

pub use recorder::{AnalyticsEvent, AnalyticsRecorder, DEFAULT_CAPACITY};

/// Recorder handle shared between the components that track events
pub type SharedAnalytics = Arc<Mutex<AnalyticsRecorder>>;
