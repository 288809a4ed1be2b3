//! Search and loading configuration.

use std::time::Duration;

use crate::fuzzy::DEFAULT_THRESHOLD;

/// Configuration parameters for timetable search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Minimum Jaro-Winkler similarity for a name to match a query.
    /// Prefix matches qualify regardless.
    pub threshold: f64,

    /// Number of stops that must be decoded before the first results
    /// are served.
    pub initial_batch: usize,

    /// How often partial-load observers poll the store (milliseconds).
    pub poll_interval_ms: u64,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(threshold: f64, initial_batch: usize, poll_interval_ms: u64) -> Self {
        Self {
            threshold,
            initial_batch,
            poll_interval_ms,
        }
    }

    /// Returns the poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            initial_batch: 100,
            poll_interval_ms: 50,
        }
    }
}
