//! Per-path request statistics.
//!
//! At most [`MAX_TRACKED_PATHS`] paths are tracked one by one; requests for
//! any further path are folded into the [`OVERFLOW_PATH`] record.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

pub const MAX_TRACKED_PATHS: usize = 1024;

/// Url of the record collecting paths past [`MAX_TRACKED_PATHS`].
pub const OVERFLOW_PATH: &str = "*";

/// Aggregated timings of every request seen for one path, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestAnalysis {
    pub url: String,
    pub count: u64,
    pub total_time: u64,
    pub avg_time: u64,
    pub max_time: u64,
    pub min_time: u64,
}

impl RequestAnalysis {
    fn new(url: &str) -> Self {
        Self { url: url.to_owned(), count: 0, total_time: 0, avg_time: 0, max_time: 0, min_time: u64::MAX }
    }

    fn add(&mut self, elapsed_ms: u64) {
        self.count += 1;
        self.total_time = self.total_time.saturating_add(elapsed_ms);
        self.avg_time = self.total_time / self.count;
        self.max_time = self.max_time.max(elapsed_ms);
        self.min_time = self.min_time.min(elapsed_ms);
    }
}

/// Collects [`RequestAnalysis`] records, shared between connections.
#[derive(Debug, Default)]
pub struct RequestMonitor {
    requests: Mutex<HashMap<String, RequestAnalysis>>,
}

impl RequestMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, path: &str, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(analysis) = requests.get_mut(path) {
            analysis.add(elapsed_ms);
            return;
        }

        let path = if requests.len() < MAX_TRACKED_PATHS { path } else { OVERFLOW_PATH };
        requests.entry(path.to_owned()).or_insert_with(|| RequestAnalysis::new(path)).add(elapsed_ms);
    }

    /// Current records ordered by path.
    pub fn snapshot(&self) -> Vec<RequestAnalysis> {
        let requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot = requests.values().cloned().collect::<Vec<_>>();
        snapshot.sort_by(|a, b| a.url.cmp(&b.url));
        snapshot
    }
}
