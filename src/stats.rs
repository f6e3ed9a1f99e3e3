//! Fire-and-forget usage counters and timing histograms.
//!
//! The sink sees only monotonically-growing counters and timing samples;
//! it must be thread-safe but never feeds back into conversion, so every
//! recording path swallows failure.

use std::collections::HashMap;
use std::sync::Mutex;

/// Process-wide telemetry sink. Timing names ending in `x1000` carry
/// values pre-multiplied by 1000 so integer averages keep three digits of
/// precision.
pub trait StatsSink: Send + Sync {
    fn increment_count_by(&self, name: &str, amount: u64);
    fn update_timing(&self, name: &str, value: u64);

    fn increment_count(&self, name: &str) {
        self.increment_count_by(name, 1);
    }
}

/// Sink that drops everything. The default when the host exports no
/// telemetry.
#[derive(Debug, Default)]
pub struct NullStats;

impl StatsSink for NullStats {
    fn increment_count_by(&self, _name: &str, _amount: u64) {}
    fn update_timing(&self, _name: &str, _value: u64) {}
}

/// In-memory sink. Hosts flush it on their own schedule; tests assert on
/// it directly.
#[derive(Debug, Default)]
pub struct RecordingStats {
    counts: Mutex<HashMap<String, u64>>,
    timings: Mutex<HashMap<String, Vec<u64>>>,
}

impl RecordingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, name: &str) -> u64 {
        self.counts
            .lock()
            .map(|counts| counts.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn timings(&self, name: &str) -> Vec<u64> {
        self.timings
            .lock()
            .map(|timings| timings.get(name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl StatsSink for RecordingStats {
    fn increment_count_by(&self, name: &str, amount: u64) {
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(name.to_string()).or_insert(0) += amount;
        }
    }

    fn update_timing(&self, name: &str, value: u64) {
        if let Ok(mut timings) = self.timings.lock() {
            timings.entry(name.to_string()).or_default().push(value);
        }
    }
}
