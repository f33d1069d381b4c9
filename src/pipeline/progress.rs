//! Per-request progress and ETA accounting.

use std::time::Instant;

/// Tracks completed items against elapsed wall time to derive a running
/// per-item average and an ETA for the remainder.
///
/// Advisory telemetry only; never used for scheduling decisions.
#[derive(Debug)]
pub struct ProgressTracker {
    started: Instant,
    total: usize,
    completed: usize,
}

impl ProgressTracker {
    /// Starts tracking a batch of `total` items.
    pub fn new(total: usize) -> Self {
        Self {
            started: Instant::now(),
            total,
            completed: 0,
        }
    }

    /// Records one completed item.
    pub fn record_done(&mut self) {
        self.completed += 1;
    }

    /// Number of completed items.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Average wall time per completed item in milliseconds, or zero
    /// before anything completed.
    pub fn average_ms(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.started.elapsed().as_secs_f64() * 1000.0 / self.completed as f64
    }

    /// Estimated remaining time: the running average times the remaining
    /// item count.
    pub fn eta_ms(&self) -> u64 {
        let remaining = self.total.saturating_sub(self.completed);
        (self.average_ms() * remaining as f64) as u64
    }

    /// `completed/total` label for log lines.
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.completed, self.total)
    }
}
