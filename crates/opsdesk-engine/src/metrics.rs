//! In-process dispatch counters
//!
//! Counts every dispatched command, the failures among them, and keeps a
//! sliding window of recent response times.

use opsdesk_core::model::CommandLogSummary;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Number of recent response times averaged
pub const RESPONSE_WINDOW: usize = 100;

#[derive(Debug)]
pub struct DispatchMetrics {
    started: Instant,
    requests: AtomicU64,
    errors: AtomicU64,
    response_times: Mutex<VecDeque<u64>>,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSnapshot {
    pub request_count: u64,
    pub error_count: u64,
    /// Percentage of requests that did not succeed
    pub error_rate: f64,
    /// Mean over the last `RESPONSE_WINDOW` commands, in milliseconds
    pub avg_response_time: f64,
    /// Seconds since the counters started
    pub uptime: u64,
}

/// Command-log statistics as published by the metrics endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLogMetrics {
    pub total_commands: u64,
    pub recent_commands: u64,
    pub daily_commands: u64,
    pub successful_commands: u64,
    pub failed_commands: u64,
    pub success_rate: f64,
}

impl CommandLogMetrics {
    /// All-zero figures reported when the command log cannot be read
    pub fn unavailable() -> Self {
        Self {
            total_commands: 0,
            recent_commands: 0,
            daily_commands: 0,
            successful_commands: 0,
            failed_commands: 0,
            success_rate: 0.0,
        }
    }
}

impl From<CommandLogSummary> for CommandLogMetrics {
    fn from(summary: CommandLogSummary) -> Self {
        Self {
            total_commands: summary.total,
            recent_commands: summary.last_hour,
            daily_commands: summary.last_day,
            successful_commands: summary.successful,
            failed_commands: summary.failed,
            success_rate: summary.success_rate(),
        }
    }
}

/// Body of the monitoring endpoint's `data` field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub dispatch: DispatchSnapshot,
    pub database: CommandLogMetrics,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            response_times: Mutex::new(VecDeque::with_capacity(RESPONSE_WINDOW)),
        }
    }

    /// Record one finished command
    pub fn record(&self, duration_ms: u64, success: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut times) = self.response_times.lock() {
            if times.len() == RESPONSE_WINDOW {
                times.pop_front();
            }
            times.push_back(duration_ms);
        }
    }

    pub fn snapshot(&self) -> DispatchSnapshot {
        let request_count = self.requests.load(Ordering::Relaxed);
        let error_count = self.errors.load(Ordering::Relaxed);
        let error_rate = if request_count == 0 {
            0.0
        } else {
            error_count as f64 / request_count as f64 * 100.0
        };
        let avg_response_time = self
            .response_times
            .lock()
            .ok()
            .filter(|times| !times.is_empty())
            .map(|times| times.iter().sum::<u64>() as f64 / times.len() as f64)
            .unwrap_or(0.0);

        DispatchSnapshot {
            request_count,
            error_count,
            error_rate,
            avg_response_time,
            uptime: self.started.elapsed().as_secs(),
        }
    }

    /// Zero the counters and the response window
    pub fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        if let Ok(mut times) = self.response_times.lock() {
            times.clear();
        }
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_rates() {
        let metrics = DispatchMetrics::new();
        metrics.record(10, true);
        metrics.record(30, false);

        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 2);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.error_rate, 50.0);
        assert_eq!(snap.avg_response_time, 20.0);
    }

    #[test]
    fn test_window_keeps_last_hundred() {
        let metrics = DispatchMetrics::new();
        for _ in 0..RESPONSE_WINDOW {
            metrics.record(1_000, true);
        }
        for _ in 0..RESPONSE_WINDOW {
            metrics.record(2, true);
        }

        assert_eq!(metrics.snapshot().avg_response_time, 2.0);
        assert_eq!(metrics.snapshot().request_count, 2 * RESPONSE_WINDOW as u64);
    }

    #[test]
    fn test_reset() {
        let metrics = DispatchMetrics::new();
        metrics.record(5, false);
        metrics.reset();

        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 0);
        assert_eq!(snap.error_rate, 0.0);
        assert_eq!(snap.avg_response_time, 0.0);
    }

    #[test]
    fn test_report_flattens_dispatch_counters() {
        let report = MetricsReport {
            dispatch: DispatchMetrics::new().snapshot(),
            database: CommandLogSummary::default().into(),
        };
        let json = serde_json::to_value(report).unwrap();

        assert_eq!(json["requestCount"], 0);
        assert_eq!(json["database"]["successRate"], 100.0);
    }
}
