//! Request telemetry
//!
//! Lock-free counters fed by the request logging middleware and reported
//! through `/v1/stats`.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct RequestTelemetry {
    total_requests: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    total_latency_us: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct TelemetryStats {
    pub total_requests: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub avg_latency_ms: f64,
}

impl RequestTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, status: u16, latency: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);

        match status {
            400..=499 => {
                self.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total = self.total_requests.load(Ordering::Relaxed);
        let latency_us = self.total_latency_us.load(Ordering::Relaxed);

        TelemetryStats {
            total_requests: total,
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                latency_us as f64 / total as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        assert_eq!(RequestTelemetry::new().get_stats(), TelemetryStats::default());
    }

    #[test]
    fn test_status_classes() {
        let telemetry = RequestTelemetry::new();
        telemetry.record(200, Duration::from_millis(2));
        telemetry.record(404, Duration::from_millis(4));
        telemetry.record(503, Duration::from_millis(6));

        let stats = telemetry.get_stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.client_errors, 1);
        assert_eq!(stats.server_errors, 1);
        assert!((stats.avg_latency_ms - 4.0).abs() < 1e-9);
    }
}
