//! Sliding-window request/error counters
//!
//! Feeds the threshold detector: callers record request outcomes as they
//! happen, and `summarize` produces an [`ErrorSummary`] over the configured
//! window. Counts are kept in coarse time buckets per service so the window
//! can be pruned cheaply.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::alerts::{ErrorSummary, ServiceErrorStats};

/// Bucket granularity in seconds
const BUCKET_SECS: i64 = 10;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    start_secs: i64,
    requests: u64,
    errors: u64,
}

/// Per-service windowed request/error counters
pub struct RequestMetrics {
    window: Duration,
    services: DashMap<String, Mutex<VecDeque<Bucket>>>,
}

impl RequestMetrics {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            services: DashMap::new(),
        }
    }

    /// Record one request outcome for a service
    pub fn record(&self, service: &str, is_error: bool) {
        let now_secs = Utc::now().timestamp();
        let bucket_start = now_secs - now_secs % BUCKET_SECS;

        let entry = self
            .services
            .entry(service.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut buckets = entry.lock();

        match buckets.back_mut() {
            Some(last) if last.start_secs == bucket_start => {
                last.requests += 1;
                if is_error {
                    last.errors += 1;
                }
            }
            _ => {
                buckets.push_back(Bucket {
                    start_secs: bucket_start,
                    requests: 1,
                    errors: if is_error { 1 } else { 0 },
                });
            }
        }

        // Prune buckets that fell out of the window
        let horizon = now_secs - self.window.as_secs() as i64;
        while buckets.front().map_or(false, |b| b.start_secs < horizon) {
            buckets.pop_front();
        }
    }

    /// Aggregate the current window into an error summary
    pub fn summarize(&self) -> ErrorSummary {
        let now_secs = Utc::now().timestamp();
        let horizon = now_secs - self.window.as_secs() as i64;

        let mut total_requests = 0u64;
        let mut total_errors = 0u64;
        let mut per_service = HashMap::new();

        for entry in self.services.iter() {
            let buckets = entry.value().lock();
            let mut requests = 0u64;
            let mut errors = 0u64;
            for bucket in buckets.iter().filter(|b| b.start_secs >= horizon) {
                requests += bucket.requests;
                errors += bucket.errors;
            }
            if requests == 0 {
                continue;
            }

            total_requests += requests;
            total_errors += errors;
            per_service.insert(
                entry.key().clone(),
                ServiceErrorStats {
                    requests,
                    errors,
                    error_rate_percent: errors as f64 / requests as f64 * 100.0,
                },
            );
        }

        ErrorSummary {
            total_requests,
            total_errors,
            error_rate_percent: if total_requests > 0 {
                total_errors as f64 / total_requests as f64 * 100.0
            } else {
                0.0
            },
            window_seconds: self.window.as_secs(),
            per_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_summarizes_to_zero() {
        let metrics = RequestMetrics::new(Duration::from_secs(300));
        let summary = metrics.summarize();
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.error_rate_percent, 0.0);
        assert!(summary.per_service.is_empty());
    }

    #[test]
    fn test_records_aggregate_per_service() {
        let metrics = RequestMetrics::new(Duration::from_secs(300));
        for i in 0..100 {
            metrics.record("api", i % 10 == 0); // 10% errors
        }
        for _ in 0..50 {
            metrics.record("web", false);
        }

        let summary = metrics.summarize();
        assert_eq!(summary.total_requests, 150);
        assert_eq!(summary.total_errors, 10);

        let api = &summary.per_service["api"];
        assert_eq!(api.requests, 100);
        assert_eq!(api.errors, 10);
        assert!((api.error_rate_percent - 10.0).abs() < f64::EPSILON);

        let web = &summary.per_service["web"];
        assert_eq!(web.errors, 0);
    }

    #[test]
    fn test_synthetic_error_rate_is_exact() {
        let metrics = RequestMetrics::new(Duration::from_secs(300));
        // 200k requests with a 6% synthetic error rate
        for i in 0..200_000u32 {
            metrics.record("api", i % 50 < 3);
        }

        let summary = metrics.summarize();
        assert_eq!(summary.total_requests, 200_000);
        assert_eq!(summary.total_errors, 12_000);
        assert!((summary.error_rate_percent - 6.0).abs() < 1e-9);
    }
}
