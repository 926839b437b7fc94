//! Error-rate threshold detection
//!
//! Decides whether an [`ErrorSummary`] sample should produce a new alert.
//! The cooldown is process-global and advisory: `last_fire` is updated the
//! moment the detector fires, before any persistence downstream, so a
//! failed store write still consumes the cooldown window.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::model::{ErrorSummary, Severity};

/// Threshold detector configuration
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Error-rate threshold as a fraction (0.05 = 5%)
    pub error_rate_threshold: f64,
    /// Minimum requests in the window for a statistically meaningful sample
    pub volume_threshold: u64,
    /// Minimum spacing between detector firings
    pub cooldown: Duration,
    /// Second, independent threshold above which alerts are critical
    pub critical_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            error_rate_threshold: 0.05,
            volume_threshold: 100_000,
            cooldown: Duration::from_secs(300),
            critical_threshold: 0.10,
        }
    }
}

/// Evaluates aggregate error-rate samples against configured thresholds
pub struct ThresholdDetector {
    config: DetectorConfig,
    last_fire: Mutex<Option<Instant>>,
}

impl ThresholdDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            last_fire: Mutex::new(None),
        }
    }

    /// Evaluate a sample. Returns the severity to alert at, or `None` if
    /// the sample does not qualify or the cooldown has not elapsed.
    pub fn evaluate(&self, summary: &ErrorSummary) -> Option<Severity> {
        if summary.total_requests < self.config.volume_threshold {
            return None;
        }
        if summary.error_rate_percent < self.config.error_rate_threshold * 100.0 {
            return None;
        }

        {
            let mut last_fire = self.last_fire.lock();
            if let Some(last) = *last_fire {
                if last.elapsed() < self.config.cooldown {
                    tracing::debug!(
                        error_rate = summary.error_rate_percent,
                        "Error rate over threshold but within cooldown, suppressing"
                    );
                    return None;
                }
            }
            *last_fire = Some(Instant::now());
        }

        Some(self.severity_for(summary.error_rate_percent))
    }

    /// Severity for a given error-rate percentage
    pub fn severity_for(&self, error_rate_percent: f64) -> Severity {
        if error_rate_percent >= self.config.critical_threshold * 100.0 {
            Severity::Critical
        } else {
            Severity::Warning
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
