//! Daily alert rollups
//!
//! Compacts a UTC calendar day's alert records into per-(service, type,
//! severity) aggregates. Rollups are upserted by key, so re-running a day
//! overwrites prior values instead of double-counting.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::alerts::{AlertType, Severity};

use super::alerts::{AlertStore, StoreError};

/// Unique rollup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SummaryKey {
    pub date: NaiveDate,
    pub service: String,
    pub alert_type: AlertType,
    pub severity: Severity,
}

/// Per-day, per-(service, type, severity) aggregate
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub date: NaiveDate,
    pub service: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub total_alerts: usize,
    pub resolved_alerts: usize,
    pub unresolved_alerts: usize,
    /// Duration aggregates cover resolved alerts only; unresolved alerts
    /// contribute nothing rather than a zero.
    pub total_duration_seconds: i64,
    pub min_duration_seconds: Option<i64>,
    pub max_duration_seconds: Option<i64>,
    pub avg_duration_seconds: Option<f64>,
}

impl AlertSummary {
    pub fn key(&self) -> SummaryKey {
        SummaryKey {
            date: self.date,
            service: self.service.clone(),
            alert_type: self.alert_type,
            severity: self.severity,
        }
    }
}

/// Generates daily rollups against the alert store
pub struct SummaryAggregator {
    store: Arc<AlertStore>,
}

impl SummaryAggregator {
    pub fn new(store: Arc<AlertStore>) -> Self {
        Self { store }
    }

    /// Roll up every alert created during the UTC calendar day containing
    /// `at`. Idempotent: a second run for the same day produces identical
    /// stored rows. Returns the number of rollups written.
    pub fn generate_daily_summaries(&self, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let date = at.date_naive();
        let day_start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        let day_end = day_start + chrono::Duration::days(1);

        let alerts = self.store.alerts_between(day_start, day_end);

        let mut groups: HashMap<SummaryKey, Vec<Option<i64>>> = HashMap::new();
        for alert in &alerts {
            let key = SummaryKey {
                date,
                service: alert.service.clone(),
                alert_type: alert.alert_type,
                severity: alert.severity,
            };
            groups.entry(key).or_default().push(alert.duration_seconds);
        }

        let written = groups.len();
        for (key, durations) in groups {
            let total_alerts = durations.len();
            let resolved: Vec<i64> = durations.iter().filter_map(|d| *d).collect();
            let resolved_alerts = resolved.len();
            let total_duration_seconds: i64 = resolved.iter().sum();

            let summary = AlertSummary {
                date: key.date,
                service: key.service,
                alert_type: key.alert_type,
                severity: key.severity,
                total_alerts,
                resolved_alerts,
                unresolved_alerts: total_alerts - resolved_alerts,
                total_duration_seconds,
                min_duration_seconds: resolved.iter().min().copied(),
                max_duration_seconds: resolved.iter().max().copied(),
                avg_duration_seconds: if resolved_alerts > 0 {
                    Some(total_duration_seconds as f64 / resolved_alerts as f64)
                } else {
                    None
                },
            };
            self.store.upsert_summary(summary);
        }

        tracing::info!(%date, rollups = written, alerts = alerts.len(), "Daily summaries generated");
        Ok(written)
    }
}
