//! Persisted alert store
//!
//! In-memory document store with a connect/close lifecycle. Owns every
//! mutation of persisted alerts: dedup-aware creation, bulk resolution by
//! fingerprint, acknowledgment, notification bookkeeping, filtered and
//! paginated query, and statistical aggregation. Alerts are never deleted
//! explicitly; the retention worker expires them past the configured
//! horizon.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::alerts::{
    service_down_fingerprint, Acknowledgment, Alert, AlertMetadata, AlertStatus, AlertType,
    ErrorSummary, NotificationRecord, ServiceStatus, Severity,
};

use super::query::{AlertQuery, QueryPage};
use super::summary::{AlertSummary, SummaryKey};

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Environment tag stamped onto every created alert
    pub environment: String,
    /// Alerts older than this many days are eligible for expiry
    pub retention_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            retention_days: 90,
        }
    }
}

/// Kind of service transition being persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceEvent {
    Down,
    Recovery,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Alert store connection is closed")]
    Closed,
}

/// Aggregate alert statistics
#[derive(Debug, Clone, Serialize)]
pub struct AlertStats {
    pub total: usize,
    pub by_severity: HashMap<String, usize>,
    pub by_status: HashMap<String, usize>,
    pub by_service: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    /// Mean firing duration over resolved alerts; `None` when nothing has
    /// resolved in the window.
    pub avg_resolution_seconds: Option<f64>,
    pub trend: Vec<TrendPoint>,
}

/// One day-bucketed point in the alert trend series
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub severity: Severity,
    pub count: usize,
}

/// In-memory alert store
pub struct AlertStore {
    alerts: RwLock<HashMap<String, Alert>>,
    summaries: RwLock<HashMap<SummaryKey, AlertSummary>>,
    config: StoreConfig,
    connected: AtomicBool,
}

impl AlertStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            alerts: RwLock::new(HashMap::new()),
            summaries: RwLock::new(HashMap::new()),
            config,
            connected: AtomicBool::new(true),
        }
    }

    /// Close the store; subsequent writes and queries fail with
    /// [`StoreError::Closed`].
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        tracing::info!("Alert store closed");
    }

    /// Liveness probe, independent of alert data
    pub fn health_check(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Persist an alert for a service up/down transition.
    ///
    /// Both event kinds share the down-type fingerprint, and any firing
    /// alert under that fingerprint is resolved before the new record is
    /// written, so at most one alert per fingerprint is ever firing. For
    /// recovery events this closes the paired down alert; the resolve and
    /// the insert are not transactional, which is an accepted best-effort
    /// window.
    pub fn create_service_alert(
        &self,
        status: &ServiceStatus,
        event: ServiceEvent,
    ) -> Result<Alert, StoreError> {
        self.ensure_connected()?;

        let fingerprint = service_down_fingerprint(&status.name);
        let resolved = self.resolve_by_fingerprint(&fingerprint, status.observed_at)?;
        if resolved > 0 {
            tracing::info!(
                service = %status.name,
                resolved,
                "Resolved firing alerts before writing transition"
            );
        }

        let (alert_type, severity, summary) = match event {
            ServiceEvent::Down => (
                AlertType::ServiceDown,
                Severity::Critical,
                match &status.error {
                    Some(error) => format!("Service {} is down: {}", status.name, error),
                    None => format!("Service {} is down", status.name),
                },
            ),
            ServiceEvent::Recovery => (
                AlertType::ServiceRecovery,
                Severity::Info,
                format!(
                    "Service {} recovered ({}ms)",
                    status.name, status.response_time_ms
                ),
            ),
        };

        let alert = Alert::new(
            fingerprint,
            alert_type,
            severity,
            &status.name,
            summary,
            &self.config.environment,
        )
        .with_timestamp(status.observed_at)
        .with_metadata(AlertMetadata {
            response_time_ms: Some(status.response_time_ms),
            ..Default::default()
        });

        self.alerts.write().insert(alert.id.clone(), alert.clone());
        tracing::info!(
            alert_id = %alert.id,
            service = %alert.service,
            alert_type = %alert.alert_type,
            "Alert created"
        );
        Ok(alert)
    }

    /// Persist a one-shot high-error-rate alert. Threshold alerts are not
    /// paired with a resolution event, so no fingerprint dedup is applied.
    pub fn create_threshold_alert(
        &self,
        summary: &ErrorSummary,
        severity: Severity,
    ) -> Result<Alert, StoreError> {
        self.ensure_connected()?;

        let fingerprint = crate::alerts::fingerprint(
            "requests",
            AlertType::HighErrorRate,
            &BTreeMap::new(),
        );

        let alert = Alert::new(
            fingerprint,
            AlertType::HighErrorRate,
            severity,
            "requests",
            format!(
                "Error rate {:.2}% over {} requests in the last {}s",
                summary.error_rate_percent, summary.total_requests, summary.window_seconds
            ),
            &self.config.environment,
        )
        .with_metadata(AlertMetadata {
            error_rate_percent: Some(summary.error_rate_percent),
            total_requests: Some(summary.total_requests),
            ..Default::default()
        });

        self.alerts.write().insert(alert.id.clone(), alert.clone());
        tracing::info!(
            alert_id = %alert.id,
            error_rate = summary.error_rate_percent,
            severity = %severity,
            "High error rate alert created"
        );
        Ok(alert)
    }

    /// Resolve every firing alert with the given fingerprint, setting
    /// `resolved_at` and the firing duration on each. Returns the number
    /// of alerts transitioned; zero matches is not an error, and calling
    /// again is a no-op.
    pub fn resolve_by_fingerprint(
        &self,
        fingerprint: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.ensure_connected()?;

        let mut alerts = self.alerts.write();
        let mut count = 0;
        for alert in alerts.values_mut() {
            if alert.status == AlertStatus::Firing && alert.fingerprint == fingerprint {
                alert.resolve(resolved_at);
                count += 1;
            }
        }
        Ok(count)
    }

    /// Record a per-channel delivery outcome against an alert. Creation is
    /// authoritative and this is best-effort bookkeeping: a missing alert
    /// is logged, not an error. Re-recording a channel overwrites its
    /// previous outcome.
    pub fn record_notification(
        &self,
        alert_id: &str,
        record: NotificationRecord,
    ) -> Result<(), StoreError> {
        self.ensure_connected()?;

        let mut alerts = self.alerts.write();
        match alerts.get_mut(alert_id) {
            Some(alert) => {
                if let Some(existing) = alert
                    .notifications
                    .iter_mut()
                    .find(|n| n.channel == record.channel)
                {
                    *existing = record;
                } else {
                    alert.notifications.push(record);
                }
            }
            None => {
                tracing::warn!(
                    alert_id,
                    channel = %record.channel,
                    "Notification outcome for unknown alert, skipping"
                );
            }
        }
        Ok(())
    }

    /// Set acknowledgment fields on an alert. Last write wins; no history
    /// is kept. Returns false if the alert does not exist.
    pub fn acknowledge(
        &self,
        alert_id: &str,
        by: &str,
        reason: Option<String>,
    ) -> Result<bool, StoreError> {
        self.ensure_connected()?;

        let mut alerts = self.alerts.write();
        match alerts.get_mut(alert_id) {
            Some(alert) => {
                alert.acknowledgment = Some(Acknowledgment {
                    acknowledged_by: by.to_string(),
                    acknowledged_at: Utc::now(),
                    reason,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Filtered, sorted, paginated query. `total` counts every match
    /// regardless of the page bounds.
    pub fn query(&self, query: &AlertQuery) -> Result<QueryPage, StoreError> {
        self.ensure_connected()?;

        let alerts = self.alerts.read();
        let mut matched: Vec<Alert> = alerts
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        let total = matched.len();

        matched.sort_by(|a, b| query.compare(a, b).then_with(|| a.id.cmp(&b.id)));

        let offset = query.offset.unwrap_or(0).min(matched.len());
        let mut page: Vec<Alert> = matched.split_off(offset);
        if let Some(limit) = query.limit {
            page.truncate(limit);
        }

        Ok(QueryPage {
            alerts: page,
            total,
        })
    }

    /// All firing alerts, newest first
    pub fn active_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        self.ensure_connected()?;

        let alerts = self.alerts.read();
        let mut firing: Vec<Alert> = alerts
            .values()
            .filter(|a| a.status == AlertStatus::Firing)
            .cloned()
            .collect();
        firing.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(firing)
    }

    /// Aggregate statistics over the optional date range
    pub fn stats(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<AlertStats, StoreError> {
        self.ensure_connected()?;

        let alerts = self.alerts.read();
        let in_range: Vec<&Alert> = alerts
            .values()
            .filter(|a| start.map_or(true, |s| a.timestamp >= s))
            .filter(|a| end.map_or(true, |e| a.timestamp <= e))
            .collect();

        let mut by_severity: HashMap<String, usize> = HashMap::new();
        let mut by_status: HashMap<String, usize> = HashMap::new();
        let mut by_service: HashMap<String, usize> = HashMap::new();
        let mut by_type: HashMap<String, usize> = HashMap::new();
        let mut trend: BTreeMap<(NaiveDate, Severity), usize> = BTreeMap::new();
        let mut resolved_total = 0i64;
        let mut resolved_count = 0usize;

        for alert in &in_range {
            *by_severity
                .entry(alert.severity.as_str().to_string())
                .or_default() += 1;
            let status = match alert.status {
                AlertStatus::Firing => "firing",
                AlertStatus::Resolved => "resolved",
            };
            *by_status.entry(status.to_string()).or_default() += 1;
            *by_service.entry(alert.service.clone()).or_default() += 1;
            *by_type
                .entry(alert.alert_type.as_str().to_string())
                .or_default() += 1;
            *trend
                .entry((alert.timestamp.date_naive(), alert.severity))
                .or_default() += 1;

            if let Some(duration) = alert.duration_seconds {
                resolved_total += duration;
                resolved_count += 1;
            }
        }

        let avg_resolution_seconds = if resolved_count > 0 {
            Some(resolved_total as f64 / resolved_count as f64)
        } else {
            None
        };

        Ok(AlertStats {
            total: in_range.len(),
            by_severity,
            by_status,
            by_service,
            by_type,
            avg_resolution_seconds,
            trend: trend
                .into_iter()
                .map(|((date, severity), count)| TrendPoint {
                    date,
                    severity,
                    count,
                })
                .collect(),
        })
    }

    /// Remove alerts created before the horizon. Called by the retention
    /// worker; returns the number removed.
    pub fn expire_older_than(&self, horizon: DateTime<Utc>) -> usize {
        let mut alerts = self.alerts.write();
        let before = alerts.len();
        alerts.retain(|_, a| a.timestamp >= horizon);
        before - alerts.len()
    }

    /// All alerts whose creation timestamp falls inside [start, end)
    pub(crate) fn alerts_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Alert> {
        let alerts = self.alerts.read();
        alerts
            .values()
            .filter(|a| a.timestamp >= start && a.timestamp < end)
            .cloned()
            .collect()
    }

    /// Upsert a daily rollup. Re-running a day overwrites its prior values.
    pub(crate) fn upsert_summary(&self, summary: AlertSummary) {
        self.summaries.write().insert(summary.key(), summary);
    }

    /// Rollups recorded for a calendar day, in key order
    pub fn summaries_for_date(&self, date: NaiveDate) -> Result<Vec<AlertSummary>, StoreError> {
        self.ensure_connected()?;

        let summaries = self.summaries.read();
        let mut matching: Vec<AlertSummary> = summaries
            .values()
            .filter(|s| s.date == date)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::query::{SortField, SortOrder};
    use chrono::Duration;

    fn store() -> AlertStore {
        AlertStore::new(StoreConfig::default())
    }

    #[test]
    fn test_down_then_recovery_pairs_exactly_once() {
        let store = store();
        let t0 = Utc::now();

        let down = store
            .create_service_alert(
                &ServiceStatus::down("redis", "connection refused").observed_at(t0),
                ServiceEvent::Down,
            )
            .unwrap();
        assert_eq!(down.alert_type, AlertType::ServiceDown);
        assert_eq!(down.severity, Severity::Critical);
        assert_eq!(down.status, AlertStatus::Firing);

        let recovery = store
            .create_service_alert(
                &ServiceStatus::up("redis", 4).observed_at(t0 + Duration::seconds(5)),
                ServiceEvent::Recovery,
            )
            .unwrap();
        assert_eq!(recovery.alert_type, AlertType::ServiceRecovery);
        assert_eq!(recovery.fingerprint, down.fingerprint);

        let page = store.query(&AlertQuery::default()).unwrap();
        assert_eq!(page.total, 2);

        let resolved: Vec<_> = page
            .alerts
            .iter()
            .filter(|a| a.status == AlertStatus::Resolved)
            .collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, down.id);
        assert_eq!(resolved[0].duration_seconds, Some(5));
    }

    #[test]
    fn test_resolve_by_fingerprint_is_idempotent() {
        let store = store();
        let status = ServiceStatus::down("redis", "timeout");
        let alert = store
            .create_service_alert(&status, ServiceEvent::Down)
            .unwrap();

        let now = Utc::now();
        assert_eq!(
            store.resolve_by_fingerprint(&alert.fingerprint, now).unwrap(),
            1
        );
        assert_eq!(
            store.resolve_by_fingerprint(&alert.fingerprint, now).unwrap(),
            0
        );

        // Duration not recomputed by the second call
        let page = store.query(&AlertQuery::default()).unwrap();
        assert!(page.alerts[0].duration_seconds.unwrap() >= 0);
    }

    #[test]
    fn test_resolve_unknown_fingerprint_returns_zero() {
        let store = store();
        assert_eq!(
            store.resolve_by_fingerprint("no-such-fp", Utc::now()).unwrap(),
            0
        );
    }

    #[test]
    fn test_at_most_one_firing_per_fingerprint() {
        let store = store();
        let status = ServiceStatus::down("redis", "timeout");
        store
            .create_service_alert(&status, ServiceEvent::Down)
            .unwrap();
        store
            .create_service_alert(&ServiceStatus::up("redis", 2), ServiceEvent::Recovery)
            .unwrap();
        store
            .create_service_alert(&status, ServiceEvent::Down)
            .unwrap();

        let firing = store.active_alerts().unwrap();
        assert_eq!(firing.len(), 1);
        assert_eq!(firing[0].alert_type, AlertType::ServiceDown);
    }

    #[test]
    fn test_threshold_alert_is_one_shot() {
        let store = store();
        let summary = ErrorSummary {
            total_requests: 200_000,
            total_errors: 12_000,
            error_rate_percent: 6.0,
            window_seconds: 300,
            per_service: HashMap::new(),
        };

        let first = store
            .create_threshold_alert(&summary, Severity::Warning)
            .unwrap();
        let second = store
            .create_threshold_alert(&summary, Severity::Warning)
            .unwrap();

        assert_eq!(first.alert_type, AlertType::HighErrorRate);
        assert_eq!(first.metadata.error_rate_percent, Some(6.0));
        // No dedup pairing: both persist
        assert_ne!(first.id, second.id);
        assert_eq!(store.query(&AlertQuery::default()).unwrap().total, 2);
    }

    #[test]
    fn test_record_notification_upserts_by_channel() {
        let store = store();
        let alert = store
            .create_service_alert(&ServiceStatus::down("redis", "x"), ServiceEvent::Down)
            .unwrap();

        let failed = NotificationRecord {
            channel: "webhook".to_string(),
            sent: false,
            sent_at: None,
            target: "https://hooks.example.com/x".to_string(),
            delivery_status: "connect error".to_string(),
        };
        store.record_notification(&alert.id, failed).unwrap();

        let sent = NotificationRecord {
            channel: "webhook".to_string(),
            sent: true,
            sent_at: Some(Utc::now()),
            target: "https://hooks.example.com/x".to_string(),
            delivery_status: "200 OK".to_string(),
        };
        store.record_notification(&alert.id, sent).unwrap();

        let page = store.query(&AlertQuery::default()).unwrap();
        assert_eq!(page.alerts[0].notifications.len(), 1);
        assert!(page.alerts[0].notifications[0].sent);
    }

    #[test]
    fn test_record_notification_for_missing_alert_is_not_an_error() {
        let store = store();
        let record = NotificationRecord {
            channel: "log".to_string(),
            sent: true,
            sent_at: Some(Utc::now()),
            target: "log".to_string(),
            delivery_status: "ok".to_string(),
        };
        assert!(store.record_notification("missing-id", record).is_ok());
    }

    #[test]
    fn test_acknowledge_overwrites() {
        let store = store();
        let alert = store
            .create_service_alert(&ServiceStatus::down("redis", "x"), ServiceEvent::Down)
            .unwrap();

        assert!(store.acknowledge(&alert.id, "alice", None).unwrap());
        assert!(store
            .acknowledge(&alert.id, "bob", Some("known issue".to_string()))
            .unwrap());

        let page = store.query(&AlertQuery::default()).unwrap();
        let ack = page.alerts[0].acknowledgment.as_ref().unwrap();
        assert_eq!(ack.acknowledged_by, "bob");
        assert_eq!(ack.reason.as_deref(), Some("known issue"));

        assert!(!store.acknowledge("missing-id", "alice", None).unwrap());
    }

    #[test]
    fn test_query_pagination_and_total() {
        let store = store();
        let base = Utc::now();
        for i in 0..35 {
            let status = ServiceStatus::down(format!("svc-{:02}", i), "x")
                .observed_at(base + Duration::seconds(i));
            store
                .create_service_alert(&status, ServiceEvent::Down)
                .unwrap();
        }

        let query = AlertQuery {
            sort_by: SortField::Timestamp,
            order: SortOrder::Asc,
            limit: Some(10),
            offset: Some(20),
            ..Default::default()
        };
        let page = store.query(&query).unwrap();

        // Records 21-30 of the ordered set; total is the full match count
        assert_eq!(page.total, 35);
        assert_eq!(page.alerts.len(), 10);
        assert_eq!(page.alerts[0].service, "svc-20");
        assert_eq!(page.alerts[9].service, "svc-29");
    }

    #[test]
    fn test_query_offset_past_end() {
        let store = store();
        store
            .create_service_alert(&ServiceStatus::down("redis", "x"), ServiceEvent::Down)
            .unwrap();

        let query = AlertQuery {
            offset: Some(100),
            ..Default::default()
        };
        let page = store.query(&query).unwrap();
        assert!(page.alerts.is_empty());
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_stats_avg_over_resolved_only() {
        let store = store();
        let t0 = Utc::now();
        store
            .create_service_alert(
                &ServiceStatus::down("redis", "x").observed_at(t0),
                ServiceEvent::Down,
            )
            .unwrap();

        // Nothing resolved yet
        let stats = store.stats(None, None).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.avg_resolution_seconds, None);

        store
            .create_service_alert(
                &ServiceStatus::up("redis", 2).observed_at(t0 + Duration::seconds(10)),
                ServiceEvent::Recovery,
            )
            .unwrap();

        let stats = store.stats(None, None).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.avg_resolution_seconds, Some(10.0));
        assert_eq!(stats.by_severity.get("critical"), Some(&1));
        assert_eq!(stats.by_severity.get("info"), Some(&1));
        assert_eq!(stats.by_service.get("redis"), Some(&2));
        assert_eq!(stats.by_type.get("service_down"), Some(&1));
        assert!(!stats.trend.is_empty());
    }

    #[test]
    fn test_active_alerts_newest_first() {
        let store = store();
        let base = Utc::now();
        for i in 0..3 {
            let status = ServiceStatus::down(format!("svc-{}", i), "x")
                .observed_at(base + Duration::seconds(i));
            store
                .create_service_alert(&status, ServiceEvent::Down)
                .unwrap();
        }

        let active = store.active_alerts().unwrap();
        assert_eq!(active.len(), 3);
        assert_eq!(active[0].service, "svc-2");
        assert_eq!(active[2].service, "svc-0");
    }

    #[test]
    fn test_expire_older_than() {
        let store = store();
        let old = Utc::now() - Duration::days(120);
        store
            .create_service_alert(
                &ServiceStatus::down("redis", "x").observed_at(old),
                ServiceEvent::Down,
            )
            .unwrap();
        store
            .create_service_alert(&ServiceStatus::down("postgres", "x"), ServiceEvent::Down)
            .unwrap();

        let removed = store.expire_older_than(Utc::now() - Duration::days(90));
        assert_eq!(removed, 1);
        assert_eq!(store.query(&AlertQuery::default()).unwrap().total, 1);
    }

    #[test]
    fn test_closed_store_surfaces_error() {
        let store = store();
        store.close();

        assert!(!store.health_check());
        assert!(matches!(
            store.create_service_alert(&ServiceStatus::down("redis", "x"), ServiceEvent::Down),
            Err(StoreError::Closed)
        ));
        assert!(matches!(
            store.query(&AlertQuery::default()),
            Err(StoreError::Closed)
        ));
    }
}
