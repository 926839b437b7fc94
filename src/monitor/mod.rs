//! Periodic monitoring loops
//!
//! Wires the pipeline together: probes produce readings, the state
//! tracker and threshold detector decide what is a new event, the store
//! persists it, and the notifier dispatches it. Persistence always comes
//! first; a notification failure never unwinds a created alert, and a
//! store failure is logged and retried naturally on the next tick.

pub mod metrics;
pub mod probe;

pub use metrics::RequestMetrics;
pub use probe::TcpProbe;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;

use crate::alerts::{
    Alert, ServiceState, ServiceStatus, StateTracker, ThresholdDetector,
};
use crate::notify::Notifier;
use crate::store::{AlertStore, ServiceEvent, SummaryAggregator};

/// Timer configuration for the three monitoring loops
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub error_check_interval: Duration,
    pub summary_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            error_check_interval: Duration::from_secs(60),
            summary_interval: Duration::from_secs(3600),
        }
    }
}

/// Owns the detection state and drives the periodic loops
pub struct Monitor {
    config: MonitorConfig,
    tracker: StateTracker,
    detector: ThresholdDetector,
    metrics: Arc<RequestMetrics>,
    probes: Vec<TcpProbe>,
    /// `None` when alert persistence is disabled by configuration
    store: Option<Arc<AlertStore>>,
    notifier: Arc<Notifier>,
    running: Arc<AtomicBool>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        detector: ThresholdDetector,
        metrics: Arc<RequestMetrics>,
        probes: Vec<TcpProbe>,
        store: Option<Arc<AlertStore>>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            config,
            tracker: StateTracker::new(),
            detector,
            metrics,
            probes,
            store,
            notifier,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Feed one probe reading through the transition pipeline. Returns the
    /// persisted alert when the reading produced a new transition.
    pub async fn handle_status(&self, status: ServiceStatus) -> Option<Alert> {
        let transition = self.tracker.observe(&status)?;

        let store = match &self.store {
            Some(store) => store,
            None => {
                tracing::debug!(
                    service = %status.name,
                    "Alerting disabled, transition not persisted"
                );
                return None;
            }
        };

        let event = match transition.to {
            ServiceState::Down => ServiceEvent::Down,
            ServiceState::Up => ServiceEvent::Recovery,
        };

        // Phase one: persist. A failure here is surfaced to the log and the
        // next polling tick gets another chance.
        let alert = match store.create_service_alert(&transition.status, event) {
            Ok(alert) => alert,
            Err(error) => {
                tracing::error!(
                    service = %status.name,
                    error = %error,
                    "Failed to persist transition alert"
                );
                return None;
            }
        };

        // Phase two: notify and record outcomes, best-effort.
        self.notify_and_record(&alert).await;
        Some(alert)
    }

    /// Evaluate the current error-rate window, persisting and dispatching
    /// a threshold alert when the detector fires.
    pub async fn check_error_rate(&self) -> Option<Alert> {
        let summary = self.metrics.summarize();
        let severity = self.detector.evaluate(&summary)?;

        let store = match &self.store {
            Some(store) => store,
            None => {
                tracing::debug!("Alerting disabled, threshold fire not persisted");
                return None;
            }
        };

        let alert = match store.create_threshold_alert(&summary, severity) {
            Ok(alert) => alert,
            Err(error) => {
                tracing::error!(error = %error, "Failed to persist threshold alert");
                return None;
            }
        };

        self.notify_and_record(&alert).await;
        Some(alert)
    }

    async fn notify_and_record(&self, alert: &Alert) {
        let records = self.notifier.dispatch(alert).await;
        let Some(store) = &self.store else { return };

        for record in records {
            if let Err(error) = store.record_notification(&alert.id, record) {
                tracing::warn!(
                    alert_id = %alert.id,
                    error = %error,
                    "Failed to record notification outcome"
                );
            }
        }
    }

    /// Start the polling, error-rate, and summary loops
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        self.running.store(true, Ordering::SeqCst);
        let mut handles = Vec::new();

        let poller = Arc::clone(&self);
        handles.push(tokio::spawn(async move {
            tracing::info!(
                probes = poller.probes.len(),
                "Health poller started with interval {:?}",
                poller.config.poll_interval
            );
            let mut ticker = interval(poller.config.poll_interval);
            while poller.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                for probe in &poller.probes {
                    let status = probe.check().await;
                    poller.handle_status(status).await;
                }
            }
        }));

        let checker = Arc::clone(&self);
        handles.push(tokio::spawn(async move {
            let mut ticker = interval(checker.config.error_check_interval);
            while checker.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                checker.check_error_rate().await;
            }
        }));

        if let Some(store) = self.store.clone() {
            let summarizer = Arc::clone(&self);
            let aggregator = SummaryAggregator::new(store);
            handles.push(tokio::spawn(async move {
                let mut ticker = interval(summarizer.config.summary_interval);
                while summarizer.running.load(Ordering::SeqCst) {
                    ticker.tick().await;
                    if let Err(error) = aggregator.generate_daily_summaries(Utc::now()) {
                        tracing::error!(error = %error, "Daily summary generation failed");
                    }
                }
            }));
        }

        handles
    }

    /// Stop all loops at their next tick
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertStatus, AlertType, DetectorConfig, Severity};
    use crate::notify::{ChannelRouting, NotifyTarget};
    use crate::store::{AlertQuery, StoreConfig};
    use chrono::Duration as ChronoDuration;

    fn monitor_with_store() -> (Monitor, Arc<AlertStore>) {
        let store = Arc::new(AlertStore::new(StoreConfig::default()));
        let monitor = Monitor::new(
            MonitorConfig::default(),
            ThresholdDetector::new(DetectorConfig {
                error_rate_threshold: 0.05,
                volume_threshold: 100_000,
                cooldown: Duration::from_secs(300),
                critical_threshold: 0.10,
            }),
            Arc::new(RequestMetrics::new(Duration::from_secs(300))),
            Vec::new(),
            Some(Arc::clone(&store)),
            Arc::new(Notifier::new(ChannelRouting {
                default: vec![NotifyTarget::Log],
                critical: vec![],
            })),
        );
        (monitor, store)
    }

    #[tokio::test]
    async fn test_end_to_end_down_then_recovery() {
        let (monitor, store) = monitor_with_store();
        let t0 = Utc::now();

        // T0: redis reports down
        let down = monitor
            .handle_status(ServiceStatus::down("redis", "connection refused").observed_at(t0))
            .await
            .expect("down transition should alert");
        assert_eq!(down.alert_type, AlertType::ServiceDown);
        assert_eq!(down.severity, Severity::Critical);
        assert_eq!(down.status, AlertStatus::Firing);

        // Notification outcome was recorded against the stored alert
        let page = store.query(&AlertQuery::default()).unwrap();
        let stored_down = page.alerts.iter().find(|a| a.id == down.id).unwrap();
        assert_eq!(stored_down.notifications.len(), 1);
        assert!(stored_down.notifications[0].sent);

        // T0+5s: redis reports up
        let recovery = monitor
            .handle_status(
                ServiceStatus::up("redis", 4).observed_at(t0 + ChronoDuration::seconds(5)),
            )
            .await
            .expect("recovery transition should alert");
        assert_eq!(recovery.alert_type, AlertType::ServiceRecovery);

        let page = store.query(&AlertQuery::default()).unwrap();
        assert_eq!(page.total, 2);
        let resolved = page.alerts.iter().find(|a| a.id == down.id).unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.duration_seconds, Some(5));
    }

    #[tokio::test]
    async fn test_steady_down_state_alerts_once() {
        let (monitor, store) = monitor_with_store();

        assert!(monitor
            .handle_status(ServiceStatus::down("redis", "timeout"))
            .await
            .is_some());
        for _ in 0..5 {
            assert!(monitor
                .handle_status(ServiceStatus::down("redis", "timeout"))
                .await
                .is_none());
        }

        assert_eq!(store.query(&AlertQuery::default()).unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_error_rate_scenario_fires_warning_once() {
        let (monitor, store) = monitor_with_store();

        // 200k simulated requests at a 6% synthetic error rate
        let metrics = monitor.metrics();
        for i in 0..200_000u32 {
            metrics.record("api", i % 50 < 3);
        }

        let alert = monitor
            .check_error_rate()
            .await
            .expect("6% over a 5% threshold at full volume should fire");
        assert_eq!(alert.alert_type, AlertType::HighErrorRate);
        // 6% < 10% critical boundary
        assert_eq!(alert.severity, Severity::Warning);

        // Qualifying samples inside the cooldown do not fire again
        assert!(monitor.check_error_rate().await.is_none());

        let page = store.query(&AlertQuery::default()).unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_error_rate_below_volume_does_not_fire() {
        let (monitor, _store) = monitor_with_store();
        let metrics = monitor.metrics();
        for i in 0..1_000u32 {
            metrics.record("api", i % 2 == 0);
        }
        assert!(monitor.check_error_rate().await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_store_skips_persistence() {
        let monitor = Monitor::new(
            MonitorConfig::default(),
            ThresholdDetector::new(DetectorConfig::default()),
            Arc::new(RequestMetrics::new(Duration::from_secs(300))),
            Vec::new(),
            None,
            Arc::new(Notifier::new(ChannelRouting::default())),
        );

        let alert = monitor
            .handle_status(ServiceStatus::down("redis", "refused"))
            .await;
        assert!(alert.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_the_pipeline() {
        let (monitor, store) = monitor_with_store();
        store.close();

        // Persistence fails, handle_status logs and returns None
        assert!(monitor
            .handle_status(ServiceStatus::down("redis", "refused"))
            .await
            .is_none());

        // The tracker still advanced, so recovery is a fresh transition
        assert!(monitor
            .handle_status(ServiceStatus::up("redis", 2))
            .await
            .is_none());
    }
}
