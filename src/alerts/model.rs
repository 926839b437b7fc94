//! Alert data model

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observed up/down state of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Up,
    Down,
}

impl ServiceState {
    pub fn is_down(&self) -> bool {
        matches!(self, ServiceState::Down)
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Up => write!(f, "up"),
            ServiceState::Down => write!(f, "down"),
        }
    }
}

/// A single probe reading for a named service. Not persisted; consumed by
/// the state tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub state: ServiceState,
    pub response_time_ms: u64,
    pub observed_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl ServiceStatus {
    pub fn up(name: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            name: name.into(),
            state: ServiceState::Up,
            response_time_ms,
            observed_at: Utc::now(),
            error: None,
        }
    }

    pub fn down(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ServiceState::Down,
            response_time_ms: 0,
            observed_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }
}

/// Per-service slice of an error-rate window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorStats {
    pub requests: u64,
    pub errors: u64,
    pub error_rate_percent: f64,
}

/// Aggregate error-rate measurement over a time window, produced by the
/// request-metrics collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub total_requests: u64,
    pub total_errors: u64,
    pub error_rate_percent: f64,
    pub window_seconds: u64,
    pub per_service: HashMap<String, ServiceErrorStats>,
}

/// A detected change in a service's up/down state
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub from: ServiceState,
    pub to: ServiceState,
    pub status: ServiceStatus,
}

/// Classification of a persisted alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ServiceDown,
    ServiceRecovery,
    HighErrorRate,
    ResponseTime,
    Custom,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::ServiceDown => "service_down",
            AlertType::ServiceRecovery => "service_recovery",
            AlertType::HighErrorRate => "high_error_rate",
            AlertType::ResponseTime => "response_time",
            AlertType::Custom => "custom",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a persisted alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

/// Known numeric observations carried by an alert, plus an open extension
/// map for anything a channel or caller wants to attach.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_rate_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Delivery outcome for one notification channel, recorded after dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub channel: String,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub target: String,
    pub delivery_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub acknowledged_by: String,
    pub acknowledged_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A persisted alert record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Globally unique id, generated at creation
    pub id: String,
    /// Stable hash grouping a firing alert with its eventual resolution
    pub fingerprint: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub service: String,
    pub summary: String,
    pub status: AlertStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub metadata: AlertMetadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    pub environment: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<NotificationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgment: Option<Acknowledgment>,
}

impl Alert {
    /// Create a firing alert with a fresh id
    pub fn new(
        fingerprint: impl Into<String>,
        alert_type: AlertType,
        severity: Severity,
        service: impl Into<String>,
        summary: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fingerprint: fingerprint.into(),
            alert_type,
            severity,
            service: service.into(),
            summary: summary.into(),
            status: AlertStatus::Firing,
            timestamp: Utc::now(),
            resolved_at: None,
            duration_seconds: None,
            metadata: AlertMetadata::default(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            tags: BTreeSet::new(),
            environment: environment.into(),
            notifications: Vec::new(),
            acknowledgment: None,
        }
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = at;
        self
    }

    pub fn with_metadata(mut self, metadata: AlertMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledgment.is_some()
    }

    /// Transition to resolved, computing the firing duration. Clamps to
    /// zero if the clock moved backwards between creation and resolution.
    pub fn resolve(&mut self, resolved_at: DateTime<Utc>) {
        self.status = AlertStatus::Resolved;
        self.resolved_at = Some(resolved_at);
        self.duration_seconds = Some((resolved_at - self.timestamp).num_seconds().max(0));
    }
}
