//! Alert query filters, sorting, and pagination

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::{Alert, AlertStatus, AlertType, Severity};

/// Field an alert listing can be sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Timestamp,
    Severity,
    Service,
    Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort, and pagination parameters for [`AlertStore::query`]
///
/// [`AlertStore::query`]: crate::store::AlertStore::query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    pub service: Option<String>,
    pub alert_type: Option<AlertType>,
    pub severity: Option<Severity>,
    pub status: Option<AlertStatus>,
    pub environment: Option<String>,
    pub tag: Option<String>,
    pub acknowledged: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl AlertQuery {
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(ref service) = self.service {
            if &alert.service != service {
                return false;
            }
        }
        if let Some(alert_type) = self.alert_type {
            if alert.alert_type != alert_type {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if alert.severity != severity {
                return false;
            }
        }
        if let Some(status) = self.status {
            if alert.status != status {
                return false;
            }
        }
        if let Some(ref environment) = self.environment {
            if &alert.environment != environment {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !alert.tags.contains(tag) {
                return false;
            }
        }
        if let Some(acknowledged) = self.acknowledged {
            if alert.is_acknowledged() != acknowledged {
                return false;
            }
        }
        if let Some(start) = self.start {
            if alert.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if alert.timestamp > end {
                return false;
            }
        }
        true
    }

    /// Comparator for the selected sort field and direction
    pub fn compare(&self, a: &Alert, b: &Alert) -> std::cmp::Ordering {
        let ordering = match self.sort_by {
            SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
            SortField::Severity => a.severity.cmp(&b.severity),
            SortField::Service => a.service.cmp(&b.service),
            SortField::Duration => a.duration_seconds.cmp(&b.duration_seconds),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// One page of query results, with the total match count independent of
/// the page bounds (for UI paging).
#[derive(Debug, Clone, Serialize)]
pub struct QueryPage {
    pub alerts: Vec<Alert>,
    pub total: usize,
}
