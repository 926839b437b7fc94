//! Vigil: Service-Health Alert Lifecycle Engine
//!
//! Turns raw service-state observations and error-rate measurements into
//! deduplicated, persisted, queryable alert records, and drives outbound
//! notifications exactly once per meaningful state transition.
//!
//! # Features
//!
//! - **Transition Detection**: per-service up/down tracking that suppresses
//!   repeat alerts for an unchanged state
//! - **Fingerprint Correlation**: a firing `service_down` alert and its
//!   eventual recovery share one stable fingerprint
//! - **Threshold Detection**: windowed error-rate evaluation with a
//!   process-global cooldown against alert storms
//! - **Queryable Store**: filtered, sorted, paginated alert queries plus
//!   statistical aggregation and day-bucketed trends
//! - **Daily Rollups**: idempotent per-(service, type, severity) summaries
//! - **Severity-Routed Notifications**: log and webhook channels with a
//!   distinguished set for critical alerts, delivery outcomes recorded
//!   against each alert
//! - **Retention**: automatic expiry of alerts past a configurable horizon
//!
//! # Example
//!
//! ```no_run
//! use vigil::alerts::ServiceStatus;
//! use vigil::store::{AlertQuery, AlertStore, ServiceEvent, StoreConfig};
//!
//! let store = AlertStore::new(StoreConfig::default());
//!
//! // A probe saw redis down: persist a firing alert
//! let status = ServiceStatus::down("redis", "connection refused");
//! let alert = store.create_service_alert(&status, ServiceEvent::Down).unwrap();
//! println!("created {}", alert.id);
//!
//! // Later: query what is firing
//! let page = store.query(&AlertQuery::default()).unwrap();
//! println!("{} alerts total", page.total);
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod store;

// Re-export commonly used types
pub use alerts::{Alert, AlertStatus, AlertType, ServiceStatus, Severity};
pub use config::Config;
pub use store::{AlertQuery, AlertStore, StoreError};
