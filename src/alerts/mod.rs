//! Alert lifecycle engine core
//!
//! Turns raw service-state observations and error-rate measurements into
//! transition events worth alerting on: fingerprint-based correlation,
//! per-service up/down tracking, and cooldown-gated threshold detection.

pub mod detector;
pub mod fingerprint;
pub mod model;
pub mod tracker;

pub use detector::{DetectorConfig, ThresholdDetector};
pub use fingerprint::{fingerprint, service_down_fingerprint};
pub use model::{
    Acknowledgment, Alert, AlertMetadata, AlertStatus, AlertType, ErrorSummary,
    NotificationRecord, ServiceErrorStats, ServiceState, ServiceStatus, Severity,
    TransitionEvent,
};
pub use tracker::StateTracker;
