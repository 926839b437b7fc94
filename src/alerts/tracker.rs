//! Per-service up/down state tracking
//!
//! Converts a stream of probe readings into transition events only, so a
//! service that stays down does not produce a new alert on every polling
//! cycle. State is process-local; a restart re-arms detection and may
//! re-fire for a service that is still down.

use dashmap::DashMap;

use super::model::{ServiceState, ServiceStatus, TransitionEvent};

/// Tracks the last known state of each probed service
#[derive(Default)]
pub struct StateTracker {
    last_known: DashMap<String, ServiceState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            last_known: DashMap::new(),
        }
    }

    /// Record an observation, returning a transition event if the state
    /// changed.
    ///
    /// Services never seen before are treated as implicitly up: a first
    /// observation of `down` emits a transition, a first observation of
    /// `up` seeds the map silently.
    pub fn observe(&self, status: &ServiceStatus) -> Option<TransitionEvent> {
        let previous = self
            .last_known
            .insert(status.name.clone(), status.state)
            .unwrap_or(ServiceState::Up);

        if previous == status.state {
            return None;
        }

        tracing::info!(
            service = %status.name,
            from = %previous,
            to = %status.state,
            "Service state transition"
        );

        Some(TransitionEvent {
            from: previous,
            to: status.state,
            status: status.clone(),
        })
    }

    /// Last known state for a service, if it has been observed
    pub fn state_of(&self, service: &str) -> Option<ServiceState> {
        self.last_known.get(service).map(|s| *s)
    }

    /// Number of services with recorded state
    pub fn tracked_services(&self) -> usize {
        self.last_known.len()
    }
}
