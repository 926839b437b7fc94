//! Notification channel targets and severity routing

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alerts::Severity;

/// Where a notification is delivered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifyTarget {
    /// Log via tracing
    Log,
    /// HTTP webhook
    Webhook {
        name: String,
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

impl NotifyTarget {
    /// Stable channel name used for delivery bookkeeping
    pub fn channel(&self) -> &str {
        match self {
            NotifyTarget::Log => "log",
            NotifyTarget::Webhook { name, .. } => name,
        }
    }

    /// Target identifier recorded alongside the delivery outcome
    pub fn target_id(&self) -> String {
        match self {
            NotifyTarget::Log => "log".to_string(),
            NotifyTarget::Webhook { url, .. } => url.clone(),
        }
    }
}

/// Channel routing: every alert goes to the default targets, critical
/// alerts additionally go to the critical targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelRouting {
    #[serde(default)]
    pub default: Vec<NotifyTarget>,
    #[serde(default)]
    pub critical: Vec<NotifyTarget>,
}

impl ChannelRouting {
    /// Targets for an alert of the given severity
    pub fn targets_for(&self, severity: Severity) -> Vec<&NotifyTarget> {
        let mut targets: Vec<&NotifyTarget> = self.default.iter().collect();
        if severity == Severity::Critical {
            targets.extend(self.critical.iter());
        }
        targets
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.critical.is_empty()
    }
}
