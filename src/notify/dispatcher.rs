//! Notification dispatch
//!
//! Delivery is fire-and-forget relative to the detection path: the alert
//! is already persisted before dispatch runs, failures are logged and
//! folded into the returned delivery records, and nothing here propagates
//! an error back to the caller.

use chrono::Utc;
use futures::future::join_all;

use crate::alerts::{Alert, NotificationRecord};

use super::channel::{ChannelRouting, NotifyTarget};

/// Sends alerts to their severity-selected channels
pub struct Notifier {
    routing: ChannelRouting,
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(routing: ChannelRouting) -> Self {
        Self {
            routing,
            client: reqwest::Client::new(),
        }
    }

    /// Dispatch an alert to every enabled channel for its severity,
    /// returning one delivery record per channel for the store to file
    /// against the alert.
    pub async fn dispatch(&self, alert: &Alert) -> Vec<NotificationRecord> {
        let targets = self.routing.targets_for(alert.severity);
        if targets.is_empty() {
            tracing::debug!(alert_id = %alert.id, "No notification targets configured");
            return Vec::new();
        }

        let sends = targets
            .into_iter()
            .map(|target| self.send_to_target(alert, target));
        join_all(sends).await
    }

    async fn send_to_target(&self, alert: &Alert, target: &NotifyTarget) -> NotificationRecord {
        let outcome = match target {
            NotifyTarget::Log => {
                tracing::warn!(
                    alert_id = %alert.id,
                    service = %alert.service,
                    severity = %alert.severity,
                    "{}",
                    alert.summary
                );
                Ok("logged".to_string())
            }
            NotifyTarget::Webhook { url, headers, .. } => {
                self.send_webhook(alert, url, headers).await
            }
        };

        match outcome {
            Ok(delivery_status) => NotificationRecord {
                channel: target.channel().to_string(),
                sent: true,
                sent_at: Some(Utc::now()),
                target: target.target_id(),
                delivery_status,
            },
            Err(error) => {
                tracing::error!(
                    alert_id = %alert.id,
                    channel = %target.channel(),
                    error = %error,
                    "Failed to send notification"
                );
                NotificationRecord {
                    channel: target.channel().to_string(),
                    sent: false,
                    sent_at: None,
                    target: target.target_id(),
                    delivery_status: error,
                }
            }
        }
    }

    async fn send_webhook(
        &self,
        alert: &Alert,
        url: &str,
        headers: &std::collections::HashMap<String, String>,
    ) -> Result<String, String> {
        let payload = format_payload(alert);

        let mut request = self.client.post(url).json(&payload);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("webhook send failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("webhook returned status {}", status));
        }

        tracing::debug!(alert_id = %alert.id, url = %url, "Webhook notification sent");
        Ok(status.to_string())
    }
}

/// Human-readable webhook payload: summary, description, timestamps, and
/// contextual fields a chat renderer can turn into buttons/links.
pub fn format_payload(alert: &Alert) -> serde_json::Value {
    let mut description = format!(
        "[{}] {} — {}",
        alert.severity.to_string().to_uppercase(),
        alert.service,
        alert.summary
    );
    if let Some(rate) = alert.metadata.error_rate_percent {
        description.push_str(&format!(" (error rate {:.2}%)", rate));
    }

    serde_json::json!({
        "alert_id": alert.id,
        "fingerprint": alert.fingerprint,
        "alert_type": alert.alert_type,
        "severity": alert.severity,
        "service": alert.service,
        "status": alert.status,
        "summary": alert.summary,
        "description": description,
        "environment": alert.environment,
        "timestamp": alert.timestamp.to_rfc3339(),
        "resolved_at": alert.resolved_at.map(|t| t.to_rfc3339()),
        "metadata": alert.metadata,
        "labels": alert.labels,
        "links": [
            { "text": "Active alerts", "path": "/alerts/active" },
            { "text": "Alert detail", "path": format!("/alerts?service={}", alert.service) },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertMetadata, AlertType, Severity};

    fn alert() -> Alert {
        Alert::new(
            "fp-1",
            AlertType::ServiceDown,
            Severity::Critical,
            "redis",
            "Service redis is down: connection refused",
            "production",
        )
    }

    #[tokio::test]
    async fn test_log_target_always_delivers() {
        let notifier = Notifier::new(ChannelRouting {
            default: vec![NotifyTarget::Log],
            critical: vec![],
        });

        let records = notifier.dispatch(&alert()).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].sent);
        assert_eq!(records[0].channel, "log");
        assert!(records[0].sent_at.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_yields_failed_record() {
        let notifier = Notifier::new(ChannelRouting {
            default: vec![NotifyTarget::Webhook {
                name: "ops".to_string(),
                // Nothing listens on port 9, connection is refused fast
                url: "http://127.0.0.1:9/hook".to_string(),
                headers: Default::default(),
            }],
            critical: vec![],
        });

        // Failure is captured in the record, never returned as an error
        let records = notifier.dispatch(&alert()).await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].sent);
        assert!(records[0].sent_at.is_none());
        assert_eq!(records[0].channel, "ops");
    }

    #[tokio::test]
    async fn test_no_targets_configured() {
        let notifier = Notifier::new(ChannelRouting::default());
        assert!(notifier.dispatch(&alert()).await.is_empty());
    }

    #[test]
    fn test_payload_includes_context() {
        let mut a = alert();
        a.metadata = AlertMetadata {
            error_rate_percent: Some(6.0),
            ..Default::default()
        };
        let payload = format_payload(&a);

        assert_eq!(payload["service"], "redis");
        assert_eq!(payload["severity"], "critical");
        assert!(payload["description"]
            .as_str()
            .unwrap()
            .contains("error rate 6.00%"));
        assert!(payload["links"].as_array().unwrap().len() == 2);
    }
}
