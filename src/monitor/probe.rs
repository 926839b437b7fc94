//! Service probes
//!
//! Thin I/O at the edge of the engine: a probe produces one
//! [`ServiceStatus`] reading per polling tick. A probe failure is not an
//! error, it is a `down` observation carrying the failure text, and flows
//! through the normal transition pipeline.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::alerts::ServiceStatus;

/// A named TCP-connect probe with a per-probe timeout
#[derive(Debug, Clone)]
pub struct TcpProbe {
    pub name: String,
    pub addr: String,
    pub timeout: Duration,
}

impl TcpProbe {
    pub fn new(name: impl Into<String>, addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
            timeout,
        }
    }

    /// Take one reading. Never fails: timeouts and connect errors map to
    /// a `down` status.
    pub async fn check(&self) -> ServiceStatus {
        let started = std::time::Instant::now();

        match timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_stream)) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                ServiceStatus::up(&self.name, elapsed_ms)
            }
            Ok(Err(error)) => ServiceStatus::down(&self.name, error.to_string()),
            Err(_) => ServiceStatus::down(
                &self.name,
                format!("probe timed out after {:?}", self.timeout),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::ServiceState;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_reports_up_for_listening_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbe::new("local", addr.to_string(), Duration::from_secs(1));
        let status = probe.check().await;

        assert_eq!(status.state, ServiceState::Up);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_probe_reports_down_on_refused_connection() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = TcpProbe::new("gone", addr.to_string(), Duration::from_secs(1));
        let status = probe.check().await;

        assert_eq!(status.state, ServiceState::Down);
        assert!(status.error.is_some());
    }
}
