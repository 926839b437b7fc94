//! Vigil Server
//!
//! Run with: cargo run
//!
//! Configuration is environment-driven; see `config.rs` for the full list.
//! Commonly used:
//! - VIGIL_HOST / VIGIL_PORT: bind address (default: 0.0.0.0:8080)
//! - VIGIL_SERVICES: probed services, e.g. "redis=127.0.0.1:6379,postgres=127.0.0.1:5432"
//! - VIGIL_WEBHOOK_URL: notification webhook for all alerts
//! - VIGIL_CRITICAL_WEBHOOK_URL: extra webhook for critical alerts
//! - RUST_LOG: log level (default: info)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil::api::run_server;
use vigil::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Vigil configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Poll interval: {:?}", config.poll_interval);
    tracing::info!("  Probe timeout: {:?}", config.probe_timeout);
    tracing::info!(
        "  Error rate threshold: {:.1}% over {:?} (volume >= {})",
        config.error_rate_threshold * 100.0,
        config.error_window,
        config.volume_threshold
    );
    tracing::info!("  Detector cooldown: {:?}", config.cooldown);
    tracing::info!("  Alerting enabled: {}", config.alerts_enabled);
    tracing::info!("  Retention: {} days", config.retention_days);
    if config.services.is_empty() {
        tracing::info!("  Probed services: none configured");
    } else {
        tracing::info!("  Probed services:");
        for target in &config.services {
            tracing::info!("    - {} @ {}", target.name, target.addr);
        }
    }

    run_server(config).await
}
