use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    acknowledge_alert, active_alerts, alert_stats, health_check, list_alerts, list_summaries,
    resolve_service, AppState,
};
use crate::alerts::{DetectorConfig, ThresholdDetector};
use crate::config::Config;
use crate::monitor::{Monitor, MonitorConfig, RequestMetrics, TcpProbe};
use crate::notify::{ChannelRouting, Notifier, NotifyTarget};
use crate::store::{AlertStore, RetentionWorker, StoreConfig};

/// How often the error-rate window is evaluated
const ERROR_CHECK_INTERVAL: Duration = Duration::from_secs(60);
/// How often expired alerts are swept
const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Alert queries
        .route("/alerts", get(list_alerts))
        .route("/alerts/active", get(active_alerts))
        .route("/alerts/stats", get(alert_stats))
        .route("/alerts/summaries", get(list_summaries))
        // Alert mutations
        .route("/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/alerts/resolve", post(resolve_service))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server and the monitoring loops
pub async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the alert store unless persistence is disabled
    let store = if config.alerts_enabled {
        Some(Arc::new(AlertStore::new(StoreConfig {
            environment: config.environment.clone(),
            retention_days: config.retention_days,
        })))
    } else {
        tracing::warn!("Alerting disabled, transitions will not be persisted");
        None
    };

    // Notification routing: everything logs; webhooks are added from config,
    // with a distinguished target for critical alerts
    let mut routing = ChannelRouting {
        default: vec![NotifyTarget::Log],
        critical: Vec::new(),
    };
    if let Some(url) = &config.webhook_url {
        routing.default.push(NotifyTarget::Webhook {
            name: "webhook".to_string(),
            url: url.clone(),
            headers: Default::default(),
        });
    }
    if let Some(url) = &config.critical_webhook_url {
        routing.critical.push(NotifyTarget::Webhook {
            name: "critical-webhook".to_string(),
            url: url.clone(),
            headers: Default::default(),
        });
    }
    let notifier = Arc::new(Notifier::new(routing));

    let detector = ThresholdDetector::new(DetectorConfig {
        error_rate_threshold: config.error_rate_threshold,
        volume_threshold: config.volume_threshold,
        cooldown: config.cooldown,
        critical_threshold: config.critical_threshold,
    });
    let metrics = Arc::new(RequestMetrics::new(config.error_window));

    let probes: Vec<TcpProbe> = config
        .services
        .iter()
        .map(|target| TcpProbe::new(&target.name, &target.addr, config.probe_timeout))
        .collect();

    let monitor = Arc::new(Monitor::new(
        MonitorConfig {
            poll_interval: config.poll_interval,
            error_check_interval: ERROR_CHECK_INTERVAL,
            summary_interval: config.summary_interval,
        },
        detector,
        metrics,
        probes,
        store.clone(),
        notifier,
    ));
    let monitor_handles = Arc::clone(&monitor).start();

    let retention_worker = store
        .as_ref()
        .map(|store| Arc::new(RetentionWorker::new(Arc::clone(store), RETENTION_SWEEP_INTERVAL)));
    let retention_handle = retention_worker.as_ref().map(|w| Arc::clone(w).start());

    // Build router
    let state = Arc::new(AppState {
        store: store.clone(),
    });
    let app = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting vigil server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(monitor, retention_worker, store))
        .await?;

    for handle in monitor_handles {
        handle.abort();
    }
    if let Some(handle) = retention_handle {
        handle.abort();
    }

    tracing::info!("vigil server stopped");
    Ok(())
}

async fn shutdown_signal(
    monitor: Arc<Monitor>,
    retention_worker: Option<Arc<RetentionWorker>>,
    store: Option<Arc<AlertStore>>,
) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");

    tracing::info!("Shutdown signal received, stopping workers...");
    monitor.stop();
    if let Some(worker) = retention_worker {
        worker.stop();
    }
    if let Some(store) = store {
        store.close();
    }
}
