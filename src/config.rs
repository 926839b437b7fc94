//! Environment-driven configuration
//!
//! Every recognized option, with its default:
//! - `VIGIL_HOST` / `VIGIL_PORT`: bind address (0.0.0.0:8080)
//! - `VIGIL_POLL_INTERVAL_SECS`: probe polling interval (30)
//! - `VIGIL_PROBE_TIMEOUT_MS`: per-service probe timeout (3000)
//! - `VIGIL_SERVICES`: probed services, `name=host:port` comma-separated
//! - `VIGIL_ERROR_RATE_THRESHOLD`: error-rate fraction (0.05)
//! - `VIGIL_VOLUME_THRESHOLD`: minimum requests per window (100000)
//! - `VIGIL_ERROR_WINDOW_SECS`: detection window (300)
//! - `VIGIL_COOLDOWN_SECS`: detector cooldown (300)
//! - `VIGIL_CRITICAL_THRESHOLD`: critical severity fraction (0.10)
//! - `VIGIL_ALERTS_ENABLED`: alert persistence on/off (true)
//! - `VIGIL_ENVIRONMENT`: environment tag on alerts (production)
//! - `VIGIL_RETENTION_DAYS`: alert retention horizon (90)
//! - `VIGIL_WEBHOOK_URL`: default notification webhook (unset)
//! - `VIGIL_CRITICAL_WEBHOOK_URL`: extra webhook for critical alerts (unset)
//! - `VIGIL_SUMMARY_INTERVAL_SECS`: rollup generation interval (3600)

use std::time::Duration;

/// A probed service target
#[derive(Debug, Clone)]
pub struct ServiceTarget {
    pub name: String,
    pub addr: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub poll_interval: Duration,
    pub probe_timeout: Duration,
    pub services: Vec<ServiceTarget>,
    pub error_rate_threshold: f64,
    pub volume_threshold: u64,
    pub error_window: Duration,
    pub cooldown: Duration,
    pub critical_threshold: f64,
    pub alerts_enabled: bool,
    pub environment: String,
    pub retention_days: i64,
    pub webhook_url: Option<String>,
    pub critical_webhook_url: Option<String>,
    pub summary_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            poll_interval: Duration::from_secs(30),
            probe_timeout: Duration::from_millis(3000),
            services: Vec::new(),
            error_rate_threshold: 0.05,
            volume_threshold: 100_000,
            error_window: Duration::from_secs(300),
            cooldown: Duration::from_secs(300),
            critical_threshold: 0.10,
            alerts_enabled: true,
            environment: "production".to_string(),
            retention_days: 90,
            webhook_url: None,
            critical_webhook_url: None,
            summary_interval: Duration::from_secs(3600),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            host: env_or("VIGIL_HOST", defaults.host),
            port: env_parsed("VIGIL_PORT").unwrap_or(defaults.port),
            poll_interval: env_parsed("VIGIL_POLL_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            probe_timeout: env_parsed("VIGIL_PROBE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.probe_timeout),
            services: std::env::var("VIGIL_SERVICES")
                .ok()
                .map(|s| parse_services(&s))
                .unwrap_or_default(),
            error_rate_threshold: env_parsed("VIGIL_ERROR_RATE_THRESHOLD")
                .unwrap_or(defaults.error_rate_threshold),
            volume_threshold: env_parsed("VIGIL_VOLUME_THRESHOLD")
                .unwrap_or(defaults.volume_threshold),
            error_window: env_parsed("VIGIL_ERROR_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.error_window),
            cooldown: env_parsed("VIGIL_COOLDOWN_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cooldown),
            critical_threshold: env_parsed("VIGIL_CRITICAL_THRESHOLD")
                .unwrap_or(defaults.critical_threshold),
            alerts_enabled: env_parsed("VIGIL_ALERTS_ENABLED").unwrap_or(defaults.alerts_enabled),
            environment: env_or("VIGIL_ENVIRONMENT", defaults.environment),
            retention_days: env_parsed("VIGIL_RETENTION_DAYS").unwrap_or(defaults.retention_days),
            webhook_url: std::env::var("VIGIL_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
            critical_webhook_url: std::env::var("VIGIL_CRITICAL_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            summary_interval: env_parsed("VIGIL_SUMMARY_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.summary_interval),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Parse `name=host:port,name=host:port`; entries without a `=` are skipped
fn parse_services(raw: &str) -> Vec<ServiceTarget> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let (name, addr) = entry.split_once('=')?;
            if name.is_empty() || addr.is_empty() {
                return None;
            }
            Some(ServiceTarget {
                name: name.to_string(),
                addr: addr.to_string(),
            })
        })
        .collect()
}
