//! Server Configuration
//!
//! All settings load from environment variables with sensible defaults.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/dispatch | working directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | APP_TYPE | multi_vendor | single_vendor or multi_vendor |
//! | COMMISSION_RATE | 0.10 | platform share of delivered order totals |
//! | PUSH_GATEWAY_URL | http://localhost:3002/push | notification gateway |
//! | NOTIFY_TIMEOUT_MS | 5000 | per-recipient send timeout |
//! | ENVIRONMENT | development | development / staging / production |

use std::path::PathBuf;

/// Marketplace mode. Injected through config into request handling instead
/// of being read from a shared settings record at query time - seller
/// balance fields are only exposed in multi-vendor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppType {
    SingleVendor,
    MultiVendor,
}

impl AppType {
    fn from_env_value(value: &str) -> Self {
        match value {
            "single_vendor" => AppType::SingleVendor,
            _ => AppType::MultiVendor,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Marketplace mode
    pub app_type: AppType,
    /// Platform commission applied when crediting seller balances
    pub commission_rate: f64,
    /// Push gateway endpoint for the HTTP notifier
    pub push_gateway_url: String,
    /// Per-recipient notification timeout (milliseconds)
    pub notify_timeout_ms: u64,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/dispatch".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            app_type: AppType::from_env_value(
                &std::env::var("APP_TYPE").unwrap_or_else(|_| "multi_vendor".into()),
            ),
            commission_rate: std::env::var("COMMISSION_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.10),
            push_gateway_url: std::env::var("PUSH_GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:3002/push".into()),
            notify_timeout_ms: std::env::var("NOTIFY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("dispatch.db")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
