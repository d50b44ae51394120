use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::token::Ttl;

pub const SWEEP_INTERVAL_MS_DEFAULT: u64 = 1000;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    #[serde(default)]
    pub libraries: HashMap<String, LibraryConfig>,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    pub sweep_interval_ms: Option<u64>,
    /// flat JSON file recording version and library names
    pub metadata_path: Option<String>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub server: ServerConfig,
}

impl SettingsConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.unwrap_or(SWEEP_INTERVAL_MS_DEFAULT))
    }
}

/// ================================
/// Libraries
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    /// negative never expires, and so does a value too large for a deadline
    pub ttl_seconds: i64,
}

impl LibraryConfig {
    pub fn ttl(&self) -> Ttl {
        Ttl::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
