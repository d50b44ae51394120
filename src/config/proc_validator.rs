//! Configuration validation with aggregated errors.
//! All issues are collected before reporting so one run shows every problem.

use tracing::error;

use crate::config::settings::{ServiceConfig, SettingsConfig};
use crate::server::cache_routes::CACHE_ROUTE_PREFIX;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    for name in cfg.libraries.keys() {
        validate_library_name(name, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        for e in &errors {
            error!("config: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.sweep_interval_ms == Some(0) {
        errors.push("settings.sweep_interval_ms must be greater than 0".to_string());
    }

    if let Some(path) = &settings.metadata_path {
        if path.trim().is_empty() {
            errors.push("settings.metadata_path must not be empty when set".to_string());
        }
    }

    if settings.server.host.is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be a valid port",
            settings.server.port
        ));
    }

    if settings.metrics.is_enabled {
        let path = settings.metrics.path.as_str();
        if !path.starts_with('/') {
            errors.push(format!("settings.metrics.path '{}' must start with '/'", path));
        }
        let trimmed = path.trim_end_matches('/');
        if trimmed == CACHE_ROUTE_PREFIX || trimmed.starts_with(&format!("{}/", CACHE_ROUTE_PREFIX)) {
            errors.push(format!(
                "settings.metrics.path '{}' collides with the cache routes under '{}'",
                path, CACHE_ROUTE_PREFIX
            ));
        }
    }

    if let Some(logging) = &settings.logging {
        let level = logging.level.to_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            errors.push(format!(
                "settings.logging.level '{}' must be one of trace, debug, info, warn, error",
                logging.level
            ));
        }
    }
}

fn validate_library_name(name: &str, errors: &mut Vec<String>) {
    if name.trim().is_empty() {
        errors.push("libraries: library name must not be empty".to_string());
    }
    if name.contains('/') {
        errors.push(format!("libraries['{}']: name must not contain '/'", name));
    }
}
