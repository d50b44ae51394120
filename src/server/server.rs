use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cache::CacheManager;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::cache_routes;

/// Values served over HTTP are arbitrary JSON documents
pub type JsonCache = CacheManager<Value>;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub cache: Arc<JsonCache>,
}

impl AppState {
    pub fn new(metrics: &Metrics, cache: Arc<JsonCache>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            cache,
        }
    }
}

pub async fn router(settings_config: &SettingsConfig, cache: Arc<JsonCache>) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, cache);

    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(cache_routes::router())
        .with_state(state)
}

/// Serve the cache API until ctrl-c.
pub async fn start(settings_config: &SettingsConfig, cache: Arc<JsonCache>) -> Result<()> {
    let app = router(settings_config, cache).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;
    metrics.up.set(0);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("unable to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
