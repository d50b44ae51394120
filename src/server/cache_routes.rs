use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cache::CacheError;
use crate::server::server::AppState;

pub const CACHE_ROUTE_PREFIX: &str = "/cache";

#[derive(Debug, Serialize)]
pub struct LibraryView {
    pub name: String,
    pub ttl_seconds: i64,
    pub entries: usize,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub key: String,
    pub value: Value,
    /// absent for entries that never expire
    pub expires_at: Option<DateTime<Utc>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cache", get(list_libraries))
        .route("/cache/{library}", get(list_keys).delete(clear_library))
        .route(
            "/cache/{library}/{key}",
            get(get_entry).put(put_entry).delete(delete_entry),
        )
        .route("/cache/{library}/{key}/refresh", post(refresh_entry))
}

async fn list_libraries(State(state): State<AppState>) -> Json<Vec<LibraryView>> {
    let mut views = Vec::new();
    for name in state.cache.libraries().await {
        let (Some(ttl), Some(store)) = (
            state.cache.library_ttl(&name).await,
            state.cache.store(&name).await,
        ) else {
            continue;
        };
        views.push(LibraryView {
            name,
            ttl_seconds: ttl.as_secs(),
            entries: store.len().await,
        });
    }
    Json(views)
}

async fn list_keys(State(state): State<AppState>, Path(library): Path<String>) -> Response {
    if state.cache.library_ttl(&library).await.is_none() {
        return not_found(format!("library '{}' not found", library));
    }
    let mut keys = state.cache.keys(&library).await;
    keys.sort();
    Json(keys).into_response()
}

async fn clear_library(State(state): State<AppState>, Path(library): Path<String>) -> Response {
    if state.cache.library_ttl(&library).await.is_none() {
        return not_found(format!("library '{}' not found", library));
    }
    state.cache.clear(&library).await;
    info!("library '{}' cleared over http", library);
    StatusCode::NO_CONTENT.into_response()
}

async fn get_entry(
    State(state): State<AppState>,
    Path((library, key)): Path<(String, String)>,
) -> Response {
    let Some(store) = state.cache.store(&library).await else {
        return not_found(format!("library '{}' not found", library));
    };
    let (Some(value), Some(info)) = (store.get(&key).await, store.inspect(&key).await) else {
        return not_found(format!("key '{}' not found in '{}'", key, library));
    };

    let expires_at = info
        .remaining
        .and_then(|left| chrono::Duration::from_std(left).ok())
        .map(|left| Utc::now() + left);
    Json(EntryView { key, value, expires_at }).into_response()
}

async fn put_entry(
    State(state): State<AppState>,
    Path((library, key)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> Response {
    match state.cache.set(&library, &key, value).await {
        Ok(()) => {
            debug!("set '{}' in '{}'", key, library);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => cache_error(err),
    }
}

async fn refresh_entry(
    State(state): State<AppState>,
    Path((library, key)): Path<(String, String)>,
) -> Response {
    if state.cache.refresh(&library, &key).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(format!("key '{}' not found in '{}'", key, library))
    }
}

async fn delete_entry(
    State(state): State<AppState>,
    Path((library, key)): Path<(String, String)>,
) -> Response {
    if state.cache.remove(&library, &key).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(format!("key '{}' not found in '{}'", key, library))
    }
}

fn cache_error(err: CacheError) -> Response {
    let status = match err {
        CacheError::EmptyLibraryName | CacheError::EmptyKey => StatusCode::BAD_REQUEST,
        CacheError::LibraryExists(_) => StatusCode::CONFLICT,
        CacheError::LibraryNotFound(_) => StatusCode::NOT_FOUND,
        CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}
