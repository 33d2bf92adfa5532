//! Viewer web server.
//!
//! A stateless, GET-only view over the session document store: list
//! sources, list a source's sessions, serve a session's raw bytes, or
//! pass a `current` request through to the device API. Everything
//! outside `/data` falls back to static assets.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::store::{SourceMap, StoreError};

mod proxy;

pub use proxy::{ProxyError, StatusProxy, DEFAULT_ENDPOINT};

/// Shared application state: the read-only source map and the device
/// proxy, established once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub sources: SourceMap,
    pub proxy: StatusProxy,
    pub static_root: PathBuf,
}

/// Create the axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let static_root = state.static_root.clone();
    let app_state = Arc::new(state);

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/data", get(list_sources_handler))
        .route("/data/:source", get(list_sessions_handler))
        .route("/data/:source/:id", get(get_session_handler))
        .fallback_service(ServeDir::new(static_root))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Map a store error to a client response. Missing or malformed ids
/// are the client's problem; anything else is ours.
fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound(_) | StoreError::InvalidId(_) => {
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        other => {
            tracing::error!(error = %other, "Store read failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {other}")).into_response()
        }
    }
}

/// Liveness probe.
async fn healthz_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// List configured source names.
async fn list_sources_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "connections": state.sources.names() }))
}

/// List session ids for one source, plus the `current` pseudo-entry.
async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> Response {
    let Some(store) = state.sources.get(&source) else {
        return (StatusCode::NOT_FOUND, format!("unknown source: '{source}'")).into_response();
    };

    match store.list() {
        Ok(mut ids) => {
            ids.push("current".to_string());
            Json(json!({ "data_files": ids })).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

/// Serve one session document, or the live status for `current`.
async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path((source, id)): Path<(String, String)>,
) -> Response {
    let Some(store) = state.sources.get(&source) else {
        return (StatusCode::NOT_FOUND, format!("unknown source: '{source}'")).into_response();
    };

    if id == "current" {
        return match state.proxy.fetch().await {
            Ok(body) => json_bytes_response(body),
            Err(e) => {
                tracing::error!(error = %e, "Live status call failed");
                (StatusCode::BAD_GATEWAY, format!("device call failed: {e}")).into_response()
            }
        };
    }

    match store.read(&id) {
        Ok(bytes) => json_bytes_response(bytes),
        Err(e) => store_error_response(e),
    }
}

/// Raw bytes with a JSON content type, forwarded unmodified.
fn json_bytes_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}
