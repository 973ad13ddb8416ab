//! Health probes, root banner, and manual catalog reload.

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde_json::json;

use super::{AppResult, AppState};

/// Health check router
pub fn create_health_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root_banner))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .route("/api/reload", post(reload_catalog))
}

pub async fn root_banner() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "message": "CosmicTV API",
        "ts": Utc::now().to_rfc3339(),
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "streams": state.catalog.len(),
    }))
}

pub async fn api_health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "timestamp": Utc::now().to_rfc3339(),
        "streams": state.catalog.len(),
    }))
}

/// POST /api/reload — re-scan the playlist directory on demand.
pub async fn reload_catalog(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let streams = state
        .catalog
        .rescan(std::path::Path::new(&state.config.channels.dir))
        .await?;

    Ok(Json(json!({
        "ok": true,
        "streams": streams,
        "reloadedAt": Utc::now().to_rfc3339(),
    })))
}
