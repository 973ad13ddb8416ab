//! Public device-registration endpoints for push notifications.

use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceBody {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// POST /api/fcm/register
pub async fn register_device(
    State(state): State<AppState>,
    body: Option<Json<RegisterDeviceBody>>,
) -> AppResult<Json<Value>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let token = body
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Falta token"))?;
    let user_id = body.user_id.unwrap_or_else(|| "anon".to_string());

    state.devices.register(&user_id, &token);

    // Best effort: topic subscription failures do not fail registration.
    if let Err(e) = state
        .notifications
        .notifier()
        .subscribe_to_topic(std::slice::from_ref(&token), "all")
        .await
    {
        warn!("Topic subscription failed: {e}");
    }

    Ok(Json(json!({
        "ok": true,
        "totalUsers": state.devices.total_users(),
        "totalTokens": state.devices.total_tokens(),
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct UnregisterDeviceBody {
    #[serde(default)]
    pub token: Option<String>,
}

/// POST /api/fcm/unregister
pub async fn unregister_device(
    State(state): State<AppState>,
    body: Option<Json<UnregisterDeviceBody>>,
) -> Json<Value> {
    if let Some(token) = body.and_then(|Json(b)| b.token).filter(|t| !t.is_empty()) {
        state.devices.unregister(&token);
    }

    Json(json!({
        "ok": true,
        "totalUsers": state.devices.total_users(),
        "totalTokens": state.devices.total_tokens(),
    }))
}

/// GET /api/fcm/stats
pub async fn device_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "totalUsers": state.devices.total_users(),
        "totalTokens": state.devices.total_tokens(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
