//! Admin surface behind the shared API secret.
//!
//! Notification broadcast, device listing, and active-session
//! introspection. Admin authorization is unrelated to user tokens.

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::middleware::AdminKey;
use super::{AppError, AppResult, AppState};

/// Admin router, nested under /api/admin
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/notifications/send", post(send_notification))
        .route("/notifications/test", post(send_test_notification))
        .route("/notifications/history", get(notification_history))
        .route("/devices", get(list_devices))
        .route("/users/active-sessions", get(all_active_sessions))
        .route(
            "/users/{username}/active-sessions",
            get(user_active_sessions),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct SendNotificationBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// POST /api/admin/notifications/send
pub async fn send_notification(
    State(state): State<AppState>,
    _admin: AdminKey,
    body: Option<Json<SendNotificationBody>>,
) -> AppResult<Json<Value>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let (Some(title), Some(message)) = (
        body.title.filter(|t| !t.is_empty()),
        body.message.filter(|m| !m.is_empty()),
    ) else {
        return Err(AppError::bad_request("Título y mensaje son requeridos"));
    };

    let notification = state
        .notifications
        .send(
            &title,
            &message,
            body.notification_type.as_deref().unwrap_or("general"),
            body.audience.as_deref().unwrap_or("all"),
            &body.tokens,
        )
        .await?;

    Ok(Json(json!({ "ok": true, "notification": notification })))
}

/// POST /api/admin/notifications/test — canned broadcast for smoke tests.
pub async fn send_test_notification(
    State(state): State<AppState>,
    _admin: AdminKey,
) -> AppResult<Json<Value>> {
    let notification = state
        .notifications
        .send(
            "Prueba",
            "Mensaje de prueba CosmicTV",
            "test",
            "all",
            &[],
        )
        .await?;

    Ok(Json(json!({ "ok": true, "notification": notification })))
}

/// GET /api/admin/notifications/history
pub async fn notification_history(
    State(state): State<AppState>,
    _admin: AdminKey,
) -> Json<Value> {
    Json(json!({ "ok": true, "history": state.notifications.history() }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    pub user_id: String,
    pub tokens: Vec<String>,
}

/// GET /api/admin/devices
pub async fn list_devices(State(state): State<AppState>, _admin: AdminKey) -> Json<Value> {
    let devices: Vec<DeviceEntry> = state
        .devices
        .by_user()
        .into_iter()
        .map(|(user_id, tokens)| DeviceEntry { user_id, tokens })
        .collect();

    Json(json!({ "ok": true, "devices": devices }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionsEntry {
    pub username: String,
    pub active_sessions: usize,
}

/// GET /api/admin/users/active-sessions
pub async fn all_active_sessions(
    State(state): State<AppState>,
    _admin: AdminKey,
) -> Json<Value> {
    let users: Vec<UserSessionsEntry> = state
        .sessions
        .all_active()
        .into_iter()
        .map(|(username, active_sessions)| UserSessionsEntry {
            username,
            active_sessions,
        })
        .collect();
    let total: usize = users.iter().map(|u| u.active_sessions).sum();

    Json(json!({
        "ok": true,
        "users": users,
        "totalSessions": total,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub stream_id: String,
    pub viewer_id: String,
    pub last_ping_ms: i64,
}

/// GET /api/admin/users/{username}/active-sessions
pub async fn user_active_sessions(
    State(state): State<AppState>,
    _admin: AdminKey,
    Path(username): Path<String>,
) -> Json<Value> {
    let sessions: Vec<SessionRow> = state
        .sessions
        .sessions_for(&username)
        .into_iter()
        .map(|row| SessionRow {
            stream_id: row.stream_id.to_string(),
            viewer_id: row.viewer_id.to_string(),
            last_ping_ms: row.last_ping_ms,
        })
        .collect();

    Json(json!({
        "ok": true,
        "username": username,
        "activeSessions": sessions.len(),
        "sessions": sessions,
    }))
}
