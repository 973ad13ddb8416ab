//! Login and self-service account endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use cosmictv_core::service::auth::issue_token;
use cosmictv_core::service::subscription::days_remaining;

use super::middleware::AuthUser;
use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub username: String,
    pub name: String,
    pub registered_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: LoginUser,
    pub expires_at: String,
    pub days_remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginDenied {
    pub success: bool,
    pub error: String,
}

fn denied(status: StatusCode, error: &str) -> axum::response::Response {
    (
        status,
        Json(LoginDenied {
            success: false,
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// POST /api/login
///
/// Accounts without an expiry get a simulated trial window in the
/// response; the subscription gate still sees the account as having no
/// expiry and fail-closes.
pub async fn login(
    State(state): State<AppState>,
    body: Option<Json<LoginRequest>>,
) -> axum::response::Response {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let (Some(username), Some(password)) = (
        req.username.filter(|u| !u.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return denied(StatusCode::BAD_REQUEST, "Faltan credenciales");
    };

    let Some(account) = state.authenticator.verify(&username, &password) else {
        info!(username = %username, "Login failed");
        return denied(StatusCode::UNAUTHORIZED, "Credenciales inválidas");
    };

    info!(username = %account.username, "Login succeeded");

    let expires_at = account.expires_at.clone().unwrap_or_else(|| {
        (Utc::now() + Duration::days(state.config.auth.trial_days)).to_rfc3339()
    });
    let parsed = chrono::DateTime::parse_from_rfc3339(&expires_at)
        .ok()
        .map(|dt| dt.with_timezone(&Utc));

    Json(LoginResponse {
        success: true,
        token: issue_token(&account.username),
        user: LoginUser {
            username: account.username.clone(),
            name: account.name,
            registered_at: account.registered_at,
        },
        expires_at,
        days_remaining: days_remaining(parsed),
    })
    .into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub ok: bool,
    pub username: String,
    pub expires_at: Option<String>,
    pub days_remaining: i64,
    pub timestamp: String,
}

/// GET /api/me/subscription — always answerable, even when expired.
pub async fn my_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Json<SubscriptionResponse> {
    let status = state.gate.status(&user.username);
    Json(SubscriptionResponse {
        ok: true,
        username: status.username,
        expires_at: status.expires_at,
        days_remaining: status.days_remaining,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCountResponse {
    pub username: String,
    pub active_sessions: usize,
    pub timestamp: String,
}

/// GET /api/me/sessions/count
pub async fn my_session_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Json<SessionCountResponse> {
    Json(SessionCountResponse {
        active_sessions: state.sessions.active_count(&user.username),
        username: user.username,
        timestamp: Utc::now().to_rfc3339(),
    })
}
