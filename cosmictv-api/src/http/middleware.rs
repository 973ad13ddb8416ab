// HTTP middleware and extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use cosmictv_core::service::auth::username_from_token;

use super::{AppError, AppState};

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub name: String,
}

/// Strip an optional `Bearer ` prefix, case-insensitively.
fn strip_bearer(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .get(..7)
        .filter(|prefix| prefix.eq_ignore_ascii_case("bearer "))
        .map_or(trimmed, |_| trimmed[7..].trim())
}

/// The raw bearer token of a request, if any.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(strip_bearer)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| AppError::unauthorized("NO_AUTH"))?;

        // "Not a recognized session" splits into two cases the client
        // can tell apart: a token we cannot read at all, and a token
        // whose user has since disappeared.
        let username = username_from_token(&token)
            .map_err(|_| AppError::unauthorized("INVALID_TOKEN"))?;

        let account = state
            .authenticator
            .lookup(&username)
            .ok_or_else(|| AppError::unauthorized("SESSION_INVALID_OR_USER_DELETED"))?;

        Ok(Self {
            username: account.username,
            name: account.name,
        })
    }
}

/// Admin authorization via the shared API secret.
///
/// Accepted in either the `x-api-key` header or as a bearer token;
/// unrelated to user tokens. When no secret is configured every request
/// is rejected.
#[derive(Debug, Clone)]
pub struct AdminKey;

impl FromRequestParts<AppState> for AdminKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let configured = state
            .config
            .auth
            .admin_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

        let presented = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| bearer_token(&parts.headers));

        match presented {
            Some(key) if key == configured => Ok(Self),
            _ => Err(AppError::unauthorized("Unauthorized")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc123"), "abc123");
        assert_eq!(strip_bearer("bearer abc123"), "abc123");
        assert_eq!(strip_bearer("BEARER  abc123"), "abc123");
        assert_eq!(strip_bearer("abc123"), "abc123");
        assert_eq!(strip_bearer(""), "");
    }
}
