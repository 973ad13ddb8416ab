//! Router-level tests: the wire surface end to end, gate included.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use cosmictv_core::catalog::CatalogStore;
use cosmictv_core::notifier::LogNotifier;
use cosmictv_core::realtime::StreamHub;
use cosmictv_core::service::auth::issue_token;
use cosmictv_core::service::{
    FileAuthenticator, InteractionStore, PresenceTracker, SessionRegistry,
};
use cosmictv_core::Config;

use super::{create_router, AppState};

const ADMIN_KEY: &str = "llave-admin";

struct TestServer {
    router: Router,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = if let Some(body) = body {
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

async fn test_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();

    let channels_dir = dir.path().join("channels");
    std::fs::create_dir(&channels_dir).unwrap();
    std::fs::write(
        channels_dir.join("deportes.m3u8"),
        "#EXTINF:-1,ESPN\nhttp://cdn.tv/espn.m3u8\n#EXTINF:-1,TyC Sports\nhttp://cdn.tv/tyc.m3u8\n",
    )
    .unwrap();
    std::fs::write(channels_dir.join("noticias.m3u"), "http://news.tv/live.m3u8\n").unwrap();

    let users_file = dir.path().join("users.json");
    let future = (Utc::now() + Duration::days(30)).to_rfc3339();
    let past = (Utc::now() - Duration::days(1)).to_rfc3339();
    std::fs::write(
        &users_file,
        serde_json::json!({
            "users": [
                {"username": "vigente", "password": "secreto", "name": "Vigente", "expiresAt": future},
                {"username": "vencido", "password": "secreto", "name": "Vencido", "expiresAt": past},
                {"username": "sin-expiracion", "password": "secreto", "name": "Sin"},
            ]
        })
        .to_string(),
    )
    .unwrap();

    let mut config = Config::default();
    config.channels.dir = channels_dir.to_string_lossy().into_owned();
    config.auth.users_file = users_file.to_string_lossy().into_owned();
    config.auth.admin_api_key = Some(ADMIN_KEY.to_string());

    let catalog = Arc::new(CatalogStore::new());
    catalog.rescan(&channels_dir).await.unwrap();

    let state = AppState::new(
        Arc::new(config),
        catalog,
        Arc::new(PresenceTracker::default()),
        Arc::new(InteractionStore::new()),
        Arc::new(SessionRegistry::default()),
        Arc::new(StreamHub::new()),
        Arc::new(FileAuthenticator::new(&users_file)),
        Arc::new(LogNotifier),
    );

    TestServer {
        router: create_router(state),
        _dir: dir,
    }
}

#[tokio::test]
async fn test_login_success_carries_days_remaining() {
    let server = test_server().await;

    let (status, body) = server
        .request(
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({"username": "vigente", "password": "secreto"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().unwrap().len() > 10);
    assert_eq!(body["user"]["username"], "vigente");
    assert_eq!(body["daysRemaining"], 30);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let server = test_server().await;

    let (status, body) = server
        .request(
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({"username": "vigente", "password": "nope"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Credenciales inválidas");

    let (status, body) = server
        .request(
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({"username": "vigente"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Faltan credenciales");
}

#[tokio::test]
async fn test_login_simulates_trial_for_accounts_without_expiry() {
    let server = test_server().await;

    let (_, body) = server
        .request(
            "POST",
            "/api/login",
            None,
            Some(serde_json::json!({"username": "sin-expiracion", "password": "secreto"})),
        )
        .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["daysRemaining"], 3);
}

#[tokio::test]
async fn test_streams_require_auth() {
    let server = test_server().await;

    let (status, body) = server.request("GET", "/api/streams", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NO_AUTH");

    let (status, body) = server
        .request("GET", "/api/streams", Some("!!!garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_active_user_sees_catalog() {
    let server = test_server().await;
    let token = issue_token("vigente");

    let (status, body) = server
        .request("GET", "/api/streams", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = server
        .request("GET", "/api/streams?category=deportes", Some(&token), None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_expired_user_sees_empty_catalog() {
    let server = test_server().await;
    let token = issue_token("vencido");

    let (status, body) = server
        .request("GET", "/api/streams", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));

    // Never-set expiry is just as locked out (fail closed).
    let token = issue_token("sin-expiracion");
    let (_, body) = server
        .request("GET", "/api/streams", Some(&token), None)
        .await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_stream_detail_envelopes() {
    let server = test_server().await;
    let token = issue_token("vigente");

    let (_, body) = server
        .request("GET", "/api/streams/espn", Some(&token), None)
        .await;
    assert_eq!(body["active"], true);
    assert_eq!(body["title"], "ESPN");
    assert_eq!(body["viewerCount"], 0);
    assert_eq!(body["likes"], 0);

    let (status, body) = server
        .request("GET", "/api/streams/no-existe", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);
    assert_eq!(body["error"], "Stream no encontrado");
    assert_eq!(body["streamId"], "no-existe");

    let expired = issue_token("vencido");
    let (_, body) = server
        .request("GET", "/api/streams/espn", Some(&expired), None)
        .await;
    assert_eq!(body["active"], false);
    assert_eq!(body["error"], "SUBSCRIPTION_EXPIRED");
}

#[tokio::test]
async fn test_search_and_categories() {
    let server = test_server().await;
    let token = issue_token("vigente");

    let (_, body) = server
        .request("GET", "/api/streams/search?query=espn", Some(&token), None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Categories answer without authentication.
    let (_, body) = server.request("GET", "/api/categories", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // ...but an expired token empties them.
    let expired = issue_token("vencido");
    let (_, body) = server
        .request("GET", "/api/categories", Some(&expired), None)
        .await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_join_ping_leave_flow() {
    let server = test_server().await;
    let token = issue_token("vigente");

    let (_, body) = server
        .request(
            "POST",
            "/api/streams/espn/join",
            Some(&token),
            Some(serde_json::json!({"viewerId": "v-1"})),
        )
        .await;
    assert_eq!(body["active"], true);
    assert_eq!(body["viewerId"], "v-1");
    assert_eq!(body["viewerCount"], 1);

    let (_, body) = server
        .request("GET", "/api/streams/espn/viewers", Some(&token), None)
        .await;
    assert_eq!(body["viewerCount"], 1);

    let (_, body) = server
        .request(
            "POST",
            "/api/streams/espn/leave",
            Some(&token),
            Some(serde_json::json!({"viewerId": "v-1"})),
        )
        .await;
    assert_eq!(body["active"], true);
    assert_eq!(body["viewerCount"], 0);
}

#[tokio::test]
async fn test_join_without_viewer_id_generates_one() {
    let server = test_server().await;
    let token = issue_token("vigente");

    let (_, body) = server
        .request("POST", "/api/streams/espn/join", Some(&token), Some(serde_json::json!({})))
        .await;

    assert_eq!(body["active"], true);
    assert_eq!(body["viewerId"].as_str().unwrap().len(), 12);
}

#[tokio::test]
async fn test_join_denials() {
    let server = test_server().await;

    let expired = issue_token("vencido");
    let (status, body) = server
        .request("POST", "/api/streams/espn/join", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);
    assert_eq!(body["error"], "SUBSCRIPTION_EXPIRED");

    let token = issue_token("vigente");
    let (_, body) = server
        .request("POST", "/api/streams/no-existe/join", Some(&token), None)
        .await;
    assert_eq!(body["active"], false);
    assert_eq!(body["error"], "Stream no encontrado");
}

#[tokio::test]
async fn test_expired_leave_is_soft_success() {
    let server = test_server().await;
    let expired = issue_token("vencido");

    let (_, body) = server
        .request("POST", "/api/streams/espn/leave", Some(&expired), None)
        .await;

    assert_eq!(body["active"], true);
    assert_eq!(body["viewerId"], "");
    assert_eq!(body["viewerCount"], 0);
}

#[tokio::test]
async fn test_like_toggle_over_http() {
    let server = test_server().await;
    let token = issue_token("vigente");
    let payload = serde_json::json!({"userId": "vigente"});

    let (_, body) = server
        .request("POST", "/api/streams/espn/like", Some(&token), Some(payload.clone()))
        .await;
    assert_eq!(body["likes"], 1);
    assert_eq!(body["liked"], true);

    let (_, body) = server
        .request("POST", "/api/streams/espn/like", Some(&token), Some(payload))
        .await;
    assert_eq!(body["likes"], 0);
    assert_eq!(body["liked"], false);
}

#[tokio::test]
async fn test_like_requires_user_id() {
    let server = test_server().await;
    let token = issue_token("vigente");

    let (status, body) = server
        .request("POST", "/api/streams/espn/like", Some(&token), Some(serde_json::json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId es requerido");
}

#[tokio::test]
async fn test_chat_post_and_pagination() {
    let server = test_server().await;
    let token = issue_token("vigente");

    for i in 0..5 {
        let (_, body) = server
            .request(
                "POST",
                "/api/streams/espn/chat",
                Some(&token),
                Some(serde_json::json!({"username": "ana", "message": format!("mensaje {i}")})),
            )
            .await;
        assert_eq!(body["active"], true);
        assert_eq!(body["message"]["colorHex"], "#00BFFF");
    }

    let (_, body) = server
        .request(
            "GET",
            "/api/streams/espn/chat?offset=0&limit=2",
            Some(&token),
            None,
        )
        .await;

    assert_eq!(body["totalMessages"], 5);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["message"], "mensaje 0");
    assert_eq!(messages[1]["message"], "mensaje 1");
}

#[tokio::test]
async fn test_chat_requires_fields() {
    let server = test_server().await;
    let token = issue_token("vigente");

    let (status, body) = server
        .request(
            "POST",
            "/api/streams/espn/chat",
            Some(&token),
            Some(serde_json::json!({"username": "ana"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username y message son requeridos");
}

#[tokio::test]
async fn test_chat_clear() {
    let server = test_server().await;
    let token = issue_token("vigente");

    server
        .request(
            "POST",
            "/api/streams/espn/chat",
            Some(&token),
            Some(serde_json::json!({"username": "ana", "message": "hola"})),
        )
        .await;

    let (_, body) = server
        .request("DELETE", "/api/streams/espn/chat", Some(&token), None)
        .await;
    assert_eq!(body["message"], "Chat limpiado");

    let (_, body) = server
        .request("GET", "/api/streams/espn/chat", Some(&token), None)
        .await;
    assert_eq!(body["totalMessages"], 0);
}

#[tokio::test]
async fn test_subscription_status_answerable_when_expired() {
    let server = test_server().await;
    let expired = issue_token("vencido");

    let (status, body) = server
        .request("GET", "/api/me/subscription", Some(&expired), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["username"], "vencido");
    assert_eq!(body["daysRemaining"], 0);
}

#[tokio::test]
async fn test_admin_requires_shared_secret() {
    let server = test_server().await;

    let (status, _) = server
        .request("GET", "/api/admin/users/active-sessions", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A user token is not an admin credential.
    let token = issue_token("vigente");
    let (status, _) = server
        .request("GET", "/api/admin/users/active-sessions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server
        .request(
            "GET",
            "/api/admin/users/active-sessions",
            Some(ADMIN_KEY),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_admin_sees_tracked_sessions() {
    let server = test_server().await;
    let token = issue_token("vigente");

    server
        .request(
            "POST",
            "/api/streams/espn/join",
            Some(&token),
            Some(serde_json::json!({"viewerId": "v-1"})),
        )
        .await;

    let (_, body) = server
        .request(
            "GET",
            "/api/admin/users/vigente/active-sessions",
            Some(ADMIN_KEY),
            None,
        )
        .await;

    assert_eq!(body["activeSessions"], 1);
    assert_eq!(body["sessions"][0]["streamId"], "espn");
    assert_eq!(body["sessions"][0]["viewerId"], "v-1");
}

#[tokio::test]
async fn test_admin_notification_flow() {
    let server = test_server().await;

    server
        .request(
            "POST",
            "/api/fcm/register",
            None,
            Some(serde_json::json!({"token": "tok-1", "userId": "ana"})),
        )
        .await;

    let (_, body) = server
        .request(
            "POST",
            "/api/admin/notifications/send",
            Some(ADMIN_KEY),
            Some(serde_json::json!({"title": "Aviso", "message": "Hola"})),
        )
        .await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["notification"]["recipients"], 1);
    assert_eq!(body["notification"]["fcm_result"]["mode"], "simulation");

    let (_, body) = server
        .request("GET", "/api/admin/notifications/history", Some(ADMIN_KEY), None)
        .await;
    assert_eq!(body["history"].as_array().unwrap().len(), 1);

    let (status, body) = server
        .request(
            "POST",
            "/api/admin/notifications/send",
            Some(ADMIN_KEY),
            Some(serde_json::json!({"title": "Sin mensaje"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Título y mensaje son requeridos");
}

#[tokio::test]
async fn test_device_registration_stats() {
    let server = test_server().await;

    let (status, body) = server
        .request("POST", "/api/fcm/register", None, Some(serde_json::json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Falta token");

    server
        .request(
            "POST",
            "/api/fcm/register",
            None,
            Some(serde_json::json!({"token": "tok-1"})),
        )
        .await;
    let (_, body) = server.request("GET", "/api/fcm/stats", None, None).await;
    assert_eq!(body["totalUsers"], 1);
    assert_eq!(body["totalTokens"], 1);

    server
        .request(
            "POST",
            "/api/fcm/unregister",
            None,
            Some(serde_json::json!({"token": "tok-1"})),
        )
        .await;
    let (_, body) = server.request("GET", "/api/fcm/stats", None, None).await;
    assert_eq!(body["totalTokens"], 0);
}

#[tokio::test]
async fn test_health_and_reload() {
    let server = test_server().await;

    let (_, body) = server.request("GET", "/health", None, None).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["streams"], 3);

    let (_, body) = server.request("POST", "/api/reload", None, None).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["streams"], 3);
}

#[tokio::test]
async fn test_ui_config_roundtrip() {
    let server = test_server().await;

    let (_, body) = server.request("GET", "/api/ui-config", None, None).await;
    assert_eq!(body["config"]["theme"], "dark");

    let (_, body) = server
        .request(
            "PUT",
            "/api/ui-config",
            None,
            Some(serde_json::json!({"theme": "light"})),
        )
        .await;
    assert_eq!(body["config"]["theme"], "light");
    assert_eq!(body["config"]["featuredCategory"], "deportes");

    let (_, body) = server
        .request(
            "PUT",
            "/api/ui-config/theme",
            None,
            Some(serde_json::json!({"value": "dark"})),
        )
        .await;
    assert_eq!(body["data"]["theme"], "dark");

    let (_, body) = server
        .request("GET", "/api/ui-config/theme", None, None)
        .await;
    assert_eq!(body["data"]["theme"], "dark");
}
