// Module: http
// HTTP/JSON REST API plus the WebSocket realtime endpoint

pub mod admin;
pub mod auth;
pub mod channels;
pub mod chat;
pub mod error;
pub mod health;
pub mod live;
pub mod middleware;
pub mod notifications;
pub mod ui_config;
pub mod websocket;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use parking_lot::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cosmictv_core::catalog::CatalogStore;
use cosmictv_core::notifier::{DeviceRegistry, NotificationService, Notifier};
use cosmictv_core::realtime::StreamHub;
use cosmictv_core::service::{
    Authenticator, InteractionStore, PresenceTracker, SessionRegistry, SubscriptionGate,
};
use cosmictv_core::Config;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<CatalogStore>,
    pub presence: Arc<PresenceTracker>,
    pub interactions: Arc<InteractionStore>,
    pub sessions: Arc<SessionRegistry>,
    pub hub: Arc<StreamHub>,
    pub authenticator: Arc<dyn Authenticator>,
    pub gate: SubscriptionGate,
    pub devices: Arc<DeviceRegistry>,
    pub notifications: Arc<NotificationService>,
    pub ui_config: Arc<RwLock<serde_json::Value>>,
}

impl AppState {
    /// Wire the state up from its parts.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<CatalogStore>,
        presence: Arc<PresenceTracker>,
        interactions: Arc<InteractionStore>,
        sessions: Arc<SessionRegistry>,
        hub: Arc<StreamHub>,
        authenticator: Arc<dyn Authenticator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let gate = SubscriptionGate::new(authenticator.clone());
        let devices = Arc::new(DeviceRegistry::new());
        let notifications = Arc::new(NotificationService::new(notifier, devices.clone()));

        Self {
            config,
            catalog,
            presence,
            interactions,
            sessions,
            hub,
            authenticator,
            gate,
            devices,
            notifications,
            ui_config: Arc::new(RwLock::new(ui_config::default_ui_config())),
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health, banner and manual reload
        .merge(health::create_health_router())
        // Authentication and self-service
        .route("/api/login", post(auth::login))
        .route("/api/me/subscription", get(auth::my_subscription))
        .route("/api/me/sessions/count", get(auth::my_session_count))
        // Catalog reads (gated)
        .route("/api/streams", get(channels::list_streams))
        .route("/api/streams/featured", get(channels::featured_streams))
        .route("/api/streams/search", get(channels::search_streams))
        .route(
            "/api/streams/category/{category}",
            get(channels::streams_by_category),
        )
        .route("/api/streams/{id}", get(channels::get_stream))
        .route("/api/categories", get(channels::list_categories))
        // Viewer presence and likes (gated)
        .route("/api/streams/{id}/join", post(live::join_stream))
        .route("/api/streams/{id}/ping", post(live::ping_stream))
        .route("/api/streams/{id}/leave", post(live::leave_stream))
        .route("/api/streams/{id}/viewers", get(live::viewer_count))
        .route("/api/streams/{id}/like", post(live::toggle_like))
        .route("/api/streams/{id}/likes", get(live::get_likes))
        // Chat (gated)
        .route(
            "/api/streams/{id}/chat",
            post(chat::post_message)
                .get(chat::get_messages)
                .delete(chat::clear_messages),
        )
        // UI configuration
        .route(
            "/api/ui-config",
            get(ui_config::get_config).put(ui_config::put_config),
        )
        .route(
            "/api/ui-config/{section}",
            get(ui_config::get_section).put(ui_config::put_section),
        )
        // Device registration for push notifications
        .route("/api/fcm/register", post(notifications::register_device))
        .route("/api/fcm/unregister", post(notifications::unregister_device))
        .route("/api/fcm/stats", get(notifications::device_stats))
        // Admin surface (shared secret)
        .nest("/api/admin", admin::create_admin_router())
        // WebSocket endpoint for realtime fan-out
        .route("/ws", get(websocket::websocket_handler));

    // Apply layers before state
    let router = router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Apply state to all routes (must be last)
    router.with_state(state)
}
