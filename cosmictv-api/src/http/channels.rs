//! Gated catalog reads.
//!
//! An expired subscription never errors here: list endpoints answer with
//! an empty collection and the detail endpoint with a structured denial,
//! so the client degrades to "no channels" without special cases.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use cosmictv_core::models::{CategorySummary, Channel, ChannelId};
use cosmictv_core::service::auth::username_from_token;

use super::middleware::AuthUser;
use super::AppState;

pub const SUBSCRIPTION_EXPIRED: &str = "SUBSCRIPTION_EXPIRED";
pub const STREAM_NOT_FOUND: &str = "Stream no encontrado";

/// How many channels the featured rail shows.
const FEATURED_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// GET /api/streams?category=
pub async fn list_streams(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Channel>> {
    if state.gate.is_expired(&user.username) {
        return Json(Vec::new());
    }

    let channels = match query.category.as_deref() {
        Some(category) if category != "all" => state.catalog.by_category(category),
        _ => state.catalog.snapshot().as_ref().clone(),
    };
    Json(channels)
}

/// GET /api/streams/featured
pub async fn featured_streams(
    State(state): State<AppState>,
    user: AuthUser,
) -> Json<Vec<Channel>> {
    if state.gate.is_expired(&user.username) {
        return Json(Vec::new());
    }

    let channels = state
        .catalog
        .snapshot()
        .iter()
        .take(FEATURED_COUNT)
        .cloned()
        .collect();
    Json(channels)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}

/// GET /api/streams/search?query=
pub async fn search_streams(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Channel>> {
    if state.gate.is_expired(&user.username) {
        return Json(Vec::new());
    }

    Json(state.catalog.search(query.query.as_deref().unwrap_or("")))
}

/// GET /api/streams/category/{category}
pub async fn streams_by_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category): Path<String>,
) -> Json<Vec<Channel>> {
    if state.gate.is_expired(&user.username) {
        return Json(Vec::new());
    }

    Json(state.catalog.by_category(&category))
}

/// Detail response: either the channel decorated with live counters, or
/// a structured denial.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StreamDetailResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        #[serde(flatten)]
        channel: Channel,
        viewer_count: usize,
        likes: usize,
    },
    #[serde(rename_all = "camelCase")]
    Denied {
        active: bool,
        error: String,
        stream_id: ChannelId,
    },
}

/// GET /api/streams/{id}
pub async fn get_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Json<StreamDetailResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(StreamDetailResponse::Denied {
            active: false,
            error: SUBSCRIPTION_EXPIRED.to_string(),
            stream_id,
        });
    }

    let Some(channel) = state.catalog.get(&stream_id) else {
        return Json(StreamDetailResponse::Denied {
            active: false,
            error: STREAM_NOT_FOUND.to_string(),
            stream_id,
        });
    };

    let (likes, _) = state.interactions.likes(&stream_id, None);
    Json(StreamDetailResponse::Active {
        active: true,
        viewer_count: state.presence.live_count(&stream_id),
        likes,
        channel,
    })
}

/// GET /api/categories
///
/// Authentication is optional here; the gate only applies when a token
/// is actually presented, so an unauthenticated client still sees the
/// category rail.
pub async fn list_categories(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Vec<CategorySummary>> {
    if let Some(token) = super::middleware::bearer_token(&headers) {
        if let Ok(username) = username_from_token(&token) {
            if state.gate.is_expired(&username) {
                return Json(Vec::new());
            }
        }
    }

    Json(state.catalog.categories())
}
