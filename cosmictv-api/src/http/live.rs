//! Viewer presence and like endpoints.
//!
//! Every mutation broadcasts the corresponding event to the stream's
//! topic before answering; the broadcast never blocks or fails the
//! request. Denials are structured bodies, not HTTP errors.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use cosmictv_core::models::{ChannelId, ViewerId};
use cosmictv_core::realtime::StreamEvent;

use super::channels::{STREAM_NOT_FOUND, SUBSCRIPTION_EXPIRED};
use super::middleware::AuthUser;
use super::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerBody {
    #[serde(default)]
    pub viewer_id: Option<String>,
}

/// Join / leave response envelope.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PresenceResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        viewer_id: String,
        viewer_count: usize,
        stream_id: ChannelId,
    },
    #[serde(rename_all = "camelCase")]
    Denied {
        active: bool,
        stream_id: ChannelId,
        error: String,
    },
}

fn denied(stream_id: ChannelId, error: &str) -> PresenceResponse {
    PresenceResponse::Denied {
        active: false,
        stream_id,
        error: error.to_string(),
    }
}

/// Broadcast the current live count of a stream to its topic.
fn broadcast_viewer_count(state: &AppState, stream_id: &ChannelId) -> usize {
    let viewer_count = state.presence.live_count(stream_id);
    state.hub.broadcast(&StreamEvent::ViewerCountUpdate {
        stream_id: stream_id.clone(),
        viewer_count,
    });
    viewer_count
}

/// POST /api/streams/{id}/join
pub async fn join_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<ViewerBody>>,
) -> Json<PresenceResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(denied(stream_id, SUBSCRIPTION_EXPIRED));
    }
    if !state.catalog.contains(&stream_id) {
        return Json(denied(stream_id, STREAM_NOT_FOUND));
    }

    let viewer_id = body
        .and_then(|Json(b)| b.viewer_id)
        .filter(|v| !v.is_empty())
        .map_or_else(ViewerId::new, ViewerId::from);

    state.presence.touch(&stream_id, &viewer_id);
    state.sessions.track(&user.username, &stream_id, &viewer_id);
    let viewer_count = broadcast_viewer_count(&state, &stream_id);

    Json(PresenceResponse::Active {
        active: true,
        viewer_id: viewer_id.to_string(),
        viewer_count,
        stream_id,
    })
}

/// Ping response has no viewer id.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PingResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        viewer_count: usize,
        stream_id: ChannelId,
    },
    #[serde(rename_all = "camelCase")]
    Denied {
        active: bool,
        stream_id: ChannelId,
        error: String,
    },
}

/// POST /api/streams/{id}/ping
///
/// The heartbeat: refreshes the viewer's presence entry within the TTL
/// window. Pings without a viewer id still succeed, they just refresh
/// nothing.
pub async fn ping_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<ViewerBody>>,
) -> Json<PingResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(PingResponse::Denied {
            active: false,
            stream_id,
            error: SUBSCRIPTION_EXPIRED.to_string(),
        });
    }
    if !state.catalog.contains(&stream_id) {
        return Json(PingResponse::Denied {
            active: false,
            stream_id,
            error: STREAM_NOT_FOUND.to_string(),
        });
    }

    if let Some(viewer_id) = body
        .and_then(|Json(b)| b.viewer_id)
        .filter(|v| !v.is_empty())
        .map(ViewerId::from)
    {
        state.presence.touch(&stream_id, &viewer_id);
        state.sessions.track(&user.username, &stream_id, &viewer_id);
    }

    Json(PingResponse::Active {
        active: true,
        viewer_count: state.presence.live_count(&stream_id),
        stream_id,
    })
}

/// POST /api/streams/{id}/leave
///
/// Leaving with a lapsed subscription is a soft success with a zero
/// count: there is nothing to tear down that the TTL will not collect.
pub async fn leave_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<ViewerBody>>,
) -> Json<PresenceResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(PresenceResponse::Active {
            active: true,
            viewer_id: String::new(),
            viewer_count: 0,
            stream_id,
        });
    }
    if !state.catalog.contains(&stream_id) {
        return Json(denied(stream_id, STREAM_NOT_FOUND));
    }

    let viewer_id = body
        .and_then(|Json(b)| b.viewer_id)
        .filter(|v| !v.is_empty())
        .map(ViewerId::from);

    if let Some(viewer_id) = &viewer_id {
        state.presence.remove(&stream_id, viewer_id);
        state.sessions.untrack(&user.username, &stream_id, viewer_id);
    }
    let viewer_count = broadcast_viewer_count(&state, &stream_id);

    Json(PresenceResponse::Active {
        active: true,
        viewer_id: viewer_id.map(|v| v.to_string()).unwrap_or_default(),
        viewer_count,
        stream_id,
    })
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ViewersResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        stream_id: ChannelId,
        viewer_count: usize,
        timestamp: String,
    },
    #[serde(rename_all = "camelCase")]
    Denied {
        active: bool,
        stream_id: ChannelId,
        viewer_count: usize,
        error: String,
    },
}

/// GET /api/streams/{id}/viewers
pub async fn viewer_count(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Json<ViewersResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(ViewersResponse::Active {
            active: true,
            stream_id,
            viewer_count: 0,
            timestamp: Utc::now().to_rfc3339(),
        });
    }
    if !state.catalog.contains(&stream_id) {
        return Json(ViewersResponse::Denied {
            active: false,
            stream_id,
            viewer_count: 0,
            error: STREAM_NOT_FOUND.to_string(),
        });
    }

    Json(ViewersResponse::Active {
        active: true,
        viewer_count: state.presence.live_count(&stream_id),
        stream_id,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeBody {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LikeResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        stream_id: ChannelId,
        likes: usize,
        liked: bool,
        timestamp: String,
    },
    #[serde(rename_all = "camelCase")]
    Denied {
        active: bool,
        stream_id: ChannelId,
        likes: usize,
        liked: bool,
        error: String,
    },
}

fn like_denied(stream_id: ChannelId, error: &str) -> LikeResponse {
    LikeResponse::Denied {
        active: false,
        stream_id,
        likes: 0,
        liked: false,
        error: error.to_string(),
    }
}

/// POST /api/streams/{id}/like
///
/// One vote per user, toggled: liking twice reverts to not-liked.
pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<LikeBody>>,
) -> AppResult<Json<LikeResponse>> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Ok(Json(like_denied(stream_id, SUBSCRIPTION_EXPIRED)));
    }
    if !state.catalog.contains(&stream_id) {
        return Ok(Json(like_denied(stream_id, STREAM_NOT_FOUND)));
    }

    let user_id = body
        .and_then(|Json(b)| b.user_id)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::bad_request("userId es requerido"))?;

    let (likes, liked) = state.interactions.toggle_like(&stream_id, &user_id)?;
    state.hub.broadcast(&StreamEvent::LikeUpdate {
        stream_id: stream_id.clone(),
        likes,
    });

    Ok(Json(LikeResponse::Active {
        active: true,
        stream_id,
        likes,
        liked,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// GET /api/streams/{id}/likes?userId=
pub async fn get_likes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<LikesQuery>,
) -> Json<LikeResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(like_denied(stream_id, SUBSCRIPTION_EXPIRED));
    }
    if !state.catalog.contains(&stream_id) {
        return Json(like_denied(stream_id, STREAM_NOT_FOUND));
    }

    let (likes, liked) = state
        .interactions
        .likes(&stream_id, query.user_id.as_deref());

    Json(LikeResponse::Active {
        active: true,
        stream_id,
        likes,
        liked,
        timestamp: Utc::now().to_rfc3339(),
    })
}
