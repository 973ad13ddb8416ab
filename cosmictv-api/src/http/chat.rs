//! Chat endpoints: post, paginate, clear.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use cosmictv_core::models::{ChannelId, ChatMessage};
use cosmictv_core::realtime::StreamEvent;

use super::channels::{STREAM_NOT_FOUND, SUBSCRIPTION_EXPIRED};
use super::middleware::AuthUser;
use super::{AppError, AppResult, AppState};

const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct PostChatBody {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PostChatResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        stream_id: ChannelId,
        message: ChatMessage,
        timestamp: String,
    },
    #[serde(rename_all = "camelCase")]
    Denied {
        active: bool,
        stream_id: ChannelId,
        error: String,
    },
}

/// POST /api/streams/{id}/chat
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<PostChatBody>>,
) -> AppResult<Json<PostChatResponse>> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Ok(Json(PostChatResponse::Denied {
            active: false,
            stream_id,
            error: SUBSCRIPTION_EXPIRED.to_string(),
        }));
    }
    if !state.catalog.contains(&stream_id) {
        return Ok(Json(PostChatResponse::Denied {
            active: false,
            stream_id,
            error: STREAM_NOT_FOUND.to_string(),
        }));
    }

    let body = body.map(|Json(b)| b).unwrap_or_default();
    let (Some(username), Some(message)) = (
        body.username.filter(|u| !u.is_empty()),
        body.message.filter(|m| !m.is_empty()),
    ) else {
        return Err(AppError::bad_request("Username y message son requeridos"));
    };

    let msg = state.interactions.post_message(&stream_id, &username, &message)?;
    state.hub.broadcast(&StreamEvent::ChatMessagePosted {
        stream_id: stream_id.clone(),
        message: msg.clone(),
    });

    Ok(Json(PostChatResponse::Active {
        active: true,
        stream_id,
        message: msg,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChatPageQuery {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatPageResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        stream_id: ChannelId,
        messages: Vec<ChatMessage>,
        total_messages: usize,
        offset: usize,
        limit: usize,
        timestamp: String,
    },
    /// Expired subscription: empty results, but not an error.
    #[serde(rename_all = "camelCase")]
    Empty {
        active: bool,
        stream_id: ChannelId,
        messages: Vec<ChatMessage>,
        total_messages: usize,
        timestamp: String,
    },
    #[serde(rename_all = "camelCase")]
    NotFound {
        active: bool,
        stream_id: ChannelId,
        messages: Vec<ChatMessage>,
        total_messages: usize,
        error: String,
    },
}

/// GET /api/streams/{id}/chat?offset=&limit=
///
/// `limit` is clamped to [1, 200], `offset` to >= 0.
pub async fn get_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<ChatPageQuery>,
) -> Json<ChatPageResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(ChatPageResponse::Empty {
            active: true,
            stream_id,
            messages: Vec::new(),
            total_messages: 0,
            timestamp: Utc::now().to_rfc3339(),
        });
    }
    if !state.catalog.contains(&stream_id) {
        return Json(ChatPageResponse::NotFound {
            active: false,
            stream_id,
            messages: Vec::new(),
            total_messages: 0,
            error: STREAM_NOT_FOUND.to_string(),
        });
    }

    let offset = usize::try_from(query.offset.unwrap_or(0).max(0)).unwrap_or(0);
    let limit = usize::try_from(
        query
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT as i64)
            .clamp(1, 200),
    )
    .unwrap_or(DEFAULT_PAGE_LIMIT);

    let (messages, total_messages) = state.interactions.messages(&stream_id, offset, limit);

    Json(ChatPageResponse::Active {
        active: true,
        stream_id,
        messages,
        total_messages,
        offset,
        limit,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ClearChatResponse {
    #[serde(rename_all = "camelCase")]
    Active {
        active: bool,
        stream_id: ChannelId,
        message: String,
        timestamp: String,
    },
    #[serde(rename_all = "camelCase")]
    Denied {
        active: bool,
        stream_id: ChannelId,
        error: String,
    },
}

/// DELETE /api/streams/{id}/chat
///
/// Administrative wipe of one stream's log; there is no undo.
pub async fn clear_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Json<ClearChatResponse> {
    let stream_id = ChannelId::from(id);

    if state.gate.is_expired(&user.username) {
        return Json(ClearChatResponse::Denied {
            active: false,
            stream_id,
            error: SUBSCRIPTION_EXPIRED.to_string(),
        });
    }
    if !state.catalog.contains(&stream_id) {
        return Json(ClearChatResponse::Denied {
            active: false,
            stream_id,
            error: STREAM_NOT_FOUND.to_string(),
        });
    }

    state.interactions.clear_messages(&stream_id);
    info!(stream_id = %stream_id, user = %user.username, "Chat cleared");

    Json(ClearChatResponse::Active {
        active: true,
        stream_id,
        message: "Chat limpiado".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
