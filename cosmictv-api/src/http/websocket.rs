//! WebSocket endpoint for realtime stream events.
//!
//! A connection joins and leaves stream topics with JSON actions and
//! receives the topic's events as they happen. Joining doubles as a
//! presence touch; the periodic `ping` action keeps the viewer inside
//! the TTL window. A transport disconnect tears presence down the same
//! way an explicit leave does, so a vanished client cannot inflate
//! viewer counts past the TTL.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use cosmictv_core::models::id::generate_id;
use cosmictv_core::models::{ChannelId, ViewerId};
use cosmictv_core::realtime::StreamEvent;

use super::AppState;

/// Client-to-server actions.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    #[serde(rename = "join-channel", rename_all = "camelCase")]
    Join {
        stream_id: String,
        #[serde(default)]
        viewer_id: Option<String>,
    },
    #[serde(rename = "leave-channel", rename_all = "camelCase")]
    Leave {
        stream_id: String,
        #[serde(default)]
        viewer_id: Option<String>,
    },
    #[serde(rename = "ping", rename_all = "camelCase")]
    Ping {
        stream_id: String,
        #[serde(default)]
        viewer_id: Option<String>,
    },
}

/// Direct acknowledgement to the joining connection only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinedAck<'a> {
    r#type: &'static str,
    stream_id: &'a ChannelId,
    viewer_id: &'a ViewerId,
}

/// GET /ws
///
/// The socket layer is connection-scoped: join only needs a stream id
/// the catalog knows. The gated surface is the REST API.
pub async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // 64KB is plenty for join/leave/ping frames
    ws.max_message_size(64 * 1024)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = generate_id();
    info!(connection_id = %connection_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Outbound frames funnel through one channel so the event forwarder
    // and direct acks cannot interleave partial writes.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

    // Events from the hub for every topic this connection joins.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<StreamEvent>();

    let forward_events = {
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if out_tx.send(Message::Text(text.into())).is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode stream event: {e}"),
                }
            }
        })
    };

    let write_frames = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if ws_sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    // Topics this connection joined, with the viewer identity used there.
    let mut joined: HashMap<ChannelId, ViewerId> = HashMap::new();

    while let Some(frame) = ws_stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue, // binary, ping, pong
        };

        let msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(connection_id = %connection_id, "Ignoring unparsable frame: {e}");
                continue;
            }
        };

        match msg {
            ClientMessage::Join {
                stream_id,
                viewer_id,
            } => {
                let stream_id = ChannelId::from(stream_id);
                if !state.catalog.contains(&stream_id) {
                    continue;
                }

                let viewer_id = viewer_id
                    .filter(|v| !v.is_empty())
                    .map_or_else(|| ViewerId::from(connection_id.as_str()), ViewerId::from);

                state.hub.subscribe(
                    stream_id.clone(),
                    viewer_id.clone(),
                    connection_id.clone(),
                    event_tx.clone(),
                );
                state.presence.touch(&stream_id, &viewer_id);
                broadcast_count(&state, &stream_id);

                let ack = JoinedAck {
                    r#type: "joined-channel",
                    stream_id: &stream_id,
                    viewer_id: &viewer_id,
                };
                if let Ok(text) = serde_json::to_string(&ack) {
                    let _ = out_tx.send(Message::Text(text.into()));
                }

                joined.insert(stream_id, viewer_id);
            }
            ClientMessage::Leave {
                stream_id,
                viewer_id,
            } => {
                let stream_id = ChannelId::from(stream_id);
                if !state.catalog.contains(&stream_id) {
                    continue;
                }

                let viewer_id = viewer_id
                    .filter(|v| !v.is_empty())
                    .map_or_else(|| ViewerId::from(connection_id.as_str()), ViewerId::from);

                state.hub.unsubscribe(&connection_id, &stream_id);
                state.presence.remove(&stream_id, &viewer_id);
                broadcast_count(&state, &stream_id);
                joined.remove(&stream_id);
            }
            ClientMessage::Ping {
                stream_id,
                viewer_id,
            } => {
                let stream_id = ChannelId::from(stream_id);
                if !state.catalog.contains(&stream_id) {
                    continue;
                }

                let viewer_id = viewer_id
                    .filter(|v| !v.is_empty())
                    .map_or_else(|| ViewerId::from(connection_id.as_str()), ViewerId::from);

                state.presence.touch(&stream_id, &viewer_id);
                broadcast_count(&state, &stream_id);
            }
        }
    }

    // Disconnect runs the same teardown as explicit leaves: drop the
    // presence entries and tell remaining subscribers the new counts.
    state.hub.unsubscribe_all(&connection_id);
    for (stream_id, viewer_id) in joined {
        state.presence.remove(&stream_id, &viewer_id);
        broadcast_count(&state, &stream_id);
    }

    forward_events.abort();
    write_frames.abort();
    info!(connection_id = %connection_id, "WebSocket connection closed");
}

fn broadcast_count(state: &AppState, stream_id: &ChannelId) {
    let viewer_count = state.presence.live_count(stream_id);
    state.hub.broadcast(&StreamEvent::ViewerCountUpdate {
        stream_id: stream_id.clone(),
        viewer_count,
    });
}
