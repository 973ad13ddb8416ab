use serde::{Deserialize, Serialize};

use crate::models::{ChannelId, ChatMessage};

/// Events fanned out to the subscribers of a stream topic.
///
/// This is a closed union: every state change that reaches subscribers is
/// one of these three kinds, and consumers match exhaustively. The serde
/// tags are the wire event names the client already speaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Live viewer count changed (join, leave, ping, disconnect)
    #[serde(rename = "viewer-count-update", rename_all = "camelCase")]
    ViewerCountUpdate {
        stream_id: ChannelId,
        viewer_count: usize,
    },

    /// Like counter changed
    #[serde(rename = "like-update", rename_all = "camelCase")]
    LikeUpdate { stream_id: ChannelId, likes: usize },

    /// Chat message appended
    #[serde(rename = "chat-message", rename_all = "camelCase")]
    ChatMessagePosted {
        stream_id: ChannelId,
        message: ChatMessage,
    },
}

impl StreamEvent {
    /// The topic this event belongs to.
    #[must_use]
    pub const fn stream_id(&self) -> &ChannelId {
        match self {
            Self::ViewerCountUpdate { stream_id, .. }
            | Self::LikeUpdate { stream_id, .. }
            | Self::ChatMessagePosted { stream_id, .. } => stream_id,
        }
    }

    /// Short wire name of the event kind.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::ViewerCountUpdate { .. } => "viewer-count-update",
            Self::LikeUpdate { .. } => "like-update",
            Self::ChatMessagePosted { .. } => "chat-message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_count_serialization() {
        let event = StreamEvent::ViewerCountUpdate {
            stream_id: ChannelId::from("canal"),
            viewer_count: 3,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "viewer-count-update");
        assert_eq!(json["streamId"], "canal");
        assert_eq!(json["viewerCount"], 3);
    }

    #[test]
    fn test_like_update_roundtrip() {
        let event = StreamEvent::LikeUpdate {
            stream_id: ChannelId::from("canal"),
            likes: 7,
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type(), "like-update");
        assert_eq!(back.stream_id().as_str(), "canal");
    }

    #[test]
    fn test_chat_message_carries_payload() {
        let event = StreamEvent::ChatMessagePosted {
            stream_id: ChannelId::from("canal"),
            message: ChatMessage::new("ana".to_string(), "hola".to_string()),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "chat-message");
        assert_eq!(json["message"]["username"], "ana");
        assert_eq!(json["message"]["colorHex"], "#00BFFF");
    }
}
