use serde::{Deserialize, Serialize};

/// Display color applied to every chat message.
pub const CHAT_COLOR_HEX: &str = "#00BFFF";

/// A chat message in a stream's volatile, insertion-ordered log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String, // nanoid(12)
    pub username: String,
    pub message: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub color_hex: String,
}

impl ChatMessage {
    pub fn new(username: String, message: String) -> Self {
        Self {
            id: super::id::generate_id(),
            username,
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
            color_hex: CHAT_COLOR_HEX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message() {
        let msg = ChatMessage::new("ana".to_string(), "hola".to_string());
        assert_eq!(msg.id.len(), 12);
        assert_eq!(msg.color_hex, CHAT_COLOR_HEX);
        assert!(msg.timestamp > 0);
    }

    #[test]
    fn test_wire_field_names() {
        let msg = ChatMessage::new("ana".to_string(), "hola".to_string());
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("colorHex").is_some());
        assert!(json.get("timestamp").is_some());
    }
}
