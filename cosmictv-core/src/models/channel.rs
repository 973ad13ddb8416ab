use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::id::ChannelId;

/// A single catalog entry parsed out of a playlist file.
///
/// Channels are owned wholesale by the catalog store: whenever the source
/// file changes, every channel carrying that `source_file` is dropped and
/// re-parsed. The `id` is a slug and may collide across files; the
/// later-processed file wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub stream_url: String,
    /// Category slug
    pub category: String,
    /// Category display name
    pub category_name: String,
    pub is_live: bool,
    pub country: String,
    pub language: String,
    pub quality: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Origin playlist path; internal bookkeeping, not part of the API
    #[serde(skip)]
    pub source_file: PathBuf,
}

pub const DEFAULT_COUNTRY: &str = "AR";
pub const DEFAULT_LANGUAGE: &str = "es";
pub const DEFAULT_QUALITY: &str = "HD";

impl Channel {
    /// Build a channel with catalog defaults applied.
    #[must_use]
    pub fn new(id: ChannelId, title: String, stream_url: String, category: String, category_name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            description: title.clone(),
            title,
            thumbnail_url: String::new(),
            stream_url,
            category,
            category_name,
            is_live: true,
            country: DEFAULT_COUNTRY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            quality: DEFAULT_QUALITY.to_string(),
            created_at: now,
            updated_at: now,
            source_file: PathBuf::new(),
        }
    }
}

/// Category rollup derived on demand from the live channel set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// Category slug
    pub name: String,
    pub count: usize,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_defaults() {
        let ch = Channel::new(
            ChannelId::from("espn"),
            "ESPN".to_string(),
            "http://example.com/espn.m3u8".to_string(),
            "deportes".to_string(),
            "Deportes".to_string(),
        );

        assert!(ch.is_live);
        assert_eq!(ch.description, "ESPN");
        assert_eq!(ch.country, DEFAULT_COUNTRY);
        assert_eq!(ch.quality, DEFAULT_QUALITY);
    }

    #[test]
    fn test_channel_wire_field_names() {
        let ch = Channel::new(
            ChannelId::from("espn"),
            "ESPN".to_string(),
            "http://example.com/espn.m3u8".to_string(),
            "deportes".to_string(),
            "Deportes".to_string(),
        );

        let json = serde_json::to_value(&ch).unwrap();
        assert!(json.get("streamUrl").is_some());
        assert!(json.get("categoryName").is_some());
        assert!(json.get("isLive").is_some());
        assert!(json.get("sourceFile").is_none());
    }
}
