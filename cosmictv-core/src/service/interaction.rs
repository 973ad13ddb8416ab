//! Per-stream like counters and chat logs.
//!
//! Likes are a one-vote-per-user toggle; the count is derived from the
//! voter set, so the `likes == |liked_by|` invariant holds by
//! construction. Chat is an append-only, insertion-ordered log with
//! clamped offset/limit pagination. All state is volatile.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::models::{ChannelId, ChatMessage};
use crate::{Error, Result};

/// Page size bounds for chat history queries.
pub const CHAT_LIMIT_MIN: usize = 1;
pub const CHAT_LIMIT_MAX: usize = 200;

#[derive(Debug, Default)]
struct LikeEntry {
    liked_by: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct InteractionStore {
    likes: DashMap<ChannelId, LikeEntry>,
    chat: DashMap<ChannelId, Vec<ChatMessage>>,
}

impl InteractionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a user's like on a stream.
    ///
    /// Returns the new count and whether the user likes the stream now.
    /// The dashmap entry guard serializes concurrent toggles on the same
    /// stream, so two simultaneous toggles cannot double-count.
    pub fn toggle_like(&self, stream_id: &ChannelId, user_id: &str) -> Result<(usize, bool)> {
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user id must not be empty".to_string()));
        }

        let mut entry = self.likes.entry(stream_id.clone()).or_default();
        let liked = if entry.liked_by.remove(user_id) {
            false
        } else {
            entry.liked_by.insert(user_id.to_string());
            true
        };
        Ok((entry.liked_by.len(), liked))
    }

    /// Current like count, plus whether the given user has liked.
    #[must_use]
    pub fn likes(&self, stream_id: &ChannelId, user_id: Option<&str>) -> (usize, bool) {
        self.likes.get(stream_id).map_or((0, false), |entry| {
            let liked = user_id
                .filter(|u| !u.is_empty())
                .is_some_and(|u| entry.liked_by.contains(u));
            (entry.liked_by.len(), liked)
        })
    }

    /// Append a chat message; fields must be non-empty.
    pub fn post_message(
        &self,
        stream_id: &ChannelId,
        username: &str,
        message: &str,
    ) -> Result<ChatMessage> {
        if username.is_empty() || message.is_empty() {
            return Err(Error::InvalidInput(
                "username and message must not be empty".to_string(),
            ));
        }

        let msg = ChatMessage::new(username.to_string(), message.to_string());
        self.chat
            .entry(stream_id.clone())
            .or_default()
            .push(msg.clone());
        Ok(msg)
    }

    /// Page of the chat log in insertion order, plus the total count.
    ///
    /// `limit` is clamped to [1, 200]; an out-of-range offset yields an
    /// empty page with the real total.
    #[must_use]
    pub fn messages(
        &self,
        stream_id: &ChannelId,
        offset: usize,
        limit: usize,
    ) -> (Vec<ChatMessage>, usize) {
        let limit = limit.clamp(CHAT_LIMIT_MIN, CHAT_LIMIT_MAX);
        self.chat.get(stream_id).map_or((Vec::new(), 0), |log| {
            let total = log.len();
            let page = log
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect();
            (page, total)
        })
    }

    /// Irreversibly empty a stream's chat log.
    pub fn clear_messages(&self, stream_id: &ChannelId) {
        if let Some(mut log) = self.chat.get_mut(stream_id) {
            log.clear();
        }
    }
}
