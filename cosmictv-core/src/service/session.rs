//! Observational registry of (user, stream, viewer) sessions.
//!
//! Same TTL discipline as viewer presence; never consulted by the gate
//! or the catalog. Optionally mirrors per-user active counts back into
//! the users.json file for operational tooling.

use std::path::Path;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::models::{ChannelId, ViewerId};
use crate::service::presence::DEFAULT_VIEWER_TTL;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub stream_id: ChannelId,
    pub viewer_id: ViewerId,
}

#[derive(Debug, Clone, Copy)]
struct SessionStamp {
    touched: Instant,
    /// Wall-clock touch time, for the introspection surface
    at_ms: i64,
}

/// One session row of the introspection export.
#[derive(Debug, Clone)]
pub struct SessionDetail {
    pub stream_id: ChannelId,
    pub viewer_id: ViewerId,
    pub last_ping_ms: i64,
}

#[derive(Debug)]
pub struct SessionRegistry {
    ttl: Duration,
    sessions: DashMap<String, DashMap<SessionKey, SessionStamp>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWER_TTL)
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: DashMap::new(),
        }
    }

    /// Record or refresh a session on join/ping.
    pub fn track(&self, username: &str, stream_id: &ChannelId, viewer_id: &ViewerId) {
        let stamp = SessionStamp {
            touched: Instant::now(),
            at_ms: chrono::Utc::now().timestamp_millis(),
        };
        self.sessions
            .entry(username.to_string())
            .or_default()
            .insert(
                SessionKey {
                    stream_id: stream_id.clone(),
                    viewer_id: viewer_id.clone(),
                },
                stamp,
            );
    }

    /// Drop a session on leave; empty users disappear from the registry.
    pub fn untrack(&self, username: &str, stream_id: &ChannelId, viewer_id: &ViewerId) {
        if let Some(sessions) = self.sessions.get(username) {
            sessions.remove(&SessionKey {
                stream_id: stream_id.clone(),
                viewer_id: viewer_id.clone(),
            });
            if sessions.is_empty() {
                drop(sessions);
                self.sessions.remove(username);
            }
        }
    }

    /// Live session count for one user.
    #[must_use]
    pub fn active_count(&self, username: &str) -> usize {
        self.sessions.get(username).map_or(0, |sessions| {
            sessions
                .iter()
                .filter(|entry| entry.value().touched.elapsed() <= self.ttl)
                .count()
        })
    }

    /// Live (username, session count) pairs across the registry.
    #[must_use]
    pub fn all_active(&self) -> Vec<(String, usize)> {
        self.sessions
            .iter()
            .map(|entry| (entry.key().clone(), self.count_live(entry.value())))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Live session rows for one user.
    #[must_use]
    pub fn sessions_for(&self, username: &str) -> Vec<SessionDetail> {
        self.sessions.get(username).map_or_else(Vec::new, |sessions| {
            sessions
                .iter()
                .filter(|entry| entry.value().touched.elapsed() <= self.ttl)
                .map(|entry| SessionDetail {
                    stream_id: entry.key().stream_id.clone(),
                    viewer_id: entry.key().viewer_id.clone(),
                    last_ping_ms: entry.value().at_ms,
                })
                .collect()
        })
    }

    fn count_live(&self, sessions: &DashMap<SessionKey, SessionStamp>) -> usize {
        sessions
            .iter()
            .filter(|entry| entry.value().touched.elapsed() <= self.ttl)
            .count()
    }

    /// Physically delete stale sessions and empty users.
    pub fn prune(&self) -> usize {
        let mut removed = 0;
        for sessions in self.sessions.iter() {
            let before = sessions.len();
            sessions.retain(|_, stamp| stamp.touched.elapsed() <= self.ttl);
            removed += before - sessions.len();
        }
        self.sessions.retain(|_, sessions| !sessions.is_empty());
        removed
    }

    /// Mirror per-user active counts into the users file.
    ///
    /// Reads the file as loose JSON so fields this service knows nothing
    /// about survive the rewrite, sets `activeSessions` on each user, and
    /// replaces the file atomically (temp file + rename). A missing file
    /// means there is nothing to annotate.
    pub async fn persist_active_counts(&self, users_file: &Path) -> Result<()> {
        if !users_file.exists() {
            return Ok(());
        }

        let raw = tokio::fs::read_to_string(users_file).await?;
        let mut doc: serde_json::Value = serde_json::from_str(&raw)?;

        let Some(users) = doc.get_mut("users").and_then(|u| u.as_array_mut()) else {
            return Ok(());
        };

        for user in users.iter_mut() {
            let username = user
                .get("username")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let count = self.active_count(&username);
            user["activeSessions"] = serde_json::Value::from(count);
        }

        let tmp = users_file.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_string_pretty(&doc)?).await?;
        tokio::fs::rename(&tmp, users_file).await?;
        debug!(file = %users_file.display(), "Active session counts persisted");
        Ok(())
    }
}
