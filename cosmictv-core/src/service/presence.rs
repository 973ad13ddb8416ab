//! TTL-based viewer presence, keyed per stream.
//!
//! A viewer counts as live while its last touch is within the TTL. The
//! count is always recomputed against the clock, so the periodic sweep
//! is pure memory reclamation; skipping a sweep cycle cannot inflate a
//! count.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::models::{ChannelId, ViewerId};

pub const DEFAULT_VIEWER_TTL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct PresenceTracker {
    ttl: Duration,
    streams: DashMap<ChannelId, DashMap<ViewerId, Instant>>,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWER_TTL)
    }
}

impl PresenceTracker {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            streams: DashMap::new(),
        }
    }

    /// Record or refresh a viewer's last-seen time.
    pub fn touch(&self, stream_id: &ChannelId, viewer_id: &ViewerId) {
        self.streams
            .entry(stream_id.clone())
            .or_default()
            .insert(viewer_id.clone(), Instant::now());
    }

    /// Explicit departure; returns whether the viewer was present.
    pub fn remove(&self, stream_id: &ChannelId, viewer_id: &ViewerId) -> bool {
        self.streams
            .get(stream_id)
            .is_some_and(|viewers| viewers.remove(viewer_id).is_some())
    }

    /// Count of viewers seen within the TTL window, freshness recomputed
    /// on every call.
    #[must_use]
    pub fn live_count(&self, stream_id: &ChannelId) -> usize {
        self.streams.get(stream_id).map_or(0, |viewers| {
            viewers
                .iter()
                .filter(|entry| entry.value().elapsed() <= self.ttl)
                .count()
        })
    }

    /// Physically delete entries beyond the TTL across all streams.
    pub fn prune(&self) -> usize {
        let mut removed = 0;
        for viewers in self.streams.iter() {
            let before = viewers.len();
            viewers.retain(|_, last_seen| last_seen.elapsed() <= self.ttl);
            removed += before - viewers.len();
        }
        self.streams.retain(|_, viewers| !viewers.is_empty());
        removed
    }

    /// Total physical entries, live or not (introspection only).
    #[must_use]
    pub fn tracked_entries(&self) -> usize {
        self.streams.iter().map(|viewers| viewers.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (ChannelId, ViewerId) {
        (ChannelId::from("canal"), ViewerId::from("viewer-1"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewer_expires_after_ttl() {
        let tracker = PresenceTracker::default();
        let (stream, viewer) = ids();

        tracker.touch(&stream, &viewer);
        assert_eq!(tracker.live_count(&stream), 1);

        tokio::time::advance(Duration::from_millis(60_001)).await;
        assert_eq!(tracker.live_count(&stream), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_before_expiry_keeps_viewer_live() {
        let tracker = PresenceTracker::default();
        let (stream, viewer) = ids();

        tracker.touch(&stream, &viewer);
        tokio::time::advance(Duration::from_secs(45)).await;
        tracker.touch(&stream, &viewer);
        tokio::time::advance(Duration::from_secs(45)).await;

        assert_eq!(tracker.live_count(&stream), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_correct_without_prune() {
        let tracker = PresenceTracker::default();
        let stream = ChannelId::from("canal");

        tracker.touch(&stream, &ViewerId::from("a"));
        tracker.touch(&stream, &ViewerId::from("b"));
        tokio::time::advance(Duration::from_secs(61)).await;
        tracker.touch(&stream, &ViewerId::from("c"));

        // Stale entries still physically present, yet not counted.
        assert_eq!(tracker.tracked_entries(), 3);
        assert_eq!(tracker.live_count(&stream), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_reclaims_stale_entries() {
        let tracker = PresenceTracker::default();
        let stream = ChannelId::from("canal");

        tracker.touch(&stream, &ViewerId::from("a"));
        tracker.touch(&stream, &ViewerId::from("b"));
        tokio::time::advance(Duration::from_secs(61)).await;

        let removed = tracker.prune();
        assert_eq!(removed, 2);
        assert_eq!(tracker.tracked_entries(), 0);
    }

    #[tokio::test]
    async fn test_remove_is_explicit_departure() {
        let tracker = PresenceTracker::default();
        let (stream, viewer) = ids();

        tracker.touch(&stream, &viewer);
        assert!(tracker.remove(&stream, &viewer));
        assert!(!tracker.remove(&stream, &viewer));
        assert_eq!(tracker.live_count(&stream), 0);
    }

    #[tokio::test]
    async fn test_streams_are_independent() {
        let tracker = PresenceTracker::default();

        tracker.touch(&ChannelId::from("a"), &ViewerId::from("v1"));
        tracker.touch(&ChannelId::from("b"), &ViewerId::from("v1"));
        tracker.touch(&ChannelId::from("b"), &ViewerId::from("v2"));

        assert_eq!(tracker.live_count(&ChannelId::from("a")), 1);
        assert_eq!(tracker.live_count(&ChannelId::from("b")), 2);
    }
}
