//! Periodic TTL sweep over presence and session state.
//!
//! Best-effort memory reclamation: counts stay correct without it, so a
//! skipped cycle is harmless. Each prune pass takes only short per-shard
//! locks and cannot stall concurrent API calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::presence::PresenceTracker;
use super::session::SessionRegistry;

pub struct Sweeper {
    presence: Arc<PresenceTracker>,
    sessions: Arc<SessionRegistry>,
    interval: Duration,
}

impl Sweeper {
    #[must_use]
    pub fn new(
        presence: Arc<PresenceTracker>,
        sessions: Arc<SessionRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            presence,
            sessions,
            interval,
        }
    }

    /// Run the sweep until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let viewers = self.presence.prune();
                let sessions = self.sessions.prune();
                if viewers > 0 || sessions > 0 {
                    debug!(viewers, sessions, "Swept stale presence entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelId, ViewerId};

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_prunes_both_stores() {
        let presence = Arc::new(PresenceTracker::default());
        let sessions = Arc::new(SessionRegistry::default());

        presence.touch(&ChannelId::from("canal"), &ViewerId::from("v1"));
        sessions.track("ana", &ChannelId::from("canal"), &ViewerId::from("v1"));

        let handle = Sweeper::new(presence.clone(), sessions.clone(), Duration::from_secs(15)).spawn();

        tokio::time::advance(Duration::from_secs(76)).await;
        tokio::task::yield_now().await;

        assert_eq!(presence.tracked_entries(), 0);
        assert_eq!(sessions.active_count("ana"), 0);
        handle.abort();
    }
}
