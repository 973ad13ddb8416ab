//! Polling watcher for the playlist directory.
//!
//! Synthesizes add/change/remove events from an mtime snapshot diff and
//! feeds them to the catalog store. The poll interval is configurable;
//! the handlers are event-shaped, so swapping in a kernel-notification
//! source later would not touch the store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::store::CatalogStore;
use crate::Result;

pub struct PlaylistWatcher {
    dir: PathBuf,
    interval: Duration,
    catalog: Arc<CatalogStore>,
}

impl PlaylistWatcher {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, interval: Duration, catalog: Arc<CatalogStore>) -> Self {
        Self {
            dir: dir.into(),
            interval,
            catalog,
        }
    }

    /// Snapshot the playlist files currently in the directory with their
    /// modification times.
    async fn scan_files(dir: &Path) -> Result<HashMap<PathBuf, SystemTime>> {
        let mut files = HashMap::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() || !is_playlist(&path) {
                continue;
            }
            let mtime = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.insert(path, mtime);
        }
        Ok(files)
    }

    /// Initial full scan, then watch until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if !self.dir.is_dir() {
                if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
                    error!(dir = %self.dir.display(), "Cannot create playlist directory: {e}");
                    return;
                }
            }

            if let Err(e) = self.catalog.rescan(&self.dir).await {
                error!(dir = %self.dir.display(), "Initial playlist scan failed: {e}");
            }

            let mut seen = match Self::scan_files(&self.dir).await {
                Ok(files) => files,
                Err(e) => {
                    warn!(dir = %self.dir.display(), "Playlist snapshot failed: {e}");
                    HashMap::new()
                }
            };

            info!(dir = %self.dir.display(), "Watching playlist directory");

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let current = match Self::scan_files(&self.dir).await {
                    Ok(files) => files,
                    Err(e) => {
                        warn!(dir = %self.dir.display(), "Playlist snapshot failed: {e}");
                        continue;
                    }
                };

                for (path, mtime) in &current {
                    match seen.get(path) {
                        None => {
                            info!(file = %path.display(), "Playlist added");
                            if let Err(e) = self.catalog.apply_file(path).await {
                                warn!(file = %path.display(), "Failed to apply playlist: {e}");
                            }
                        }
                        Some(prev) if prev != mtime => {
                            info!(file = %path.display(), "Playlist changed");
                            if let Err(e) = self.catalog.apply_file(path).await {
                                warn!(file = %path.display(), "Failed to apply playlist: {e}");
                            }
                        }
                        Some(_) => {}
                    }
                }

                for path in seen.keys() {
                    if !current.contains_key(path) {
                        info!(file = %path.display(), "Playlist deleted");
                        self.catalog.remove_file(path).await;
                    }
                }

                seen = current;
            }
        })
    }
}

fn is_playlist(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("m3u") || e.eq_ignore_ascii_case("m3u8"))
}
