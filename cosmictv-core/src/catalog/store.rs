//! In-memory channel catalog derived from watched playlist files.
//!
//! Readers see an immutable snapshot behind an `Arc`; every mutation
//! builds a fresh `Vec` and swaps the pointer, so a reader can never
//! observe a half-replaced catalog. Mutators additionally serialize
//! through an async mutex: two rescans of the same directory never
//! interleave.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::{CategorySummary, Channel, ChannelId};
use crate::playlist;
use crate::slug::slugify;
use crate::Result;

/// Does this path look like a playlist file we ingest?
fn is_playlist_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("m3u") || e.eq_ignore_ascii_case("m3u8"))
}

/// Basename without extension; doubles as the file's category.
fn base_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("general")
        .to_string()
}

#[derive(Default)]
pub struct CatalogStore {
    channels: RwLock<Arc<Vec<Channel>>>,
    mutate: Mutex<()>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("channels", &self.len())
            .finish()
    }
}

impl CatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one playlist file, stamping every channel with its origin.
    async fn parse_file(path: &Path) -> Result<Vec<Channel>> {
        let raw = tokio::fs::read_to_string(path).await?;
        let base = base_name(path);
        let outcome = playlist::parse(&raw, &base, &base);

        for w in &outcome.warnings {
            warn!(
                file = %path.display(),
                line = w.line,
                "Skipped playlist entry: {}",
                w.message
            );
        }

        let mut channels = outcome.channels;
        for ch in &mut channels {
            ch.source_file = path.to_path_buf();
        }
        Ok(channels)
    }

    /// Replace the whole catalog from a directory scan (non-recursive).
    pub async fn rescan(&self, dir: &Path) -> Result<usize> {
        let _guard = self.mutate.lock().await;

        let mut next: Vec<Channel> = Vec::new();

        if dir.is_dir() {
            let mut entries = tokio::fs::read_dir(dir).await?;
            let mut files: Vec<PathBuf> = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.is_file() && is_playlist_file(&path) {
                    files.push(path);
                }
            }
            // Deterministic processing order so id collisions resolve the
            // same way on every rescan (last-processed file wins).
            files.sort();

            for path in files {
                match Self::parse_file(&path).await {
                    Ok(parsed) => {
                        info!(
                            file = %path.display(),
                            channels = parsed.len(),
                            "Playlist parsed"
                        );
                        next.extend(parsed);
                    }
                    Err(e) => {
                        warn!(file = %path.display(), "Failed to read playlist: {e}");
                    }
                }
            }
        } else {
            warn!(dir = %dir.display(), "Playlist directory does not exist");
        }

        let total = next.len();
        *self.channels.write() = Arc::new(next);
        info!(channels = total, "Catalog rebuilt");
        Ok(total)
    }

    /// Re-parse a single added or changed file.
    ///
    /// Drops existing channels matching the path *or* the slug of the
    /// file's basename before inserting the fresh parse; a renamed file
    /// could otherwise leave orphans behind under the old category.
    pub async fn apply_file(&self, path: &Path) -> Result<usize> {
        let _guard = self.mutate.lock().await;

        let parsed = Self::parse_file(path).await?;
        let count = parsed.len();
        let category = slugify(&base_name(path));

        let current = self.snapshot();
        let mut next: Vec<Channel> = current
            .iter()
            .filter(|ch| ch.source_file != path && ch.category != category)
            .cloned()
            .collect();
        next.extend(parsed);

        let total = next.len();
        *self.channels.write() = Arc::new(next);
        info!(
            file = %path.display(),
            channels = count,
            total = total,
            "Playlist applied"
        );
        Ok(count)
    }

    /// Drop every channel that came from a deleted file.
    pub async fn remove_file(&self, path: &Path) {
        let _guard = self.mutate.lock().await;

        let current = self.snapshot();
        let next: Vec<Channel> = current
            .iter()
            .filter(|ch| ch.source_file != path)
            .cloned()
            .collect();

        let removed = current.len() - next.len();
        let total = next.len();
        *self.channels.write() = Arc::new(next);
        info!(
            file = %path.display(),
            removed = removed,
            total = total,
            "Playlist removed"
        );
    }

    /// Immutable snapshot of the current catalog.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Channel>> {
        self.channels.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, id: &ChannelId) -> Option<Channel> {
        self.snapshot().iter().find(|ch| &ch.id == id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &ChannelId) -> bool {
        self.snapshot().iter().any(|ch| &ch.id == id)
    }

    /// Channels in a category, matched by the slug of the query.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<Channel> {
        let slug = slugify(category);
        self.snapshot()
            .iter()
            .filter(|ch| ch.category == slug)
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over title, description and
    /// category.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Channel> {
        let needle = query.to_lowercase();
        self.snapshot()
            .iter()
            .filter(|ch| {
                ch.title.to_lowercase().contains(&needle)
                    || ch.description.to_lowercase().contains(&needle)
                    || ch.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Category rollup, preserving first-seen order and display names.
    #[must_use]
    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut summaries: Vec<CategorySummary> = Vec::new();
        for ch in self.snapshot().iter() {
            if let Some(existing) = summaries.iter_mut().find(|s| s.name == ch.category) {
                existing.count += 1;
            } else {
                summaries.push(CategorySummary {
                    name: ch.category.clone(),
                    count: 1,
                    display_name: if ch.category_name.is_empty() {
                        ch.category.clone()
                    } else {
                        ch.category_name.clone()
                    },
                });
            }
        }
        summaries
    }
}
