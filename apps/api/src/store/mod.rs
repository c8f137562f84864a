//! ContentStore — baseline draft corpus plus the editable overlay file.
//!
//! The baseline is read once at startup and never changes afterwards. The
//! overlay is read-merge-written: every save reads the current file, replaces
//! only the saved addresses and rewrites the whole file atomically.
//!
//! Writes are serialized inside one process. Another process writing the same
//! overlay file concurrently can still lose an update.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub mod atomic;
pub mod handlers;

/// Address → email draft (HTML).
pub type ContentMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a valid address → content map: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Persistence { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Overlay,
    Baseline,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentContent {
    pub source: ContentSource,
    pub content: ContentMap,
}

pub struct ContentStore {
    baseline: ContentMap,
    overlay_path: PathBuf,
    write_lock: Mutex<()>,
}

impl ContentStore {
    pub fn new(baseline: ContentMap, overlay_path: PathBuf) -> Self {
        Self {
            baseline,
            overlay_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads the baseline snapshot. A missing or malformed baseline leaves the
    /// store with an empty corpus rather than failing startup.
    pub async fn open(baseline_path: &Path, overlay_path: PathBuf) -> Self {
        let baseline = match read_map(baseline_path).await {
            Ok(map) => {
                info!(
                    "Loaded {} baseline drafts from {}",
                    map.len(),
                    baseline_path.display()
                );
                map
            }
            Err(e) => {
                warn!("Baseline corpus unavailable, starting empty: {e}");
                ContentMap::new()
            }
        };
        Self::new(baseline, overlay_path)
    }

    pub fn baseline(&self) -> &ContentMap {
        &self.baseline
    }

    pub async fn load_overlay(&self) -> Result<ContentMap, StoreError> {
        read_map(&self.overlay_path).await
    }

    /// The overlay when it exists and has entries, otherwise the baseline.
    pub async fn current(&self) -> CurrentContent {
        match self.load_overlay().await {
            Ok(content) if !content.is_empty() => CurrentContent {
                source: ContentSource::Overlay,
                content,
            },
            Ok(_) => CurrentContent {
                source: ContentSource::Baseline,
                content: self.baseline.clone(),
            },
            Err(e) => {
                info!("Using baseline content: {e}");
                CurrentContent {
                    source: ContentSource::Baseline,
                    content: self.baseline.clone(),
                }
            }
        }
    }

    pub async fn save(&self, address: &str, content: &str) -> Result<ContentMap, StoreError> {
        let mut entries = ContentMap::new();
        entries.insert(address.to_string(), content.to_string());
        self.save_all(entries).await
    }

    /// Merges `entries` over the persisted overlay and rewrites it. Entries for
    /// other addresses are preserved. Returns the merged mapping as written.
    pub async fn save_all(&self, entries: ContentMap) -> Result<ContentMap, StoreError> {
        let _write = self.write_lock.lock().await;

        let mut merged = match self.load_overlay().await {
            Ok(existing) => existing,
            Err(StoreError::NotFound(_)) => ContentMap::new(),
            Err(e) => {
                warn!("Overlay unreadable, starting from an empty mapping: {e}");
                ContentMap::new()
            }
        };
        let saved = entries.len();
        merged.extend(entries);

        let path = self.overlay_path.clone();
        let to_write = merged.clone();
        tokio::task::spawn_blocking(move || atomic::write_json_atomic(&path, &to_write))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .and_then(|result| result)
            .map_err(|source| StoreError::Persistence {
                path: self.overlay_path.clone(),
                source,
            })?;

        info!(
            "Saved {saved} drafts to {} ({} total)",
            self.overlay_path.display(),
            merged.len()
        );
        Ok(merged)
    }
}

async fn read_map(path: &Path) -> Result<ContentMap, StoreError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
