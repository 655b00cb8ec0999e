//! Filesystem store for synthesized audio assets.
//!
//! Assets are uniquely named MP3 files in one public directory. The store
//! only ever appends; reclamation is the periodic [`AssetStore::sweep`],
//! which deletes assets older than the retention window and ignores
//! everything that is not an asset.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Extension used for synthesized assets; the sweep only touches these.
const ASSET_EXT: &str = "mp3";

/// Errors from an asset sweep. Never surfaced to callers; the background
/// task logs them and waits for the next tick.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("failed to list asset directory: {0}")]
    List(#[source] std::io::Error),
}

/// Append-only store of synthesized audio files.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory assets are written to, for static serving.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` to a freshly named asset and returns its filename.
    ///
    /// Every call generates a new UUID name, so concurrent writes never
    /// collide and nothing is ever overwritten. The bytes are stored exactly
    /// as received.
    pub async fn store(&self, bytes: &[u8]) -> Result<String, std::io::Error> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = format!("{}.{ASSET_EXT}", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&filename), bytes).await?;
        Ok(filename)
    }

    /// Deletes assets older than `retention`; returns how many were removed.
    pub async fn sweep(&self, retention: Duration) -> Result<usize, SweepError> {
        let cutoff = SystemTime::now()
            .checked_sub(retention)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        self.sweep_before(cutoff).await
    }

    /// Deletes assets last modified before `cutoff`.
    ///
    /// Idempotent: a second run with no new assets removes nothing.
    /// Per-file failures are logged and skipped so one bad entry cannot
    /// block reclamation of the rest.
    pub async fn sweep_before(&self, cutoff: SystemTime) -> Result<usize, SweepError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // Nothing has been synthesized yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SweepError::List(e)),
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(SweepError::List(e)),
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ASSET_EXT) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not stat asset, skipping");
                    continue;
                }
            };

            if modified < cutoff {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "could not delete expired asset");
                    }
                }
            }
        }

        Ok(removed)
    }
}
