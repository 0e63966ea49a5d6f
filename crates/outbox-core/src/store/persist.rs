//! Persist the queue to disk (JSON under XDG state dir) so pending mutations
//! survive restarts.
//!
//! Writes go to a temp file in the target directory, are synced, then renamed
//! over the previous file, so a crash leaves either the old or the new file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::entry::{unix_millis, QueueEntry};

/// Current on-disk format version.
pub const STORE_VERSION: u32 = 1;

/// On-disk form of the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedQueue {
    pub version: u32,
    /// Unix milliseconds of the last successful write.
    pub updated_at: i64,
    #[serde(default)]
    pub entries: Vec<QueueEntry>,
}

#[derive(Serialize)]
struct PersistedQueueRef<'a> {
    version: u32,
    updated_at: i64,
    entries: &'a [QueueEntry],
}

/// Why an existing queue file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("read queue file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse queue file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Default path for the queue file: `~/.local/state/outbox/queue.json`.
pub fn default_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("outbox")?;
    Ok(xdg_dirs.place_state_file("queue.json")?)
}

/// Write the full sequence to `path` atomically (creates parent dir if needed).
pub fn save_to_path(path: &Path, entries: &[QueueEntry]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;

    let snapshot = PersistedQueueRef {
        version: STORE_VERSION,
        updated_at: unix_millis(),
        entries,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    serde_json::to_writer_pretty(&mut tmp, &snapshot).context("serialize queue")?;
    tmp.as_file().sync_all().context("sync queue temp file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("write queue: {}", path.display()))?;
    Ok(())
}

/// Load the queue file. A missing file is `Ok(None)`.
pub fn load_from_path(path: &Path) -> Result<Option<PersistedQueue>, LoadError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoadError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let queue: PersistedQueue = serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if queue.version > STORE_VERSION {
        tracing::warn!(
            version = queue.version,
            supported = STORE_VERSION,
            "queue file written by a newer version; loading known fields"
        );
    }
    Ok(Some(queue))
}

/// Path an unreadable queue file is moved to: `queue.json` → `queue.json.corrupt`.
pub fn corrupt_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".corrupt");
    PathBuf::from(o)
}
