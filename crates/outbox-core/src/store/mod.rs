//! Durable queue store: the ordered entry sequence and its on-disk copy.
//!
//! Every mutation is followed by a full persist before returning. Persist
//! failures are logged and swallowed; the in-memory sequence stays
//! authoritative until the next successful write.

mod persist;

pub use persist::{
    corrupt_path, default_path, load_from_path, save_to_path, LoadError, PersistedQueue,
    STORE_VERSION,
};

use std::path::{Path, PathBuf};

use crate::entry::QueueEntry;
use crate::policy::same_endpoint;

/// Ordered sequence of pending entries backed by a single JSON file.
#[derive(Debug)]
pub struct QueueStore {
    entries: Vec<QueueEntry>,
    path: PathBuf,
    /// False while an unreadable queue file is still in place at `path`.
    writable: bool,
}

impl QueueStore {
    /// Open the store at `path`, restoring any persisted entries.
    ///
    /// A missing file is an empty queue. A file that cannot be read or parsed
    /// is moved aside to `<path>.corrupt` and the queue starts empty. If an
    /// unreadable file cannot be moved, nothing is written over it for the
    /// lifetime of the store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut writable = true;
        let entries = match load_from_path(&path) {
            Ok(Some(persisted)) => {
                tracing::debug!(
                    path = %path.display(),
                    entries = persisted.entries.len(),
                    "restored queue from disk"
                );
                persisted.entries
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                let aside = corrupt_path(&path);
                tracing::warn!(error = %e, moved_to = %aside.display(), "queue file unreadable; starting empty");
                if let Err(err) = std::fs::rename(&path, &aside) {
                    match e {
                        LoadError::Parse { .. } => {
                            tracing::warn!(error = %err, "failed to move corrupt queue file aside");
                        }
                        LoadError::Read { .. } => {
                            tracing::error!(
                                error = %err,
                                path = %path.display(),
                                "failed to move unreadable queue file aside; queue changes will not be saved"
                            );
                            writable = false;
                        }
                    }
                }
                Vec::new()
            }
        };
        Self {
            entries,
            path,
            writable,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append at the tail and persist.
    pub fn push(&mut self, entry: QueueEntry) {
        self.append(entry);
        self.persist();
    }

    /// Drop pending entries for the same endpoint that `is_state_sync`
    /// accepts, append at the tail, and persist. Returns how many were dropped.
    pub fn push_superseding<F>(&mut self, entry: QueueEntry, is_state_sync: F) -> usize
    where
        F: Fn(&QueueEntry) -> bool,
    {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(same_endpoint(&e.endpoint, &entry.endpoint) && is_state_sync(e)));
        let removed = before - self.entries.len();
        self.append(entry);
        self.persist();
        removed
    }

    /// Replace the whole sequence (end of a drain) and persist once.
    pub fn replace(&mut self, entries: Vec<QueueEntry>) {
        self.entries = entries;
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn append(&mut self, mut entry: QueueEntry) {
        // created_at never goes backwards along the sequence.
        if let Some(last) = self.entries.last() {
            entry.created_at = entry.created_at.max(last.created_at);
        }
        self.entries.push(entry);
    }

    fn persist(&self) {
        if !self.writable {
            return;
        }
        if let Err(e) = save_to_path(&self.path, &self.entries) {
            tracing::warn!(
                path = %self.path.display(),
                error = %format!("{e:#}"),
                "failed to persist queue; keeping in-memory state"
            );
        }
    }
}
