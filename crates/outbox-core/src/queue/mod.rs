//! The mutation queue: single owner of the store, policy, scheduler and
//! flush handler.
//!
//! Construct one per process and share it by cloning the handle. Every
//! "mutate + persist" step and every scheduler transition happens under one
//! mutex, which is never held across an `.await`; the flush handler runs
//! outside it, so enqueues made during a drain are merged in afterwards.

use anyhow::Result;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::config::OutboxConfig;
use crate::entry::QueueEntry;
use crate::method::Method;
use crate::policy::{Category, QueuePolicy};
use crate::replay::{self, DrainSummary, FlushHandler};
use crate::scheduler::{FlushScheduler, SchedulerState};
use crate::store::{self, QueueStore};

/// Tunables for a [`MutationQueue`].
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_retries: u32,
    pub policy: QueuePolicy,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self::from_config(&OutboxConfig::default())
    }
}

impl QueueSettings {
    pub fn from_config(cfg: &OutboxConfig) -> Self {
        Self {
            initial_interval: cfg.queue.initial_interval(),
            max_interval: cfg.queue.max_interval(),
            max_retries: cfg.queue.max_retries.max(1),
            policy: cfg.queue_policy(),
        }
    }
}

struct QueueState {
    store: QueueStore,
    scheduler: FlushScheduler,
    handler: Option<Arc<dyn FlushHandler>>,
}

struct Inner {
    policy: QueuePolicy,
    max_retries: u32,
    state: Mutex<QueueState>,
}

/// Cloneable handle to the process-wide mutation queue.
#[derive(Clone)]
pub struct MutationQueue {
    inner: Arc<Inner>,
}

enum Trigger {
    Timer(u64),
    Manual,
}

impl MutationQueue {
    /// Open the queue backed by the file at `path`, restoring pending entries.
    ///
    /// Restored entries are not flushed until a handler is registered.
    pub fn open(settings: QueueSettings, path: impl Into<PathBuf>) -> Self {
        let store = QueueStore::open(path);
        if !store.is_empty() {
            tracing::info!(pending = store.len(), "pending mutations restored");
        }
        Self {
            inner: Arc::new(Inner {
                policy: settings.policy,
                max_retries: settings.max_retries.max(1),
                state: Mutex::new(QueueState {
                    store,
                    scheduler: FlushScheduler::new(settings.initial_interval, settings.max_interval),
                    handler: None,
                }),
            }),
        }
    }

    /// Open using the config's settings and state path (XDG state dir by default).
    pub fn open_default(cfg: &OutboxConfig) -> Result<Self> {
        let path = match &cfg.queue.state_path {
            Some(p) => p.clone(),
            None => store::default_path()?,
        };
        Ok(Self::open(QueueSettings::from_config(cfg), path))
    }

    /// Whether a connectivity failure on this call may be deferred.
    pub fn should_queue(&self, method: Method, endpoint: &str) -> bool {
        self.inner.policy.should_queue(method, endpoint)
    }

    /// Defer a failed mutation. No-op returning `false` when the policy
    /// rejects it.
    ///
    /// Call only after the failure was classified as a connectivity failure.
    pub fn enqueue(&self, method: Method, endpoint: &str, body: Option<String>) -> bool {
        let policy = &self.inner.policy;
        let category = policy.category(method, endpoint);
        if !category.is_eligible() {
            tracing::debug!(%method, endpoint, ?category, "not eligible for deferral");
            return false;
        }

        let entry = QueueEntry::new(method, endpoint, body);
        let id = entry.id.clone();
        let mut state = self.inner.state.lock();
        let superseded = if category.supersedes() {
            state.store.push_superseding(entry, |e| {
                policy.category(e.method, &e.endpoint) == Category::StateSync
            })
        } else {
            state.store.push(entry);
            0
        };
        tracing::info!(
            %id,
            %method,
            endpoint,
            superseded,
            pending = state.store.len(),
            "mutation deferred"
        );
        self.schedule_locked(&mut state);
        true
    }

    /// Register the redelivery mechanism. Arms the timer if entries are pending.
    pub fn set_flush_handler(&self, handler: Arc<dyn FlushHandler>) {
        let mut state = self.inner.state.lock();
        state.handler = Some(handler);
        self.schedule_locked(&mut state);
    }

    pub fn count(&self) -> usize {
        self.inner.state.lock().store.len()
    }

    /// Snapshot of pending entries in redelivery order.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.inner.state.lock().store.entries().to_vec()
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.state.lock().scheduler.state()
    }

    /// Delay the next scheduled drain will wait.
    pub fn current_interval(&self) -> Duration {
        self.inner.state.lock().scheduler.interval()
    }

    pub fn path(&self) -> PathBuf {
        self.inner.state.lock().store.path().to_path_buf()
    }

    /// Drain now, cancelling any pending timer.
    ///
    /// Returns `None` when no drain ran: one was already in progress (the
    /// call coalesces into it) or no flush handler is registered. The drain
    /// runs on its own task, so dropping this future does not cut it short.
    pub async fn flush(&self) -> Option<DrainSummary> {
        let queue = self.clone();
        match tokio::spawn(async move { queue.run_drain(Trigger::Manual).await }).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "flush task failed");
                None
            }
        }
    }

    /// Discard every pending entry and cancel any pending timer.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        let discarded = state.store.len();
        state.store.clear();
        state.scheduler.cancel();
        tracing::info!(discarded, "queue cleared");
    }

    fn schedule_locked(&self, state: &mut QueueState) {
        if state.handler.is_none() || state.store.is_empty() {
            return;
        }
        let Some((generation, delay)) = state.scheduler.arm() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                let handle = rt.spawn(timer(Arc::downgrade(&self.inner), generation, delay));
                state.scheduler.attach_timer(generation, handle);
                tracing::debug!(interval_ms = delay.as_millis() as u64, "flush scheduled");
            }
            Err(_) => {
                state.scheduler.disarm(generation);
                tracing::warn!("no async runtime; flush not scheduled");
            }
        }
    }

    async fn run_drain(&self, trigger: Trigger) -> Option<DrainSummary> {
        let (snapshot, handler) = {
            let mut state = self.inner.state.lock();
            let started = match trigger {
                Trigger::Timer(generation) => state.scheduler.fire(generation),
                Trigger::Manual => state.scheduler.begin_manual(),
            };
            if !started {
                return None;
            }
            let Some(handler) = state.handler.clone() else {
                state.scheduler.abandon_drain();
                tracing::debug!("no flush handler registered; drain skipped");
                return None;
            };
            (state.store.entries().to_vec(), handler)
        };

        let attempted = snapshot.len();
        let outcome = replay::drain(snapshot, handler.as_ref(), self.inner.max_retries).await;

        let mut state = self.inner.state.lock();
        let summary = if attempted == 0 {
            // Nothing was taken, so the live sequence is already current.
            DrainSummary {
                remaining: state.store.len(),
                ..outcome.summary
            }
        } else {
            let merged = replay::merge(state.store.entries(), &outcome);
            let summary = DrainSummary {
                remaining: merged.len(),
                ..outcome.summary
            };
            state.store.replace(merged);
            summary
        };
        let rearm = state.scheduler.finish_drain(&summary);
        if attempted > 0 {
            tracing::info!(
                delivered = summary.delivered,
                failed = summary.failed,
                remaining = summary.remaining,
                next_interval_ms = state.scheduler.interval().as_millis() as u64,
                "drain finished"
            );
        }
        if rearm {
            self.schedule_locked(&mut state);
        }
        Some(summary)
    }
}

async fn timer(inner: Weak<Inner>, generation: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    // Every handle dropped: nothing left to flush for.
    let Some(inner) = inner.upgrade() else {
        return;
    };
    MutationQueue { inner }
        .run_drain(Trigger::Timer(generation))
        .await;
}

impl std::fmt::Debug for MutationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("MutationQueue")
            .field("path", &state.store.path())
            .field("pending", &state.store.len())
            .field("state", &state.scheduler.state())
            .finish()
    }
}
