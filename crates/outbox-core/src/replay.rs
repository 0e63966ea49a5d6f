//! Replay executor: one sequential, oldest-first pass over pending entries.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::future::Future;

use crate::entry::QueueEntry;
use crate::method::Method;

/// Redelivery mechanism injected by the transport layer.
///
/// Returns `true` when the remote accepted the mutation. The queue never
/// looks at why a delivery failed.
#[async_trait]
pub trait FlushHandler: Send + Sync {
    async fn deliver(&self, method: Method, endpoint: &str, body: Option<&str>) -> bool;
}

/// Any `Fn(Method, String, Option<String>) -> impl Future<Output = bool>` is a handler.
#[async_trait]
impl<F, Fut> FlushHandler for F
where
    F: Fn(Method, String, Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn deliver(&self, method: Method, endpoint: &str, body: Option<&str>) -> bool {
        (self)(method, endpoint.to_string(), body.map(str::to_string)).await
    }
}

/// Counts for one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub delivered: usize,
    /// Entries dropped after reaching the retry ceiling.
    pub failed: usize,
    pub remaining: usize,
}

/// Result of [`drain`]: the survivors plus the ids that left the queue.
#[derive(Debug, Default)]
pub struct DrainOutcome {
    pub summary: DrainSummary,
    /// Entries kept for the next cycle, with updated `retries`.
    pub survivors: Vec<QueueEntry>,
    /// Ids delivered or abandoned during this drain.
    pub finished: HashSet<String>,
}

/// Deliver `entries` strictly in order, one at a time.
///
/// Successes are dropped. Failures bump `retries`; an entry whose `retries`
/// reaches `max_retries` is abandoned and counted in `failed`.
pub async fn drain(
    entries: Vec<QueueEntry>,
    handler: &dyn FlushHandler,
    max_retries: u32,
) -> DrainOutcome {
    let mut outcome = DrainOutcome::default();

    for mut entry in entries {
        if handler
            .deliver(entry.method, &entry.endpoint, entry.body.as_deref())
            .await
        {
            tracing::debug!(id = %entry.id, method = %entry.method, endpoint = %entry.endpoint, "delivered");
            outcome.summary.delivered += 1;
            outcome.finished.insert(entry.id);
            continue;
        }

        entry.retries = entry.retries.saturating_add(1);
        if entry.retries >= max_retries {
            tracing::warn!(
                id = %entry.id,
                method = %entry.method,
                endpoint = %entry.endpoint,
                retries = entry.retries,
                "giving up on queued mutation after repeated failures"
            );
            outcome.summary.failed += 1;
            outcome.finished.insert(entry.id);
        } else {
            tracing::debug!(
                id = %entry.id,
                endpoint = %entry.endpoint,
                retries = entry.retries,
                max_retries,
                "redelivery failed; keeping entry"
            );
            outcome.survivors.push(entry);
        }
    }

    outcome.summary.remaining = outcome.survivors.len();
    outcome
}

/// Fold a drain outcome into the live sequence.
///
/// `live` may differ from what was drained: entries appended during the drain
/// keep their place after the survivors, and entries superseded or cleared
/// meanwhile stay gone.
pub fn merge(live: &[QueueEntry], outcome: &DrainOutcome) -> Vec<QueueEntry> {
    let survivors: HashMap<&str, &QueueEntry> = outcome
        .survivors
        .iter()
        .map(|e| (e.id.as_str(), e))
        .collect();

    live.iter()
        .filter(|e| !outcome.finished.contains(&e.id))
        .map(|e| survivors.get(e.id.as_str()).copied().unwrap_or(e).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records calls; fails the first `fail_first` of them.
    #[derive(Default)]
    struct Scripted {
        calls: Mutex<Vec<String>>,
        fail_first: usize,
        seen: AtomicUsize,
    }

    #[async_trait]
    impl FlushHandler for Scripted {
        async fn deliver(&self, _method: Method, endpoint: &str, body: Option<&str>) -> bool {
            self.calls
                .lock()
                .push(format!("{endpoint} {}", body.unwrap_or("")));
            self.seen.fetch_add(1, Ordering::SeqCst) >= self.fail_first
        }
    }

    fn entries(n: usize) -> Vec<QueueEntry> {
        (0..n)
            .map(|i| QueueEntry::new(Method::Post, "/memory", Some(i.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn delivers_in_order_and_drops_successes() {
        let handler = Scripted::default();
        let out = drain(entries(3), &handler, 10).await;
        assert_eq!(
            out.summary,
            DrainSummary {
                delivered: 3,
                failed: 0,
                remaining: 0
            }
        );
        assert_eq!(
            *handler.calls.lock(),
            vec!["/memory 0", "/memory 1", "/memory 2"]
        );
        assert!(out.survivors.is_empty());
    }

    #[tokio::test]
    async fn failure_increments_retries_and_keeps_entry() {
        let handler = Scripted {
            fail_first: 1,
            ..Default::default()
        };
        let out = drain(entries(2), &handler, 10).await;
        assert_eq!(out.summary.delivered, 1);
        assert_eq!(out.summary.remaining, 1);
        assert_eq!(out.survivors[0].retries, 1);
        assert_eq!(out.survivors[0].body.as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn entry_is_abandoned_at_the_ceiling() {
        let handler = Scripted {
            fail_first: usize::MAX,
            ..Default::default()
        };
        let mut batch = entries(1);
        batch[0].retries = 2;
        let out = drain(batch, &handler, 3).await;
        assert_eq!(
            out.summary,
            DrainSummary {
                delivered: 0,
                failed: 1,
                remaining: 0
            }
        );
        assert_eq!(out.finished.len(), 1);
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let handler = |_m: Method, endpoint: String, _b: Option<String>| async move {
            endpoint != "/memory"
        };
        let out = drain(entries(1), &handler, 10).await;
        assert_eq!(out.summary.remaining, 1);
    }

    #[test]
    fn merge_applies_outcome_and_keeps_late_arrivals() {
        let drained = entries(3);
        let mut survivor = drained[1].clone();
        survivor.retries = 1;
        let outcome = DrainOutcome {
            summary: DrainSummary::default(),
            survivors: vec![survivor],
            finished: [drained[0].id.clone(), drained[2].id.clone()]
                .into_iter()
                .collect(),
        };
        let late = QueueEntry::new(Method::Post, "/memory", Some("late".to_string()));
        let mut live = drained.clone();
        live.push(late.clone());

        let merged = merge(&live, &outcome);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, drained[1].id);
        assert_eq!(merged[0].retries, 1);
        assert_eq!(merged[1], late);
    }

    #[test]
    fn merge_does_not_resurrect_superseded_entries() {
        let drained = entries(1);
        let outcome = DrainOutcome {
            summary: DrainSummary::default(),
            survivors: drained.clone(),
            finished: HashSet::new(),
        };
        // Entry was superseded (removed from live) while the drain ran.
        let replacement = QueueEntry::new(Method::Post, "/memory", Some("new".to_string()));
        let merged = merge(std::slice::from_ref(&replacement), &outcome);
        assert_eq!(merged, vec![replacement]);
    }
}
