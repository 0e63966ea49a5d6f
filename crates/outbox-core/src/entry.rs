//! A single deferred mutation.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::method::Method;

/// One deferred mutation, as stored on disk and replayed later.
///
/// Only `retries` changes after creation. Redelivery order is the entry's
/// position in the store, never its `id` or `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Opaque id: UUID v7 (millisecond timestamp prefix, random suffix).
    pub id: String,
    pub method: Method,
    /// Target path without host, e.g. `/workers/42`.
    pub endpoint: String,
    /// Serialized request payload, if the original request had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Unix milliseconds at enqueue time. Diagnostics only.
    pub created_at: i64,
    /// Failed redelivery attempts so far.
    #[serde(default)]
    pub retries: u32,
}

impl QueueEntry {
    pub fn new(method: Method, endpoint: impl Into<String>, body: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            method,
            endpoint: endpoint.into(),
            body,
            created_at: unix_millis(),
            retries: 0,
        }
    }
}

pub(crate) fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_starts_without_retries() {
        let e = QueueEntry::new(Method::Post, "/memory", Some("{}".to_string()));
        assert_eq!(e.retries, 0);
        assert_eq!(e.endpoint, "/memory");
        assert!(e.created_at > 0);
    }

    #[test]
    fn ids_are_unique() {
        let a = QueueEntry::new(Method::Post, "/memory", None);
        let b = QueueEntry::new(Method::Post, "/memory", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn body_is_omitted_when_absent() {
        let e = QueueEntry::new(Method::Patch, "/workers/1", None);
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("body"));
        let back: QueueEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
