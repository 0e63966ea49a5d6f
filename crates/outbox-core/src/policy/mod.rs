//! Queue policy: which failed mutations may be deferred and replayed.
//!
//! An explicit allow-list. Reads are never eligible, deletes are always
//! time-sensitive, and anything the rule table does not name is rejected.

mod pattern;
mod rules;

pub use pattern::{same_endpoint, PathPattern};
pub use rules::{default_rules, Category, PolicyRule};

use crate::method::Method;

/// Invalid policy rule in configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("pattern must start with '/': {0}")]
    NotAbsolute(String),
    #[error("'**' is only allowed as the last segment: {0}")]
    MisplacedRest(String),
}

/// Ordered rule table deciding the [`Category`] of a request.
#[derive(Debug, Clone)]
pub struct QueuePolicy {
    rules: Vec<PolicyRule>,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl QueuePolicy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    pub fn category(&self, method: Method, endpoint: &str) -> Category {
        if method.is_read() {
            return Category::Unlisted;
        }
        match method {
            Method::Delete => Category::TimeSensitive,
            _ => self
                .rules
                .iter()
                .find(|r| r.applies(method, endpoint))
                .map(|r| r.category)
                .unwrap_or(Category::Unlisted),
        }
    }

    /// Whether a connectivity failure on this call may be queued.
    pub fn should_queue(&self, method: Method, endpoint: &str) -> bool {
        self.category(method, endpoint).is_eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_sync_updates() {
        let p = QueuePolicy::default();
        assert_eq!(p.category(Method::Patch, "/workers/42"), Category::StateSync);
        assert_eq!(p.category(Method::Put, "/tasks/7"), Category::StateSync);
        assert!(p.should_queue(Method::Patch, "/workers/42"));
    }

    #[test]
    fn append_only_records() {
        let p = QueuePolicy::default();
        assert_eq!(p.category(Method::Post, "/memory"), Category::AppendOnly);
        assert_eq!(p.category(Method::Post, "/workers/3/plan"), Category::AppendOnly);
        assert_eq!(
            p.category(Method::Post, "/workers/3/observations"),
            Category::AppendOnly
        );
        assert!(p.should_queue(Method::Post, "/tasks/1/events"));
    }

    #[test]
    fn time_sensitive_operations_are_never_queued() {
        let p = QueuePolicy::default();
        for (m, e) in [
            (Method::Post, "/tasks/1/claim"),
            (Method::Post, "/tasks/1/reassign"),
            (Method::Post, "/workers/2/reassign"),
            (Method::Delete, "/workers/2"),
            (Method::Delete, "/memory"),
        ] {
            assert_eq!(p.category(m, e), Category::TimeSensitive, "{m} {e}");
            assert!(!p.should_queue(m, e));
        }
    }

    #[test]
    fn reads_and_unlisted_are_never_queued() {
        let p = QueuePolicy::default();
        assert!(!p.should_queue(Method::Get, "/workers/42"));
        assert!(!p.should_queue(Method::Get, "/memory"));
        assert!(!p.should_queue(Method::Post, "/workers"));
        assert!(!p.should_queue(Method::Patch, "/settings"));
        assert!(!p.should_queue(Method::Post, "/workers/42"));
    }

    #[test]
    fn first_matching_rule_wins() {
        let p = QueuePolicy::new(vec![
            PolicyRule {
                methods: vec![Method::Post],
                pattern: PathPattern::parse("/jobs/*/cancel").unwrap(),
                category: Category::TimeSensitive,
            },
            PolicyRule {
                methods: vec![Method::Post],
                pattern: PathPattern::parse("/jobs/**").unwrap(),
                category: Category::AppendOnly,
            },
        ]);
        assert!(!p.should_queue(Method::Post, "/jobs/1/cancel"));
        assert!(p.should_queue(Method::Post, "/jobs/1/notes"));
    }

    #[test]
    fn rules_cannot_make_reads_or_deletes_eligible() {
        let p = QueuePolicy::new(vec![PolicyRule {
            methods: vec![Method::Get, Method::Delete],
            pattern: PathPattern::parse("/**").unwrap(),
            category: Category::AppendOnly,
        }]);
        assert!(!p.should_queue(Method::Get, "/anything"));
        assert!(!p.should_queue(Method::Delete, "/anything"));
    }
}
