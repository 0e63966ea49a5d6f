//! Policy categories and the built-in rule table.

use serde::{Deserialize, Serialize};

use super::PathPattern;
use crate::method::Method;

/// Deferral safety class of a (method, endpoint) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A: state-sync update. Deferred; a newer entry supersedes older ones
    /// for the same endpoint.
    StateSync,
    /// B: append-only record. Deferred; every entry is delivered in order.
    AppendOnly,
    /// C: only meaningful if applied now (claim, reassign, delete).
    TimeSensitive,
    /// D: not on the allow-list.
    Unlisted,
}

impl Category {
    pub fn is_eligible(self) -> bool {
        matches!(self, Category::StateSync | Category::AppendOnly)
    }

    /// Whether enqueuing drops older pending entries for the same endpoint.
    pub fn supersedes(self) -> bool {
        self == Category::StateSync
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::StateSync => "A (state-sync)",
            Category::AppendOnly => "B (append-only)",
            Category::TimeSensitive => "C (time-sensitive)",
            Category::Unlisted => "D (unlisted)",
        }
    }
}

/// One row of the policy table. Rules are tried in order; the first one whose
/// method list and pattern both match decides the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub methods: Vec<Method>,
    pub pattern: PathPattern,
    pub category: Category,
}

impl PolicyRule {
    pub fn applies(&self, method: Method, endpoint: &str) -> bool {
        self.methods.contains(&method) && self.pattern.matches(endpoint)
    }
}

/// Built-in table used when the config has no `[[policy.rules]]`.
///
/// Time-sensitive rules come first so a broader append-only pattern added
/// later can never shadow them.
pub fn default_rules() -> Vec<PolicyRule> {
    use Category::*;
    use Method::*;

    vec![
        rule(&[Post], "/tasks/*/claim", TimeSensitive),
        rule(&[Post], "/tasks/*/reassign", TimeSensitive),
        rule(&[Post], "/workers/*/reassign", TimeSensitive),
        rule(&[Delete], "/**", TimeSensitive),
        rule(&[Patch, Put], "/workers/*", StateSync),
        rule(&[Patch, Put], "/tasks/*", StateSync),
        rule(&[Post], "/memory", AppendOnly),
        rule(&[Post], "/workers/*/plan", AppendOnly),
        rule(&[Post], "/workers/*/observations", AppendOnly),
        rule(&[Post], "/tasks/*/events", AppendOnly),
    ]
}

fn rule(methods: &[Method], pattern: &str, category: Category) -> PolicyRule {
    PolicyRule {
        methods: methods.to_vec(),
        pattern: PathPattern::compile(pattern),
        category,
    }
}
