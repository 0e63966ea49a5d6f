//! Endpoint path patterns used by policy rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PolicyError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one non-empty segment.
    Any,
    /// Trailing `**`: any remaining segments, including none.
    Rest,
}

/// Path template such as `/workers/*/plan`.
///
/// Matching is segment by segment; empty segments, trailing slashes and any
/// query string or fragment on the endpoint are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse and validate a pattern: it must be absolute and `**` may only
    /// appear as the last segment.
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        let raw = raw.trim();
        if !raw.starts_with('/') {
            return Err(PolicyError::NotAbsolute(raw.to_string()));
        }
        let pattern = Self::compile(raw);
        let rest_at = pattern.segments.iter().position(|s| *s == Segment::Rest);
        if matches!(rest_at, Some(i) if i + 1 != pattern.segments.len()) {
            return Err(PolicyError::MisplacedRest(raw.to_string()));
        }
        Ok(pattern)
    }

    /// Build a pattern from a known-good literal.
    pub(super) fn compile(raw: &str) -> Self {
        let segments = split_path(raw)
            .map(|s| match s {
                "*" => Segment::Any,
                "**" => Segment::Rest,
                lit => Segment::Literal(lit.to_string()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, endpoint: &str) -> bool {
        let mut path = split_path(endpoint);
        for seg in &self.segments {
            match seg {
                Segment::Rest => return true,
                Segment::Any => {
                    if path.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => match path.next() {
                    Some(s) if s == lit => {}
                    _ => return false,
                },
            }
        }
        path.next().is_none()
    }
}

/// Whether two endpoints name the same resource once query strings,
/// fragments, trailing slashes and empty segments are ignored.
pub fn same_endpoint(a: &str, b: &str) -> bool {
    split_path(a).eq(split_path(b))
}

fn split_path(p: &str) -> impl Iterator<Item = &str> {
    let end = p.find(['?', '#']).unwrap_or(p.len());
    p[..end].split('/').filter(|s| !s.is_empty())
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for PathPattern {
    type Error = PolicyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PathPattern> for String {
    fn from(p: PathPattern) -> Self {
        p.raw
    }
}
