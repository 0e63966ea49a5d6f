//! HTTP verbs carried by deferred mutations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request verb. Serialized upper-case (`"PATCH"`), parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// The retrieval verb. Reads are never deferred.
    pub fn is_read(self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct MethodParseError(pub String);

impl FromStr for Method {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| MethodParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!(" Post ".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
    }

    #[test]
    fn parse_rejects_unknown_verbs() {
        let err = "OPTIONS".parse::<Method>().unwrap_err();
        assert_eq!(err, MethodParseError("OPTIONS".to_string()));
    }

    #[test]
    fn serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Method::Put).unwrap(), "\"PUT\"");
        let m: Method = serde_json::from_str("\"GET\"").unwrap();
        assert!(m.is_read());
    }
}
