//! Core types shared by the issue source, the creation tool and the reconciler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a remote issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

/// An issue as returned by the issue listing endpoint.
///
/// Only the fields the tools consume are decoded; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: IssueState,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    pub html_url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload for creating an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Owner/repository pair identifying the remote issue tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Which issue wins when two issues carry the same node identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The issue listed last replaces earlier ones.
    #[default]
    KeepLast,
    /// The issue listed first is kept; later ones are ignored.
    KeepFirst,
    /// Any duplicate aborts reconciliation.
    Error,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep-last" | "last" => Ok(DuplicatePolicy::KeepLast),
            "keep-first" | "first" => Ok(DuplicatePolicy::KeepFirst),
            "error" => Ok(DuplicatePolicy::Error),
            _ => Err(format!(
                "Invalid duplicate policy: {}. Must be keep-last, keep-first, or error",
                s
            )),
        }
    }
}

/// Fill colors applied to annotated nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub open: String,
    pub closed: String,
    /// Color for nodes without a matching issue. `None` leaves them untouched.
    pub unmatched: Option<String>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            open: "coral".to_string(),
            closed: "chartreuse".to_string(),
            unmatched: None,
        }
    }
}

impl ColorScheme {
    pub fn for_state(&self, state: IssueState) -> &str {
        match state {
            IssueState::Open => &self.open,
            IssueState::Closed => &self.closed,
        }
    }
}
