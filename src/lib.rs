//! Issuegraph - keep a DOT task graph and its GitHub issues in sync.
//!
//! One tool creates an issue per graph node, tagging each issue body with a
//! `[node-id=...]` marker. The other fetches those issues back and colors the
//! graph's nodes by issue state, linking each node to its issue.

pub mod config;
pub mod generate;
pub mod github;
pub mod graph;
pub mod logging;
pub mod marker;
pub mod reconcile;
pub mod types;

pub use config::{CONFIG_FILE, Config, ConfigError, GitHubConfig, github_token};
pub use generate::{GenerateError, create_issues, plan_issues, validate_titles};
pub use github::{
    GitHubClient, GitHubError, IssueFilter, IssueTracker, StateFilter, list_issues, parse_query,
};
pub use graph::{DotDocument, GraphError};
pub use marker::{extract_node_id, node_marker};
pub use reconcile::{
    AnnotateOptions, IssueIndex, ReconcileError, ReconcileReport, annotate, build_issue_index,
    reconcile,
};
pub use types::{ColorScheme, DuplicatePolicy, Issue, IssueState, NewIssue, RepoRef};
