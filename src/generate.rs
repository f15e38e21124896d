//! Create one issue per graph node.
//!
//! All nodes are validated before the first remote call, so a missing title
//! can never leave the tracker half-populated.

use crate::github::{GitHubError, IssueTracker};
use crate::graph::DotDocument;
use crate::marker::node_marker;
use crate::types::{Issue, NewIssue, RepoRef};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_TITLE_ATTRIBUTE: &str = "label";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Node {node:?} is missing the {attribute:?} attribute")]
    MissingTitle { node: String, attribute: String },

    #[error("Failed to create issue for node {node:?} after creating {created} issue(s): {source}")]
    GitHub {
        node: String,
        created: usize,
        source: GitHubError,
    },
}

/// Build the issue payload for every node, failing on the first node whose
/// title attribute is missing or blank.
pub fn plan_issues(
    doc: &DotDocument,
    title_attribute: &str,
    labels: &[String],
) -> Result<Vec<(String, NewIssue)>, GenerateError> {
    doc.node_names()
        .into_iter()
        .map(|name| {
            let title = doc
                .attribute(&name, title_attribute)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .ok_or_else(|| GenerateError::MissingTitle {
                    node: name.clone(),
                    attribute: title_attribute.to_string(),
                })?;
            let issue = NewIssue {
                title,
                body: node_marker(&name),
                labels: labels.to_vec(),
            };
            Ok((name, issue))
        })
        .collect()
}

/// Check that every node carries a non-empty title attribute.
pub fn validate_titles(doc: &DotDocument, title_attribute: &str) -> Result<(), GenerateError> {
    plan_issues(doc, title_attribute, &[]).map(|_| ())
}

/// Create the planned issues in order, stopping at the first failure.
///
/// There is no rollback: issues created before a failure stay created, and
/// the error reports how many there were.
pub async fn create_issues<T: IssueTracker + ?Sized>(
    tracker: &T,
    repo: &RepoRef,
    planned: &[(String, NewIssue)],
) -> Result<Vec<Issue>, GenerateError> {
    let mut created = Vec::with_capacity(planned.len());
    for (node, new_issue) in planned {
        info!(node = %node, repo = %repo, "Creating issue");
        let issue = tracker
            .create_issue(repo, new_issue)
            .await
            .map_err(|source| GenerateError::GitHub {
                node: node.clone(),
                created: created.len(),
                source,
            })?;
        created.push(issue);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::mock::MockTracker;

    fn labels() -> Vec<String> {
        vec!["promcon-2019".to_string()]
    }

    fn repo() -> RepoRef {
        RepoRef::new("prometheus", "promcon")
    }

    #[test]
    fn test_plan_issues_builds_marker_bodies() {
        let doc =
            DotDocument::parse(r#"digraph { A [label="Do X"]; B [label="Do Y"]; A -> B; }"#)
                .unwrap();
        let planned = plan_issues(&doc, "label", &labels()).unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].0, "A");
        assert_eq!(planned[0].1.title, "Do X");
        assert_eq!(planned[0].1.body, "[node-id=A]");
        assert_eq!(planned[0].1.labels, labels());
        assert_eq!(planned[1].1.body, "[node-id=B]");
    }

    #[test]
    fn test_missing_title_is_reported_with_node_name() {
        let doc = DotDocument::parse(r#"digraph { A [label="Do X"]; B [shape=box]; }"#).unwrap();
        match validate_titles(&doc, "label") {
            Err(GenerateError::MissingTitle { node, attribute }) => {
                assert_eq!(node, "B");
                assert_eq!(attribute, "label");
            }
            other => panic!("Expected MissingTitle, got: {:?}", other),
        }
    }

    #[test]
    fn test_blank_title_counts_as_missing() {
        let doc = DotDocument::parse(r#"digraph { A [label="  "]; }"#).unwrap();
        assert!(validate_titles(&doc, "label").is_err());
    }

    #[test]
    fn test_edge_only_node_has_no_title() {
        let doc = DotDocument::parse(r#"digraph { A [label="Do X"]; A -> C; }"#).unwrap();
        assert!(matches!(
            validate_titles(&doc, "label"),
            Err(GenerateError::MissingTitle { node, .. }) if node == "C"
        ));
    }

    #[test]
    fn test_custom_title_attribute() {
        let doc = DotDocument::parse(r#"digraph { A [label="x", title="Ship it"]; }"#).unwrap();
        let planned = plan_issues(&doc, "title", &[]).unwrap();
        assert_eq!(planned[0].1.title, "Ship it");
    }

    #[tokio::test]
    async fn test_missing_title_makes_no_remote_calls() {
        let doc = DotDocument::parse(r#"digraph { A [label="Do X"]; B; }"#).unwrap();
        let tracker = MockTracker::default();

        let result = match plan_issues(&doc, "label", &labels()) {
            Ok(planned) => create_issues(&tracker, &repo(), &planned).await.map(|_| ()),
            Err(e) => Err(e),
        };

        assert!(matches!(result, Err(GenerateError::MissingTitle { .. })));
        assert!(tracker.created().is_empty());
    }

    #[tokio::test]
    async fn test_create_issues_in_node_order() {
        let doc =
            DotDocument::parse(r#"digraph { B [label="Do Y"]; A [label="Do X"]; }"#).unwrap();
        let tracker = MockTracker::default();
        let planned = plan_issues(&doc, "label", &labels()).unwrap();

        let created = create_issues(&tracker, &repo(), &planned).await.unwrap();

        assert_eq!(created.len(), 2);
        let bodies: Vec<String> = tracker.created().into_iter().map(|i| i.body).collect();
        assert_eq!(bodies, vec!["[node-id=B]", "[node-id=A]"]);
    }

    #[tokio::test]
    async fn test_create_issues_stops_at_first_failure() {
        let doc = DotDocument::parse(
            r#"digraph { A [label="a"]; B [label="b"]; C [label="c"]; }"#,
        )
        .unwrap();
        let tracker = MockTracker {
            fail_create_after: Some(1),
            ..MockTracker::default()
        };
        let planned = plan_issues(&doc, "label", &labels()).unwrap();

        match create_issues(&tracker, &repo(), &planned).await {
            Err(GenerateError::GitHub { node, created, .. }) => {
                assert_eq!(node, "B");
                assert_eq!(created, 1);
            }
            other => panic!("Expected GitHub error, got: {:?}", other),
        }
        assert_eq!(tracker.created().len(), 1);
    }
}
