//! Join graph nodes with issues and annotate nodes from issue state.

use crate::graph::DotDocument;
use crate::marker::extract_node_id;
use crate::types::{ColorScheme, DuplicatePolicy, Issue};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Node {id} is referenced by more than one issue: {first} and {second}")]
    DuplicateIdentifier {
        id: String,
        first: String,
        second: String,
    },
}

/// Identifier → issue mapping built from issue bodies.
#[derive(Debug, Default)]
pub struct IssueIndex {
    pub issues: HashMap<String, Issue>,
    /// Issues whose body carries no marker, by URL.
    pub skipped: Vec<String>,
    /// Identifiers claimed by more than one issue.
    pub duplicates: Vec<String>,
}

impl IssueIndex {
    pub fn get(&self, node_id: &str) -> Option<&Issue> {
        self.issues.get(node_id)
    }
}

/// Options controlling how nodes are annotated.
#[derive(Debug, Clone, Default)]
pub struct AnnotateOptions {
    pub colors: ColorScheme,
    pub duplicates: DuplicatePolicy,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub annotated: Vec<String>,
    pub unmatched: Vec<String>,
    pub skipped_issues: Vec<String>,
    pub duplicates: Vec<String>,
}

/// Map node identifiers to issues.
///
/// Issues without a marker are skipped and recorded. Duplicate identifiers
/// are always recorded; `policy` decides which issue is kept or whether the
/// duplicate is an error.
pub fn build_issue_index(
    issues: &[Issue],
    policy: DuplicatePolicy,
) -> Result<IssueIndex, ReconcileError> {
    let mut index = IssueIndex::default();

    for issue in issues {
        let Some(node_id) = extract_node_id(&issue.body) else {
            warn!(url = %issue.html_url, "Skipping issue with missing ID marker");
            index.skipped.push(issue.html_url.clone());
            continue;
        };

        if let Some(existing) = index.issues.get(node_id) {
            warn!(
                node = node_id,
                first = %existing.html_url,
                second = %issue.html_url,
                "Node referenced by more than one issue"
            );
            if !index.duplicates.iter().any(|d| d == node_id) {
                index.duplicates.push(node_id.to_string());
            }
            match policy {
                DuplicatePolicy::KeepFirst => continue,
                DuplicatePolicy::KeepLast => {}
                DuplicatePolicy::Error => {
                    return Err(ReconcileError::DuplicateIdentifier {
                        id: node_id.to_string(),
                        first: existing.html_url.clone(),
                        second: issue.html_url.clone(),
                    });
                }
            }
        }

        index.issues.insert(node_id.to_string(), issue.clone());
    }

    Ok(index)
}

/// Annotate every node that has an issue in `index`.
///
/// Matched nodes get `style=filled`, a state-dependent `fillcolor` and the
/// issue `URL`. Unmatched nodes are left alone unless an unmatched color is
/// configured.
pub fn annotate(
    doc: &mut DotDocument,
    index: &IssueIndex,
    colors: &ColorScheme,
) -> ReconcileReport {
    let mut report = ReconcileReport {
        skipped_issues: index.skipped.clone(),
        duplicates: index.duplicates.clone(),
        ..ReconcileReport::default()
    };

    for name in doc.node_names() {
        match index.get(&name) {
            Some(issue) => {
                doc.set_attribute(&name, "style", "filled");
                doc.set_attribute(&name, "fillcolor", colors.for_state(issue.state));
                doc.set_quoted_attribute(&name, "URL", &issue.html_url);
                debug!(node = %name, state = %issue.state, "Annotated node");
                report.annotated.push(name);
            }
            None => {
                if let Some(color) = &colors.unmatched {
                    doc.set_attribute(&name, "style", "filled");
                    doc.set_attribute(&name, "fillcolor", color);
                }
                info!(node = %name, "No issue found for node");
                report.unmatched.push(name);
            }
        }
    }

    report
}

/// Build the index from `issues` and annotate `doc` in one step.
pub fn reconcile(
    doc: &mut DotDocument,
    issues: &[Issue],
    options: &AnnotateOptions,
) -> Result<ReconcileReport, ReconcileError> {
    let index = build_issue_index(issues, options.duplicates)?;
    Ok(annotate(doc, &index, &options.colors))
}
