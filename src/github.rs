//! GitHub issue source and issue creation.
//!
//! [`IssueTracker`] is the seam between the tools and the network: the
//! production [`GitHubClient`] talks to the REST API with `reqwest`, tests
//! substitute a scripted tracker. Pagination lives in [`list_issues`] so it
//! behaves the same for every tracker.

use crate::types::{Issue, NewIssue, RepoRef};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const API_VERSION: &str = "2022-11-28";

#[derive(thiserror::Error, Debug)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("GitHub API rate limited, try again later")]
    RateLimited,

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
}

/// State filter for issue listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFilter::All => "all",
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
        }
    }
}

impl FromStr for StateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StateFilter::All),
            "open" => Ok(StateFilter::Open),
            "closed" => Ok(StateFilter::Closed),
            _ => Err(format!(
                "Invalid state: {}. Must be all, open, or closed",
                s
            )),
        }
    }
}

/// Which issues to list: labels, state, and any extra raw query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub labels: Vec<String>,
    pub state: StateFilter,
    pub extra: Vec<(String, String)>,
}

impl IssueFilter {
    pub fn with_labels(labels: Vec<String>) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }

    /// Add the parameters of a raw query string such as `labels=a,b&milestone=3`.
    ///
    /// `labels` and `state` replace the structured fields. `page` and
    /// `per_page` are owned by pagination and are dropped.
    pub fn extend_with_query(&mut self, query: &str) -> Result<(), GitHubError> {
        for (key, value) in parse_query(query)? {
            match key.as_str() {
                "labels" => {
                    self.labels = value
                        .split(',')
                        .map(|l| l.trim().to_string())
                        .filter(|l| !l.is_empty())
                        .collect();
                }
                "state" => {
                    self.state = value.parse().map_err(GitHubError::InvalidQuery)?;
                }
                "page" | "per_page" => {
                    warn!(parameter = %key, "Ignoring pagination parameter in query filter");
                }
                _ => self.extra.push((key, value)),
            }
        }
        Ok(())
    }

    /// Query parameters for one page of the listing.
    pub fn query_pairs(&self, page: u32, per_page: u32) -> Vec<(String, String)> {
        let mut pairs = vec![("state".to_string(), self.state.as_str().to_string())];
        if !self.labels.is_empty() {
            pairs.push(("labels".to_string(), self.labels.join(",")));
        }
        pairs.extend(self.extra.iter().cloned());
        pairs.push(("per_page".to_string(), per_page.to_string()));
        pairs.push(("page".to_string(), page.to_string()));
        pairs
    }
}

/// Decode an `application/x-www-form-urlencoded` query string.
pub fn parse_query(query: &str) -> Result<Vec<(String, String)>, GitHubError> {
    let trimmed = query.trim().trim_start_matches('?');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.split('&').any(|part| part.is_empty() || part.starts_with('=')) {
        return Err(GitHubError::InvalidQuery(query.to_string()));
    }
    let url = reqwest::Url::parse(&format!("http://localhost/?{}", trimmed))
        .map_err(|e| GitHubError::InvalidQuery(format!("{}: {}", query, e)))?;
    Ok(url.query_pairs().into_owned().collect())
}

/// Remote issue tracker operations.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch one page (1-based) of the issue listing.
    async fn list_page(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Issue>, GitHubError>;

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> Result<Issue, GitHubError>;
}

/// List every issue matching `filter`, following pages until one comes back empty.
///
/// Issues are returned in the order the tracker produced them. Any failed
/// page aborts the whole listing.
pub async fn list_issues<T: IssueTracker + ?Sized>(
    tracker: &T,
    repo: &RepoRef,
    filter: &IssueFilter,
    per_page: u32,
) -> Result<Vec<Issue>, GitHubError> {
    let per_page = per_page.max(1);
    let mut issues = Vec::new();
    let mut page = 1;
    loop {
        let batch = tracker.list_page(repo, filter, page, per_page).await?;
        debug!(page, count = batch.len(), "Fetched issue page");
        if batch.is_empty() {
            break;
        }
        issues.extend(batch);
        page += 1;
    }
    Ok(issues)
}

/// GitHub REST client.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Build a client for `api_url` authenticating with `token`.
    ///
    /// Every request has a 30 second timeout; a listing page that takes
    /// longer fails the whole run.
    pub fn new(api_url: &str, token: &str) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("issuegraph/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn issues_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}/issues", self.api_url, repo.owner, repo.repo)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

/// Map a non-success response to an error. 403/429 with an exhausted
/// rate limit become [`GitHubError::RateLimited`].
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, GitHubError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let exhausted = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    if (status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS) && exhausted {
        return Err(GitHubError::RateLimited);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GitHubError::Status { status, body })
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn list_page(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Issue>, GitHubError> {
        let url = self.issues_url(repo);
        let resp = self
            .request(reqwest::Method::GET, &url)
            .query(&filter.query_pairs(page, per_page))
            .send()
            .await?;
        let resp = check_response(resp).await?;
        Ok(resp.json().await?)
    }

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> Result<Issue, GitHubError> {
        let url = self.issues_url(repo);
        let resp = self
            .request(reqwest::Method::POST, &url)
            .json(issue)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        Ok(resp.json().await?)
    }
}

/// Scripted tracker for tests: serves pre-built pages and records calls.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::types::IssueState;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockTracker {
        pub pages: Vec<Vec<Issue>>,
        pub fail_page: Option<u32>,
        pub fail_create_after: Option<usize>,
        pub page_requests: Mutex<Vec<u32>>,
        pub created: Mutex<Vec<NewIssue>>,
    }

    impl MockTracker {
        pub fn with_pages(pages: Vec<Vec<Issue>>) -> Self {
            Self {
                pages,
                ..Self::default()
            }
        }

        pub fn page_requests(&self) -> Vec<u32> {
            self.page_requests.lock().unwrap().clone()
        }

        pub fn created(&self) -> Vec<NewIssue> {
            self.created.lock().unwrap().clone()
        }
    }

    pub fn issue(number: u64, state: IssueState, body: &str) -> Issue {
        Issue {
            number,
            title: format!("Issue {}", number),
            state,
            body: body.to_string(),
            html_url: format!("https://github.com/o/r/issues/{}", number),
        }
    }

    fn server_error() -> GitHubError {
        GitHubError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        }
    }

    #[async_trait]
    impl IssueTracker for MockTracker {
        async fn list_page(
            &self,
            _repo: &RepoRef,
            _filter: &IssueFilter,
            page: u32,
            _per_page: u32,
        ) -> Result<Vec<Issue>, GitHubError> {
            self.page_requests.lock().unwrap().push(page);
            if self.fail_page == Some(page) {
                return Err(server_error());
            }
            Ok(self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default())
        }

        async fn create_issue(
            &self,
            _repo: &RepoRef,
            issue: &NewIssue,
        ) -> Result<Issue, GitHubError> {
            let mut created = self.created.lock().unwrap();
            if self.fail_create_after == Some(created.len()) {
                return Err(server_error());
            }
            created.push(issue.clone());
            let number = created.len() as u64;
            Ok(Issue {
                number,
                title: issue.title.clone(),
                state: IssueState::Open,
                body: issue.body.clone(),
                html_url: format!("https://github.com/o/r/issues/{}", number),
            })
        }
    }
}
