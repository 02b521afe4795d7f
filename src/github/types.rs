//! Wire types for the GitHub REST API.
//!
//! Only the fields the housekeeping run reads are modelled; everything
//! else in the payloads is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository as returned by the repository listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    pub owner: Owner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// One week of the commit-activity statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WeekActivity {
    /// Commits per day, Sunday first.
    #[serde(default)]
    pub days: [u64; 7],
    pub total: u64,
    /// Start of the week as a Unix timestamp.
    pub week: i64,
}

/// Issue or pull request from the issues listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Present only when the entry is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Order of the open-issues listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOrder {
    /// Least recently updated first; the stale sweep looks at the oldest.
    LeastRecentlyUpdated,
    /// Most recently created first; labelling looks at new issues.
    Newest,
}

impl IssueOrder {
    /// `sort` and `direction` query values.
    pub fn query(self) -> (&'static str, &'static str) {
        match self {
            IssueOrder::LeastRecentlyUpdated => ("updated", "asc"),
            IssueOrder::Newest => ("created", "desc"),
        }
    }
}

/// Why an issue is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateReason {
    NotPlanned,
}

#[derive(Debug, Serialize)]
pub(crate) struct CloseIssueRequest {
    pub state: &'static str,
    pub state_reason: StateReason,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentRequest<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LabelsRequest<'a> {
    pub labels: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
