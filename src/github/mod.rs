//! Access to the code-hosting platform.
//!
//! Sections never build a client themselves: they receive a
//! [`HostingApi`] so the run can be pointed at GitHub or at a fake.

pub mod client;
pub mod types;

pub use client::{GitHubClient, GitHubError};
pub use types::{Issue, IssueOrder, Repository, StateReason, WeekActivity};

use async_trait::async_trait;

/// Operations the housekeeping run needs from the platform.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// One page (1-based) of the account's repositories.
    async fn list_repositories(
        &self,
        account: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, GitHubError>;

    /// Weekly commit totals for the last year.
    async fn commit_activity(&self, owner: &str, repo: &str)
        -> Result<Vec<WeekActivity>, GitHubError>;

    /// One page of open issues (and pull requests) in the given order.
    async fn list_open_issues(
        &self,
        owner: &str,
        repo: &str,
        order: IssueOrder,
        per_page: u32,
    ) -> Result<Vec<Issue>, GitHubError>;

    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError>;

    async fn close_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        reason: StateReason,
    ) -> Result<(), GitHubError>;

    /// Add labels to an issue. Labels already present are left alone
    /// by the platform.
    async fn add_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<(), GitHubError>;
}

#[cfg(test)]
pub mod fake {
    //! In-memory [`HostingApi`] for section tests.

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted responses plus a log of every mutating call.
    #[derive(Default)]
    pub struct FakeHosting {
        pub repositories: Vec<Repository>,
        pub activity: HashMap<String, Vec<WeekActivity>>,
        pub failing_activity: HashSet<String>,
        pub activity_delay: Option<Duration>,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
        pub issues: Vec<Issue>,
        pub failing_close: HashSet<u64>,
        pub page_requests: Mutex<Vec<u32>>,
        pub issue_orders: Mutex<Vec<IssueOrder>>,
        pub comments: Mutex<Vec<(u64, String)>>,
        pub closed: Mutex<Vec<u64>>,
        pub labels: Mutex<Vec<(u64, Vec<String>)>>,
    }

    pub fn repo(name: &str, language: Option<&str>, archived: bool) -> Repository {
        Repository {
            name: name.to_string(),
            html_url: format!("https://github.com/octocat/{}", name),
            description: None,
            language: language.map(String::from),
            stargazers_count: 2,
            forks_count: 1,
            open_issues_count: 0,
            archived,
            created_at: None,
            updated_at: None,
            pushed_at: None,
            owner: types::Owner {
                login: "octocat".to_string(),
            },
        }
    }

    pub fn issue(number: u64, title: &str, updated_at: chrono::DateTime<chrono::Utc>) -> Issue {
        Issue {
            number,
            title: title.to_string(),
            body: None,
            updated_at,
            pull_request: None,
        }
    }

    pub fn weeks(totals: &[u64]) -> Vec<WeekActivity> {
        totals
            .iter()
            .enumerate()
            .map(|(i, total)| WeekActivity {
                days: [0; 7],
                total: *total,
                week: 1_700_000_000 + (i as i64) * 604_800,
            })
            .collect()
    }

    fn api_error(message: &str) -> GitHubError {
        GitHubError::Api {
            status: 500,
            message: message.to_string(),
        }
    }

    #[async_trait]
    impl HostingApi for FakeHosting {
        async fn list_repositories(
            &self,
            _account: &str,
            page: u32,
            per_page: u32,
        ) -> Result<Vec<Repository>, GitHubError> {
            self.page_requests.lock().unwrap().push(page);
            let start = (page.saturating_sub(1) * per_page) as usize;
            Ok(self
                .repositories
                .iter()
                .skip(start)
                .take(per_page as usize)
                .cloned()
                .collect())
        }

        async fn commit_activity(
            &self,
            _owner: &str,
            repo: &str,
        ) -> Result<Vec<WeekActivity>, GitHubError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.activity_delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing_activity.contains(repo) {
                return Err(api_error("activity unavailable"));
            }
            Ok(self.activity.get(repo).cloned().unwrap_or_default())
        }

        async fn list_open_issues(
            &self,
            _owner: &str,
            _repo: &str,
            order: IssueOrder,
            per_page: u32,
        ) -> Result<Vec<Issue>, GitHubError> {
            self.issue_orders.lock().unwrap().push(order);
            Ok(self.issues.iter().take(per_page as usize).cloned().collect())
        }

        async fn create_comment(
            &self,
            _owner: &str,
            _repo: &str,
            number: u64,
            body: &str,
        ) -> Result<(), GitHubError> {
            self.comments.lock().unwrap().push((number, body.to_string()));
            Ok(())
        }

        async fn close_issue(
            &self,
            _owner: &str,
            _repo: &str,
            number: u64,
            _reason: StateReason,
        ) -> Result<(), GitHubError> {
            if self.failing_close.contains(&number) {
                return Err(api_error("close rejected"));
            }
            self.closed.lock().unwrap().push(number);
            Ok(())
        }

        async fn add_labels(
            &self,
            _owner: &str,
            _repo: &str,
            number: u64,
            labels: &[String],
        ) -> Result<(), GitHubError> {
            self.labels.lock().unwrap().push((number, labels.to_vec()));
            Ok(())
        }
    }
}
