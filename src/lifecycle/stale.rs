//! Stale issue sweep.

use crate::config::LifecycleConfig;
use crate::github::{GitHubError, HostingApi, Issue, IssueOrder, StateReason};
use crate::models::{FailedIssue, IssueRef, StaleSweep};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

/// Settings for one sweep.
#[derive(Debug, Clone)]
pub struct StalePolicy {
    pub inactivity_days: i64,
    pub fetch_limit: u32,
    pub comment: String,
    pub dry_run: bool,
}

impl StalePolicy {
    pub fn from_config(config: &LifecycleConfig, dry_run: bool) -> Self {
        Self {
            inactivity_days: config.inactivity_days,
            fetch_limit: config.stale_fetch_limit,
            comment: config
                .stale_comment
                .replace("{days}", &config.inactivity_days.to_string()),
            dry_run,
        }
    }
}

/// Issues (never pull requests) last updated before `now - days`.
///
/// A window shorter than one day, or one past the representable range,
/// matches nothing.
pub fn stale_issues(issues: &[Issue], inactivity_days: i64, now: DateTime<Utc>) -> Vec<&Issue> {
    if inactivity_days < 1 {
        return Vec::new();
    }
    let window = Duration::try_days(inactivity_days);
    let Some(cutoff) = window.and_then(|d| now.checked_sub_signed(d)) else {
        return Vec::new();
    };
    issues
        .iter()
        .filter(|issue| !issue.is_pull_request() && issue.updated_at < cutoff)
        .collect()
}

/// Comment on and close every stale issue.
///
/// Only listing the issues can fail the sweep. A failure on one issue
/// is recorded in `failed` and the sweep moves on; an issue whose
/// comment was posted but whose close failed stays open until the
/// next run. In dry-run mode the sweep reports what it would close.
pub async fn close_stale(
    api: &dyn HostingApi,
    owner: &str,
    repo: &str,
    policy: &StalePolicy,
    now: DateTime<Utc>,
) -> Result<StaleSweep, GitHubError> {
    let issues = api
        .list_open_issues(owner, repo, IssueOrder::LeastRecentlyUpdated, policy.fetch_limit)
        .await?;
    let stale = stale_issues(&issues, policy.inactivity_days, now);

    let mut sweep = StaleSweep {
        stale_count: stale.len(),
        ..Default::default()
    };

    for issue in stale {
        let issue_ref = IssueRef {
            number: issue.number,
            title: issue.title.clone(),
        };

        if policy.dry_run {
            info!("[dry-run] Would close {}/{}#{}", owner, repo, issue.number);
            sweep.closed.push(issue_ref);
            continue;
        }

        if let Err(e) = api
            .create_comment(owner, repo, issue.number, &policy.comment)
            .await
        {
            warn!("Failed to comment on {}/{}#{}: {}", owner, repo, issue.number, e);
            sweep.failed.push(FailedIssue {
                number: issue.number,
                title: issue_ref.title,
                commented: false,
                error: e.to_string(),
            });
            continue;
        }

        match api
            .close_issue(owner, repo, issue.number, StateReason::NotPlanned)
            .await
        {
            Ok(()) => {
                info!("Closed stale issue {}/{}#{}", owner, repo, issue.number);
                sweep.closed.push(issue_ref);
            }
            Err(e) => {
                warn!(
                    "Commented on {}/{}#{} but failed to close it: {}",
                    owner, repo, issue.number, e
                );
                sweep.failed.push(FailedIssue {
                    number: issue.number,
                    title: issue_ref.title,
                    commented: true,
                    error: e.to_string(),
                });
            }
        }
    }

    sweep.closed_count = sweep.closed.len();
    Ok(sweep)
}
