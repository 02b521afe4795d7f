//! Repository listing and commit-activity enrichment.

use crate::github::{GitHubError, HostingApi, Repository, WeekActivity};
use crate::models::{ActivityCount, RepoStatSnapshot};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for a collection run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Page size of the repository listing.
    pub per_page: u32,
    /// Maximum in-flight commit-activity requests.
    pub concurrency: usize,
    /// Deadline for one commit-activity request.
    pub request_timeout: Duration,
    /// Trailing weeks summed into `recent_activity`.
    pub recent_weeks: usize,
    /// Whether to draw a progress bar.
    pub show_progress: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            per_page: 100,
            concurrency: 4,
            request_timeout: Duration::from_secs(30),
            recent_weeks: 4,
            show_progress: false,
        }
    }
}

/// Everything one collection run produced.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Raw listing, in platform order.
    pub listing: Vec<Repository>,
    /// One snapshot per listed repository, same order as `listing`.
    pub snapshots: Vec<RepoStatSnapshot>,
    /// Repositories whose activity could not be fetched.
    pub activity_failures: usize,
}

/// Fetch every page of the account's repositories.
///
/// Stops at the first empty page.
pub async fn list_all(
    api: &dyn HostingApi,
    account: &str,
    per_page: u32,
) -> Result<Vec<Repository>, GitHubError> {
    let mut repos = Vec::new();
    let mut page = 1;

    loop {
        let batch = api.list_repositories(account, page, per_page).await?;
        if batch.is_empty() {
            break;
        }
        debug!("Page {}: {} repositories", page, batch.len());
        repos.extend(batch);
        page += 1;
    }

    Ok(repos)
}

/// Sum all weeks, and the last `recent_weeks` weeks.
pub fn fold_activity(weeks: &[WeekActivity], recent_weeks: usize) -> (u64, u64) {
    let total = weeks.iter().map(|w| w.total).sum();
    let recent = weeks
        .iter()
        .rev()
        .take(recent_weeks)
        .map(|w| w.total)
        .sum();
    (total, recent)
}

/// Build a snapshot; `activity` is `None` when the fetch failed.
pub fn snapshot(repo: &Repository, activity: Option<(u64, u64)>) -> RepoStatSnapshot {
    let (total_commits, recent_activity) = match activity {
        Some((total, recent)) => (ActivityCount::Count(total), ActivityCount::Count(recent)),
        None => (ActivityCount::NotAvailable, ActivityCount::NotAvailable),
    };

    RepoStatSnapshot {
        name: repo.name.clone(),
        url: repo.html_url.clone(),
        description: repo.description.clone(),
        language: repo
            .language
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        open_issues: repo.open_issues_count,
        archived: repo.archived,
        created_at: repo.created_at,
        updated_at: repo.updated_at,
        pushed_at: repo.pushed_at,
        total_commits,
        recent_activity,
    }
}

/// Enrich one repository. Never fails: errors become `N/A`.
async fn enrich(
    api: &dyn HostingApi,
    repo: &Repository,
    options: &CollectOptions,
) -> (RepoStatSnapshot, bool) {
    let fetch = api.commit_activity(&repo.owner.login, &repo.name);

    match tokio::time::timeout(options.request_timeout, fetch).await {
        Ok(Ok(weeks)) => {
            let activity = fold_activity(&weeks, options.recent_weeks);
            (snapshot(repo, Some(activity)), true)
        }
        Ok(Err(e)) => {
            warn!("Commit activity for {} unavailable: {}", repo.name, e);
            (snapshot(repo, None), false)
        }
        Err(_) => {
            warn!(
                "Commit activity for {} timed out after {}s",
                repo.name,
                options.request_timeout.as_secs()
            );
            (snapshot(repo, None), false)
        }
    }
}

fn progress_bar(len: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Collect snapshots for every repository of `account`.
///
/// A listing failure fails the collection. Activity failures are
/// isolated per repository and counted in the result.
pub async fn collect(
    api: &dyn HostingApi,
    account: &str,
    options: &CollectOptions,
) -> Result<Collection, GitHubError> {
    info!("Listing repositories for {}", account);
    let listing = list_all(api, account, options.per_page).await?;
    info!("Found {} repositories", listing.len());

    let pb = progress_bar(listing.len(), options.show_progress);
    pb.set_message("commit activity");

    let enriched: Vec<(RepoStatSnapshot, bool)> = stream::iter(listing.iter())
        .map(|repo| {
            let pb = &pb;
            async move {
                let result = enrich(api, repo, options).await;
                pb.inc(1);
                result
            }
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    pb.finish_and_clear();

    let activity_failures = enriched.iter().filter(|(_, ok)| !ok).count();
    let snapshots = enriched.into_iter().map(|(s, _)| s).collect();

    if activity_failures > 0 {
        warn!(
            "Commit activity unavailable for {} of {} repositories",
            activity_failures,
            listing.len()
        );
    }

    Ok(Collection {
        listing,
        snapshots,
        activity_failures,
    })
}
