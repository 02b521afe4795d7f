//! Issue lifecycle management.
//!
//! Closes stale issues and applies keyword labels, one repository at a
//! time. A failure in one repository, or in one of its two passes,
//! never stops the others.

pub mod labels;
pub mod stale;

pub use labels::auto_label;
pub use stale::{close_stale, StalePolicy};

use crate::cli::parse_repo_slug;
use crate::config::LifecycleConfig;
use crate::github::HostingApi;
use crate::models::{LifecycleReport, RepoLifecycle};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Run both passes over every repository.
pub async fn run(
    api: &dyn HostingApi,
    repositories: &[String],
    config: &LifecycleConfig,
    dry_run: bool,
    now: DateTime<Utc>,
) -> LifecycleReport {
    let policy = StalePolicy::from_config(config, dry_run);
    let mut results = Vec::with_capacity(repositories.len());

    for slug in repositories {
        let mut result = RepoLifecycle {
            repository: slug.clone(),
            stale: None,
            labels: None,
            errors: Vec::new(),
        };

        let Some((owner, repo)) = parse_repo_slug(slug) else {
            warn!("Skipping malformed repository '{}'", slug);
            result.errors.push("expected owner/name".to_string());
            results.push(result);
            continue;
        };

        info!("Managing issues in {}", slug);

        match close_stale(api, owner, repo, &policy, now).await {
            Ok(sweep) => result.stale = Some(sweep),
            Err(e) => {
                warn!("Stale sweep failed for {}: {}", slug, e);
                result.errors.push(format!("stale sweep: {}", e));
            }
        }

        match auto_label(api, owner, repo, config.label_fetch_limit, dry_run).await {
            Ok(pass) => result.labels = Some(pass),
            Err(e) => {
                warn!("Auto-label failed for {}: {}", slug, e);
                result.errors.push(format!("auto-label: {}", e));
            }
        }

        results.push(result);
    }

    LifecycleReport {
        timestamp: now,
        dry_run,
        repositories: results,
    }
}

impl LifecycleReport {
    /// True when any repository hit an error or a per-issue failure.
    pub fn has_failures(&self) -> bool {
        self.repositories.iter().any(|r| {
            !r.errors.is_empty()
                || r.stale.as_ref().is_some_and(|s| !s.failed.is_empty())
                || r.labels.as_ref().is_some_and(|l| !l.errors.is_empty())
        })
    }
}
