//! Repository statistics aggregation.
//!
//! This module folds a [`Collection`] into the summary written to the
//! stats file.

use super::collector::Collection;
use crate::github::Repository;
use crate::models::{ActiveRepo, RepoStatSnapshot, RepoStatsSummary};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Count repositories per reported language.
///
/// Repositories the platform reports without a language are left out
/// here, even though their snapshot shows `"Unknown"`.
pub fn language_distribution(listing: &[Repository]) -> BTreeMap<String, usize> {
    let mut dist: BTreeMap<String, usize> = BTreeMap::new();

    for repo in listing {
        if let Some(language) = repo.language.as_deref().filter(|l| !l.is_empty()) {
            *dist.entry(language.to_string()).or_default() += 1;
        }
    }

    dist
}

/// Top `n` repositories by recent activity, highest first.
///
/// Ties keep listing order. Repositories without activity data are
/// not ranked.
pub fn most_active(snapshots: &[RepoStatSnapshot], n: usize) -> Vec<ActiveRepo> {
    let mut ranked: Vec<&RepoStatSnapshot> = snapshots
        .iter()
        .filter(|s| s.recent_activity.value().is_some())
        .collect();

    // sort_by_key is stable
    ranked.sort_by_key(|s| Reverse(s.recent_activity.value()));
    ranked.truncate(n);

    ranked
        .into_iter()
        .map(|s| ActiveRepo {
            name: s.name.clone(),
            url: s.url.clone(),
            recent_activity: s.recent_activity,
            total_commits: s.total_commits,
        })
        .collect()
}

/// Build the stats file contents.
pub fn summarize(collection: Collection, top_n: usize, now: DateTime<Utc>) -> RepoStatsSummary {
    let snapshots = collection.snapshots;

    RepoStatsSummary {
        timestamp: now,
        total_repos: snapshots.len(),
        active_repos: snapshots.iter().filter(|s| !s.archived).count(),
        total_stars: snapshots.iter().map(|s| s.stars).sum(),
        total_forks: snapshots.iter().map(|s| s.forks).sum(),
        by_language: language_distribution(&collection.listing),
        most_active: most_active(&snapshots, top_n),
        activity_unavailable: collection.activity_failures,
        repositories: snapshots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::repo;
    use crate::models::ActivityCount;
    use crate::stats::collector::snapshot;

    fn collection_of(specs: &[(&str, Option<&str>, bool, Option<u64>)]) -> Collection {
        let listing: Vec<Repository> = specs
            .iter()
            .map(|(name, lang, archived, _)| repo(name, *lang, *archived))
            .collect();
        let snapshots = listing
            .iter()
            .zip(specs)
            .map(|(r, (_, _, _, recent))| snapshot(r, recent.map(|n| (n * 2, n))))
            .collect();

        Collection {
            listing,
            snapshots,
            activity_failures: 0,
        }
    }

    #[test]
    fn test_language_tally_excludes_missing_language() {
        let collection = collection_of(&[
            ("a", Some("Rust"), false, Some(1)),
            ("b", Some("Rust"), false, Some(1)),
            ("c", None, false, Some(1)),
            ("d", Some("Go"), true, Some(1)),
            ("e", Some(""), false, Some(1)),
        ]);

        let summary = summarize(collection, 5, Utc::now());

        assert_eq!(summary.by_language.get("Rust"), Some(&2));
        assert_eq!(summary.by_language.get("Go"), Some(&1));
        assert!(!summary.by_language.contains_key("Unknown"));

        let tallied: usize = summary.by_language.values().sum();
        assert!(tallied <= summary.total_repos);
        assert!(summary.repositories.iter().all(|r| !r.language.is_empty()));
    }

    #[test]
    fn test_totals_and_active_count() {
        let collection = collection_of(&[
            ("a", Some("Rust"), false, Some(1)),
            ("b", Some("Rust"), true, Some(0)),
            ("c", None, true, None),
        ]);

        let summary = summarize(collection, 5, Utc::now());

        assert_eq!(summary.total_repos, 3);
        assert_eq!(summary.active_repos, 1);
        assert_eq!(summary.archived_repos(), 2);
        assert_eq!(summary.total_stars, 6);
        assert_eq!(summary.total_forks, 3);
    }

    #[test]
    fn test_most_active_sorted_capped_and_stable() {
        let collection = collection_of(&[
            ("first-tie", None, false, Some(5)),
            ("low", None, false, Some(1)),
            ("top", None, false, Some(9)),
            ("second-tie", None, false, Some(5)),
            ("missing", None, false, None),
            ("zero", None, false, Some(0)),
            ("third-tie", None, false, Some(5)),
        ]);

        let ranked = most_active(&collection.snapshots, 5);

        let names: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["top", "first-tie", "second-tie", "third-tie", "low"]
        );
        assert!(ranked
            .windows(2)
            .all(|w| w[0].recent_activity.value() >= w[1].recent_activity.value()));
        assert!(ranked
            .iter()
            .all(|r| r.recent_activity != ActivityCount::NotAvailable));
    }

    #[test]
    fn test_most_active_short_list() {
        let collection = collection_of(&[("only", None, false, Some(3))]);
        assert_eq!(most_active(&collection.snapshots, 5).len(), 1);
    }
}
