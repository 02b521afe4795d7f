//! Keyword-driven issue labelling.

use crate::github::{GitHubError, HostingApi, Issue, IssueOrder};
use crate::models::{LabelPass, LabeledIssue};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Label rules, checked in order. Every matching rule contributes its label.
const LABEL_PATTERNS: [(&str, &str); 5] = [
    (
        "bug",
        r"(?i)\b(bug|error|crash(es|ed)?|broken|fail(s|ed|ure)?|exception)\b",
    ),
    (
        "enhancement",
        r"(?i)\b(feature|enhancement|add support|request|would be nice)\b",
    ),
    ("documentation", r"(?i)\b(docs?|documentation|readme|typo)\b"),
    (
        "question",
        r"(?i)(\?|\b(how (do|to|can)|what is|why does|question)\b)",
    ),
    ("good first issue", r"(?i)\b(easy|simple|beginner|starter)\b"),
];

static LABEL_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    LABEL_PATTERNS
        .iter()
        .filter_map(|(label, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((*label, re)),
            Err(e) => {
                warn!("Ignoring label rule {}: {}", label, e);
                None
            }
        })
        .collect()
});

/// Labels whose keywords appear in the title or body.
pub fn labels_for(title: &str, body: Option<&str>) -> Vec<String> {
    let text = format!("{} {}", title, body.unwrap_or_default());
    LABEL_RULES
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&text))
        .map(|(label, _)| label.to_string())
        .collect()
}

fn matched(issue: &Issue) -> Option<LabeledIssue> {
    let labels = labels_for(&issue.title, issue.body.as_deref());
    if labels.is_empty() {
        return None;
    }
    Some(LabeledIssue {
        number: issue.number,
        labels,
    })
}

/// Apply keyword labels to the `limit` newest open issues.
///
/// Labels already on an issue are sent again; the platform treats that
/// as a no-op. A failure on one issue is recorded and the pass goes on.
pub async fn auto_label(
    api: &dyn HostingApi,
    owner: &str,
    repo: &str,
    limit: u32,
    dry_run: bool,
) -> Result<LabelPass, GitHubError> {
    let issues = api
        .list_open_issues(owner, repo, IssueOrder::Newest, limit)
        .await?;
    let mut pass = LabelPass {
        processed: issues.len(),
        ..Default::default()
    };

    for labeled in issues.iter().filter_map(matched) {
        if dry_run {
            info!(
                "[dry-run] Would label {}/{}#{} with {:?}",
                owner, repo, labeled.number, labeled.labels
            );
            pass.applied.push(labeled);
            continue;
        }

        match api
            .add_labels(owner, repo, labeled.number, &labeled.labels)
            .await
        {
            Ok(()) => {
                debug!("Labelled {}/{}#{}: {:?}", owner, repo, labeled.number, labeled.labels);
                pass.applied.push(labeled);
            }
            Err(e) => {
                warn!("Failed to label {}/{}#{}: {}", owner, repo, labeled.number, e);
                pass.errors.push(format!("#{}: {}", labeled.number, e));
            }
        }
    }

    pass.labeled = pass.applied.len();
    info!(
        "Labelled {} of {} open issues in {}/{}",
        pass.labeled, pass.processed, owner, repo
    );
    Ok(pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::{issue, FakeHosting};
    use chrono::Utc;

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(LABEL_RULES.len(), LABEL_PATTERNS.len());
    }

    #[test]
    fn test_crash_is_a_bug() {
        assert_eq!(labels_for("App crashes on startup", None), vec!["bug"]);
    }

    #[test]
    fn test_how_do_i_is_a_question() {
        assert_eq!(labels_for("How do I configure this?", None), vec!["question"]);
    }

    #[test]
    fn test_all_matching_labels_apply() {
        let labels = labels_for("Why does the app crash on save?", None);
        assert_eq!(labels, vec!["bug", "question"]);
    }

    #[test]
    fn test_body_is_searched() {
        let labels = labels_for("Small thing", Some("There is a typo in the README"));
        assert_eq!(labels, vec!["documentation"]);
    }

    #[test]
    fn test_no_keywords_no_labels() {
        assert!(labels_for("Refactor module layout", Some("Moves files around.")).is_empty());
        // word boundaries: "debugger" is not "bug"
        assert!(labels_for("Update debugger integration", None).is_empty());
    }

    #[tokio::test]
    async fn test_auto_label_applies_matches() {
        let now = Utc::now();
        let api = FakeHosting {
            issues: vec![
                issue(1, "App crashes on startup", now),
                issue(2, "How do I configure this?", now),
                issue(3, "Refactor module layout", now),
            ],
            ..Default::default()
        };

        let pass = auto_label(&api, "octocat", "site", 50, false).await.unwrap();

        assert_eq!(pass.processed, 3);
        assert_eq!(pass.labeled, 2);
        let sent = api.labels.lock().unwrap();
        assert_eq!(sent[0], (1, vec!["bug".to_string()]));
        assert_eq!(sent[1], (2, vec!["question".to_string()]));
        assert_eq!(*api.issue_orders.lock().unwrap(), vec![IssueOrder::Newest]);
    }

    #[tokio::test]
    async fn test_auto_label_respects_limit_and_dry_run() {
        let now = Utc::now();
        let api = FakeHosting {
            issues: (1..=5)
                .map(|n| issue(n, "Crash when saving", now))
                .collect(),
            ..Default::default()
        };

        let pass = auto_label(&api, "octocat", "site", 3, true).await.unwrap();

        assert_eq!(pass.processed, 3);
        assert_eq!(pass.labeled, 3);
        assert!(api.labels.lock().unwrap().is_empty());
    }
}
