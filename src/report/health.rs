//! Health report composition.
//!
//! Pure aggregation of the other sections' results. Recommendation
//! rules are evaluated independently; each adds at most one line.

use crate::config::HealthConfig;
use crate::models::{
    CodeQuality, HealthReport, PortfolioHealth, RepoStatsSummary, ScanOutcome, SeverityTally,
};
use chrono::{DateTime, Utc};

/// Overall score written to every report.
// TODO: derive the score from scan and stats inputs once a weighting is agreed.
pub const PLACEHOLDER_SCORE: u8 = 85;

/// Compose the health report.
pub fn compose(
    code_quality: CodeQuality,
    security: ScanOutcome<SeverityTally>,
    stats: Option<&RepoStatsSummary>,
    config: &HealthConfig,
    now: DateTime<Utc>,
) -> HealthReport {
    let recommendations = recommendations(
        &code_quality,
        &security,
        stats,
        config.archived_ratio_threshold,
    );

    HealthReport {
        timestamp: now,
        portfolio_health: PortfolioHealth {
            score: PLACEHOLDER_SCORE,
            total_repos: stats.map(|s| s.total_repos),
            active_repos: stats.map(|s| s.active_repos),
            archived_repos: stats.map(|s| s.archived_repos()),
            total_stars: stats.map(|s| s.total_stars),
        },
        code_quality,
        security,
        recommendations,
    }
}

/// Names of every check that failed or found errors.
fn failing_checks(
    code_quality: &CodeQuality,
    security: &ScanOutcome<SeverityTally>,
) -> Vec<String> {
    let mut failing: Vec<String> = code_quality
        .lint
        .iter()
        .filter(|run| run.is_failing())
        .map(|run| run.tool.clone())
        .collect();

    if code_quality.outdated.is_failed() {
        failing.push("dependency check".to_string());
    }
    if security.is_failed() {
        failing.push("security audit".to_string());
    }

    failing
}

/// Whether archived repositories outnumber active ones past `threshold`.
fn archive_heavy(stats: &RepoStatsSummary, threshold: f64) -> bool {
    let archived = stats.archived_repos();
    if archived == 0 {
        return false;
    }
    if stats.active_repos == 0 {
        return true;
    }
    archived as f64 / stats.active_repos as f64 > threshold
}

/// Threshold rules, in fixed order.
pub fn recommendations(
    code_quality: &CodeQuality,
    security: &ScanOutcome<SeverityTally>,
    stats: Option<&RepoStatsSummary>,
    archived_ratio_threshold: f64,
) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(tally) = security.as_ok() {
        if tally.critical > 0 {
            out.push(format!(
                "Fix {} critical vulnerabilities immediately.",
                tally.critical
            ));
        }
        if tally.high > 0 {
            out.push(format!(
                "Review and patch {} high severity vulnerabilities.",
                tally.high
            ));
        }
    }

    let failing = failing_checks(code_quality, security);
    if !failing.is_empty() {
        out.push(format!(
            "Resolve failing quality checks: {}.",
            failing.join(", ")
        ));
    }

    if let Some(stats) = stats {
        if archive_heavy(stats, archived_ratio_threshold) {
            out.push(format!(
                "{} archived vs {} active repositories; consider cleaning up the archive.",
                stats.archived_repos(),
                stats.active_repos
            ));
        }
    }

    out
}
