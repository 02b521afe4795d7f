//! Data models for the housekeeping run.
//!
//! This module contains the records persisted to the output directory
//! and the intermediate results passed between sections.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Content bucket in the daily fact rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Life,
    People,
    Tech,
}

/// Fixed rotation order. The cursor indexes into this array.
pub const CYCLE: [Category; 3] = [Category::Life, Category::People, Category::Tech];

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Life => write!(f, "LIFE"),
            Category::People => write!(f, "PEOPLE"),
            Category::Tech => write!(f, "TECH"),
        }
    }
}

impl Category {
    /// Returns an emoji representation of the category.
    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Life => "🌱",
            Category::People => "🧑",
            Category::Tech => "💻",
        }
    }
}

/// Persisted rotation cursor: whose turn is next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationState {
    /// Position in [`CYCLE`], always in `0..CYCLE.len()`.
    pub current_index: usize,
    /// Category at `current_index`.
    pub current_category: Category,
    /// When the cursor last moved.
    pub last_updated: DateTime<Utc>,
}

/// One catalog entry. The catalog is compiled in and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactRecord {
    pub fact: &'static str,
    pub source: &'static str,
}

/// The daily fact file, regenerated on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFactPublication {
    /// Calendar date of the run (UTC).
    pub date: NaiveDate,
    /// Exact time of the run.
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub fact: String,
    pub source: String,
    /// Position in the cycle, formatted as `"<n>/<len>"` (1-based).
    pub rotation_cycle: String,
    pub next_category: Category,
}

/// Commit count that may be unavailable for a single repository.
///
/// Serialized as a number, or as the string `"N/A"` when the
/// activity fetch for that repository failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityCount {
    Count(u64),
    NotAvailable,
}

impl ActivityCount {
    /// The numeric value, if one was collected.
    pub fn value(&self) -> Option<u64> {
        match self {
            ActivityCount::Count(n) => Some(*n),
            ActivityCount::NotAvailable => None,
        }
    }
}

impl fmt::Display for ActivityCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityCount::Count(n) => write!(f, "{}", n),
            ActivityCount::NotAvailable => write!(f, "N/A"),
        }
    }
}

impl Serialize for ActivityCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ActivityCount::Count(n) => serializer.serialize_u64(*n),
            ActivityCount::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for ActivityCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(ActivityCount::Count(n)),
            Raw::Text(s) if s == "N/A" => Ok(ActivityCount::NotAvailable),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a commit count or \"N/A\", got {:?}",
                s
            ))),
        }
    }
}

/// Per-repository record in the stats file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoStatSnapshot {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    /// Primary language, `"Unknown"` when the platform reports none.
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub archived: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    /// Sum of all weekly commit totals for the last year.
    pub total_commits: ActivityCount,
    /// Sum of the most recent weekly commit totals.
    pub recent_activity: ActivityCount,
}

/// Slim entry in the "most active" ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRepo {
    pub name: String,
    pub url: String,
    pub recent_activity: ActivityCount,
    pub total_commits: ActivityCount,
}

/// The repository statistics file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoStatsSummary {
    pub timestamp: DateTime<Utc>,
    pub total_repos: usize,
    /// Repositories that are not archived.
    pub active_repos: usize,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Repository count per reported language. Repositories without a
    /// language are left out, so the values may sum to less than
    /// `total_repos`.
    pub by_language: BTreeMap<String, usize>,
    pub most_active: Vec<ActiveRepo>,
    /// Repositories whose commit activity could not be fetched.
    #[serde(default)]
    pub activity_unavailable: usize,
    pub repositories: Vec<RepoStatSnapshot>,
}

impl RepoStatsSummary {
    /// Number of archived repositories.
    pub fn archived_repos(&self) -> usize {
        self.total_repos.saturating_sub(self.active_repos)
    }
}

/// Result of running one external tool.
///
/// `Skipped` means the tool does not apply here (missing manifest,
/// binary not installed, section not selected); `Failed` means it
/// should have produced a result and did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanOutcome<T> {
    Ok(T),
    Skipped { reason: String },
    Failed { error: String },
}

impl<T> ScanOutcome<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        ScanOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ScanOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            ScanOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScanOutcome::Failed { .. })
    }
}

/// Pass/fail verdict of a linter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
}

/// Normalized linter output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LintSummary {
    pub files_checked: usize,
    pub files_passed: usize,
    pub files_failed: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl LintSummary {
    pub fn status(&self) -> CheckStatus {
        if self.error_count > 0 {
            CheckStatus::Failed
        } else {
            CheckStatus::Passed
        }
    }
}

/// One linter entry in the health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintRun {
    pub tool: String,
    #[serde(flatten)]
    pub outcome: ScanOutcome<LintSummary>,
}

impl LintRun {
    /// A linter counts as failed when it found errors or could not run.
    pub fn is_failing(&self) -> bool {
        match &self.outcome {
            ScanOutcome::Ok(summary) => summary.status() == CheckStatus::Failed,
            ScanOutcome::Failed { .. } => true,
            ScanOutcome::Skipped { .. } => false,
        }
    }
}

/// One dependency with a newer release available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdatedPackage {
    pub name: String,
    pub current: Option<String>,
    pub wanted: Option<String>,
    pub latest: Option<String>,
}

/// Normalized dependency-outdated output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutdatedSummary {
    pub count: usize,
    pub packages: Vec<OutdatedPackage>,
}

/// Vulnerability severity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Moderate => write!(f, "Moderate"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Moderate => "🟡",
            Severity::High => "🟠",
            Severity::Critical => "🔴",
        }
    }
}

/// Vulnerability counts by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityTally {
    pub critical: u64,
    pub high: u64,
    pub moderate: u64,
    pub low: u64,
    pub total: u64,
}

impl SeverityTally {
    /// Count for one bucket.
    pub fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Moderate => self.moderate,
            Severity::Low => self.low,
        }
    }
}

/// Overall portfolio block of the health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioHealth {
    pub score: u8,
    pub total_repos: Option<usize>,
    pub active_repos: Option<usize>,
    pub archived_repos: Option<usize>,
    pub total_stars: Option<u64>,
}

/// Code quality block of the health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeQuality {
    pub lint: Vec<LintRun>,
    pub outdated: ScanOutcome<OutdatedSummary>,
}

impl CodeQuality {
    /// Placeholder used when the quality section did not run.
    pub fn not_run(reason: &str) -> Self {
        Self {
            lint: Vec::new(),
            outdated: ScanOutcome::skipped(reason),
        }
    }
}

/// The health report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub portfolio_health: PortfolioHealth,
    pub code_quality: CodeQuality,
    pub security: ScanOutcome<SeverityTally>,
    pub recommendations: Vec<String>,
}

/// Reference to an issue touched by the lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
}

/// An issue whose comment-then-close sequence did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedIssue {
    pub number: u64,
    pub title: String,
    /// True when the comment was posted before the failure.
    pub commented: bool,
    pub error: String,
}

/// Result of closing stale issues in one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleSweep {
    pub stale_count: usize,
    pub closed_count: usize,
    pub closed: Vec<IssueRef>,
    pub failed: Vec<FailedIssue>,
}

/// Labels applied to one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledIssue {
    pub number: u64,
    pub labels: Vec<String>,
}

/// Result of the auto-label pass over one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPass {
    pub processed: usize,
    pub labeled: usize,
    pub applied: Vec<LabeledIssue>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

/// Lifecycle results for one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoLifecycle {
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<StaleSweep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelPass>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

/// The lifecycle file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
    pub repositories: Vec<RepoLifecycle>,
}

/// How one section of the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Ok,
    Degraded,
    Skipped,
}

/// One entry of the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionReport {
    pub name: String,
    pub status: SectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SectionReport {
    pub fn ok(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: SectionStatus::Ok,
            detail: Some(detail.into()),
        }
    }

    pub fn degraded(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: SectionStatus::Degraded,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: SectionStatus::Skipped,
            detail: None,
        }
    }
}

/// Outcome of a whole run, handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub sections: Vec<SectionReport>,
}

impl RunSummary {
    /// True when any section ended degraded.
    pub fn has_degraded(&self) -> bool {
        self.sections
            .iter()
            .any(|s| s.status == SectionStatus::Degraded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Category::Life).unwrap(), "\"LIFE\"");
        assert_eq!(
            serde_json::from_str::<Category>("\"TECH\"").unwrap(),
            Category::Tech
        );
        assert_eq!(Category::People.to_string(), "PEOPLE");
    }

    #[test]
    fn test_rotation_state_uses_camel_case() {
        let state = RotationState {
            current_index: 1,
            current_category: Category::People,
            last_updated: Utc::now(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentIndex"], 1);
        assert_eq!(json["currentCategory"], "PEOPLE");
        assert!(json.get("lastUpdated").is_some());
    }

    #[test]
    fn test_activity_count_sentinel() {
        assert_eq!(
            serde_json::to_string(&ActivityCount::NotAvailable).unwrap(),
            "\"N/A\""
        );
        assert_eq!(serde_json::to_string(&ActivityCount::Count(7)).unwrap(), "7");
        assert_eq!(
            serde_json::from_str::<ActivityCount>("\"N/A\"").unwrap(),
            ActivityCount::NotAvailable
        );
        assert!(serde_json::from_str::<ActivityCount>("\"lots\"").is_err());
    }

    #[test]
    fn test_scan_outcome_is_tagged() {
        let outcome: ScanOutcome<SeverityTally> = ScanOutcome::skipped("no package.json");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "no package.json");

        let ok = ScanOutcome::Ok(SeverityTally {
            critical: 1,
            total: 1,
            ..Default::default()
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["critical"], 1);
    }

    #[test]
    fn test_lint_run_failing() {
        let passing = LintRun {
            tool: "eslint".to_string(),
            outcome: ScanOutcome::Ok(LintSummary {
                files_checked: 3,
                files_passed: 3,
                ..Default::default()
            }),
        };
        assert!(!passing.is_failing());

        let errors = LintRun {
            tool: "eslint".to_string(),
            outcome: ScanOutcome::Ok(LintSummary {
                files_checked: 3,
                files_passed: 2,
                files_failed: 1,
                error_count: 4,
                warning_count: 0,
            }),
        };
        assert!(errors.is_failing());

        let skipped = LintRun {
            tool: "eslint".to_string(),
            outcome: ScanOutcome::skipped("not installed"),
        };
        assert!(!skipped.is_failing());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::Moderate < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::Critical.emoji(), "🔴");
    }
}
