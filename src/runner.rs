//! Section orchestration.
//!
//! Sections run one after another in a fixed order. Each one catches
//! its own failures and reports them as a degraded [`SectionReport`];
//! only an error in the orchestration itself ends the run early.

use crate::cli::Section;
use crate::config::Config;
use crate::facts::{self, FileRotationStore};
use crate::github::HostingApi;
use crate::lifecycle;
use crate::models::{
    CodeQuality, HealthReport, RepoStatsSummary, RunSummary, ScanOutcome, SectionReport,
    SectionStatus, SeverityTally,
};
use crate::report::{self, write_json_atomic, write_text_atomic};
use crate::scanner::{self, ToolRunner};
use crate::stats::{self, CollectOptions};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

pub const ROTATION_STATE_FILE: &str = "rotation-state.json";
pub const DAILY_FACT_FILE: &str = "daily-fact.json";
pub const REPO_STATS_FILE: &str = "repo-stats.json";
pub const HEALTH_REPORT_FILE: &str = "health-report.json";
pub const HEALTH_DIGEST_FILE: &str = "health-report.md";
pub const LIFECYCLE_FILE: &str = "lifecycle.json";

/// Fixed execution order.
pub const SECTION_ORDER: [Section; 6] = [
    Section::Facts,
    Section::Stats,
    Section::Quality,
    Section::Security,
    Section::Lifecycle,
    Section::Health,
];

const NOT_SELECTED: &str = "section not selected";

/// Inputs for one run.
pub struct RunContext<'a> {
    pub api: &'a dyn HostingApi,
    pub config: &'a Config,
    pub sections: &'a [Section],
    /// `owner/name` slugs for the lifecycle section.
    pub repositories: Vec<String>,
    pub dry_run: bool,
    pub show_progress: bool,
}

impl RunContext<'_> {
    fn output_dir(&self) -> &Path {
        &self.config.general.output_dir
    }

    fn output_path(&self, file: &str) -> PathBuf {
        self.output_dir().join(file)
    }

    fn selected(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }
}

/// Results carried from earlier sections into the health report.
#[derive(Default)]
struct Carry {
    stats: Option<RepoStatsSummary>,
    quality: Option<CodeQuality>,
    security: Option<ScanOutcome<SeverityTally>>,
}

/// Run every selected section and summarize the outcome.
pub async fn run(ctx: &RunContext<'_>, now: DateTime<Utc>) -> RunSummary {
    let started_at = Utc::now();
    let mut sections = Vec::with_capacity(SECTION_ORDER.len());

    let success = match run_sections(ctx, now, &mut sections).await {
        Ok(()) => true,
        Err(e) => {
            error!("Run aborted: {:#}", e);
            false
        }
    };

    RunSummary {
        started_at,
        finished_at: Utc::now(),
        success,
        sections,
    }
}

async fn run_sections(
    ctx: &RunContext<'_>,
    now: DateTime<Utc>,
    reports: &mut Vec<SectionReport>,
) -> Result<()> {
    std::fs::create_dir_all(ctx.output_dir()).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            ctx.output_dir().display()
        )
    })?;

    let mut carry = Carry::default();

    for section in SECTION_ORDER {
        let name = section.to_string();
        if !ctx.selected(section) {
            reports.push(SectionReport::skipped(&name));
            continue;
        }

        info!("Running section: {}", name);
        let report = match section {
            Section::Facts => run_facts(ctx, now),
            Section::Stats => run_stats(ctx, now, &mut carry).await,
            Section::Quality => run_quality(ctx, &mut carry).await,
            Section::Security => run_security(ctx, &mut carry).await,
            Section::Lifecycle => run_lifecycle(ctx, now).await,
            Section::Health => run_health(ctx, now, &mut carry),
        };

        if report.status == SectionStatus::Degraded {
            warn!(
                "Section {} degraded: {}",
                name,
                report.detail.as_deref().unwrap_or("")
            );
        }
        reports.push(report);
    }

    Ok(())
}

fn run_facts(ctx: &RunContext<'_>, now: DateTime<Utc>) -> SectionReport {
    let store = FileRotationStore::new(ctx.output_path(ROTATION_STATE_FILE));
    let mut rng = rand::thread_rng();

    match facts::publish(&store, &mut rng, &ctx.output_path(DAILY_FACT_FILE), now) {
        Ok(publication) => SectionReport::ok(
            "facts",
            format!("{} {}", publication.category.emoji(), publication.category),
        ),
        Err(e) => SectionReport::degraded("facts", format!("{:#}", e)),
    }
}

async fn run_stats(ctx: &RunContext<'_>, now: DateTime<Utc>, carry: &mut Carry) -> SectionReport {
    let path = ctx.output_path(REPO_STATS_FILE);

    let result = match ctx.config.general.account.as_deref() {
        Some(account) => collect_stats(ctx, account, now).await,
        None => Err(anyhow::anyhow!("no account configured")),
    };

    match result {
        Ok(summary) => {
            if let Err(e) = write_json_atomic(&path, &summary) {
                return SectionReport::degraded("stats", format!("{:#}", e));
            }
            let mut detail = format!(
                "{} repositories, {} stars",
                summary.total_repos, summary.total_stars
            );
            if summary.activity_unavailable > 0 {
                detail.push_str(&format!(
                    ", {} without activity",
                    summary.activity_unavailable
                ));
            }
            carry.stats = Some(summary);
            SectionReport::ok("stats", detail)
        }
        Err(e) => {
            let message = format!("{:#}", e);
            let record = json!({ "timestamp": now, "error": message });
            if let Err(write_err) = write_json_atomic(&path, &record) {
                warn!("Failed to record stats error: {:#}", write_err);
            }
            SectionReport::degraded("stats", message)
        }
    }
}

async fn collect_stats(
    ctx: &RunContext<'_>,
    account: &str,
    now: DateTime<Utc>,
) -> Result<RepoStatsSummary> {
    let settings = &ctx.config.stats;
    let options = CollectOptions {
        concurrency: settings.concurrency,
        request_timeout: Duration::from_secs(settings.request_timeout_seconds),
        recent_weeks: settings.recent_weeks,
        show_progress: ctx.show_progress,
        ..Default::default()
    };

    let collection = stats::collect(ctx.api, account, &options)
        .await
        .with_context(|| format!("Failed to list repositories for {}", account))?;

    Ok(stats::summarize(collection, settings.top_active, now))
}

async fn run_quality(ctx: &RunContext<'_>, carry: &mut Carry) -> SectionReport {
    let runner = ToolRunner::from_config(&ctx.config.scanners);
    let quality = scanner::run_quality(&runner, &ctx.config.scanners).await;

    let failed: Vec<&str> = quality
        .lint
        .iter()
        .filter(|run| run.outcome.is_failed())
        .map(|run| run.tool.as_str())
        .chain(quality.outdated.is_failed().then_some("outdated"))
        .collect();

    let report = if failed.is_empty() {
        SectionReport::ok("quality", format!("{} linters", quality.lint.len()))
    } else {
        SectionReport::degraded("quality", format!("failed: {}", failed.join(", ")))
    };

    carry.quality = Some(quality);
    report
}

async fn run_security(ctx: &RunContext<'_>, carry: &mut Carry) -> SectionReport {
    let runner = ToolRunner::from_config(&ctx.config.scanners);
    let security = scanner::run_security(&runner, &ctx.config.scanners).await;

    let report = match &security {
        ScanOutcome::Ok(tally) => SectionReport::ok(
            "security",
            format!("{} vulnerabilities", tally.total),
        ),
        ScanOutcome::Skipped { reason } => SectionReport {
            detail: Some(reason.clone()),
            ..SectionReport::skipped("security")
        },
        ScanOutcome::Failed { error } => SectionReport::degraded("security", error.clone()),
    };

    carry.security = Some(security);
    report
}

async fn run_lifecycle(ctx: &RunContext<'_>, now: DateTime<Utc>) -> SectionReport {
    if ctx.repositories.is_empty() {
        return SectionReport {
            detail: Some("no repositories configured".to_string()),
            ..SectionReport::skipped("lifecycle")
        };
    }

    let report = lifecycle::run(
        ctx.api,
        &ctx.repositories,
        &ctx.config.lifecycle,
        ctx.dry_run,
        now,
    )
    .await;

    if let Err(e) = write_json_atomic(&ctx.output_path(LIFECYCLE_FILE), &report) {
        return SectionReport::degraded("lifecycle", format!("{:#}", e));
    }

    let closed: usize = report
        .repositories
        .iter()
        .filter_map(|r| r.stale.as_ref())
        .map(|s| s.closed_count)
        .sum();
    let labeled: usize = report
        .repositories
        .iter()
        .filter_map(|r| r.labels.as_ref())
        .map(|l| l.labeled)
        .sum();
    let detail = format!(
        "{}closed {}, labelled {}",
        if report.dry_run { "[dry-run] " } else { "" },
        closed,
        labeled
    );

    if report.has_failures() {
        SectionReport::degraded("lifecycle", detail)
    } else {
        SectionReport::ok("lifecycle", detail)
    }
}

fn run_health(ctx: &RunContext<'_>, now: DateTime<Utc>, carry: &mut Carry) -> SectionReport {
    let quality = carry
        .quality
        .take()
        .unwrap_or_else(|| CodeQuality::not_run(NOT_SELECTED));
    let security = carry
        .security
        .take()
        .unwrap_or_else(|| ScanOutcome::skipped(NOT_SELECTED));

    let health = report::compose(
        quality,
        security,
        carry.stats.as_ref(),
        &ctx.config.health,
        now,
    );

    match write_health(ctx, &health, carry.stats.as_ref()) {
        Ok(()) => SectionReport::ok(
            "health",
            format!("{} recommendations", health.recommendations.len()),
        ),
        Err(e) => SectionReport::degraded("health", format!("{:#}", e)),
    }
}

fn write_health(
    ctx: &RunContext<'_>,
    health: &HealthReport,
    stats: Option<&RepoStatsSummary>,
) -> Result<()> {
    write_json_atomic(&ctx.output_path(HEALTH_REPORT_FILE), health)?;
    let digest = report::generate_markdown_report(health, stats);
    write_text_atomic(&ctx.output_path(HEALTH_DIGEST_FILE), &digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSpec;
    use crate::github::fake::{issue, repo, weeks, FakeHosting};
    use crate::models::{DailyFactPublication, RotationState};
    use tempfile::TempDir;

    fn shell(name: &str, script: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            requires: Vec::new(),
        }
    }

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.general.account = Some("octocat".to_string());
        config.general.output_dir = dir.path().join("data");
        config.scanners.working_dir = dir.path().to_path_buf();
        config.scanners.lint = vec![shell("eslint", "echo '[]'")];
        config.scanners.outdated = shell("outdated", "echo '{}'");
        config.scanners.audit = shell(
            "audit",
            r#"echo '{"metadata":{"vulnerabilities":{"low":0,"moderate":0,"high":0,"critical":1,"total":1}}}'"#,
        );
        config
    }

    fn hosting() -> FakeHosting {
        let mut api = FakeHosting {
            repositories: vec![
                repo("alpha", Some("Rust"), false),
                repo("beta", None, true),
            ],
            issues: vec![issue(9, "Crash on save", Utc::now() - chrono::Duration::days(90))],
            ..Default::default()
        };
        api.activity.insert("alpha".to_string(), weeks(&[1, 2, 3]));
        api.failing_activity.insert("beta".to_string());
        api
    }

    fn read_json(path: PathBuf) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_full_run_writes_every_file() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let api = hosting();
        let ctx = RunContext {
            api: &api,
            config: &config,
            sections: &SECTION_ORDER,
            repositories: vec!["octocat/alpha".to_string()],
            dry_run: false,
            show_progress: false,
        };

        let summary = run(&ctx, Utc::now()).await;

        assert!(summary.success);
        assert_eq!(summary.sections.len(), 6);
        assert!(
            summary
                .sections
                .iter()
                .all(|s| s.status == SectionStatus::Ok),
            "{:?}",
            summary.sections
        );

        let out = dir.path().join("data");
        for file in [
            ROTATION_STATE_FILE,
            DAILY_FACT_FILE,
            REPO_STATS_FILE,
            HEALTH_REPORT_FILE,
            HEALTH_DIGEST_FILE,
            LIFECYCLE_FILE,
        ] {
            assert!(out.join(file).exists(), "missing {}", file);
        }

        let stats = read_json(out.join(REPO_STATS_FILE));
        assert_eq!(stats["total_repos"], 2);
        assert_eq!(stats["active_repos"], 1);
        assert_eq!(stats["repositories"][1]["total_commits"], "N/A");
        assert_eq!(stats["activity_unavailable"], 1);
        assert_eq!(
            summary.sections[1].detail.as_deref(),
            Some("2 repositories, 4 stars, 1 without activity")
        );

        let health = read_json(out.join(HEALTH_REPORT_FILE));
        assert_eq!(health["portfolio_health"]["total_repos"], 2);
        assert!(health["recommendations"][0]
            .as_str()
            .unwrap()
            .contains("critical"));

        assert_eq!(*api.closed.lock().unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_rotation_advances_across_runs() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let api = FakeHosting::default();
        let ctx = RunContext {
            api: &api,
            config: &config,
            sections: &[Section::Facts],
            repositories: Vec::new(),
            dry_run: false,
            show_progress: false,
        };
        let out = dir.path().join("data");

        run(&ctx, Utc::now()).await;
        let first: RotationState =
            serde_json::from_value(read_json(out.join(ROTATION_STATE_FILE))).unwrap();
        run(&ctx, Utc::now()).await;
        let second: RotationState =
            serde_json::from_value(read_json(out.join(ROTATION_STATE_FILE))).unwrap();

        assert_eq!(first.current_index, 0);
        assert_eq!(second.current_index, 1);

        let fact: DailyFactPublication =
            serde_json::from_value(read_json(out.join(DAILY_FACT_FILE))).unwrap();
        assert_eq!(fact.category, second.current_category);
    }

    #[tokio::test]
    async fn test_failed_section_does_not_stop_later_ones() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.general.account = None;
        config.scanners.audit = shell("audit", "echo nonsense; exit 1");
        let api = FakeHosting::default();
        let ctx = RunContext {
            api: &api,
            config: &config,
            sections: &[Section::Stats, Section::Security, Section::Health],
            repositories: Vec::new(),
            dry_run: false,
            show_progress: false,
        };

        let summary = run(&ctx, Utc::now()).await;

        assert!(summary.success);
        assert!(summary.has_degraded());
        let status: Vec<SectionStatus> = summary.sections.iter().map(|s| s.status).collect();
        assert_eq!(
            status,
            vec![
                SectionStatus::Skipped,
                SectionStatus::Degraded,
                SectionStatus::Skipped,
                SectionStatus::Degraded,
                SectionStatus::Skipped,
                SectionStatus::Ok,
            ]
        );

        let out = dir.path().join("data");
        let stats = read_json(out.join(REPO_STATS_FILE));
        assert_eq!(stats["error"], "no account configured");

        let health = read_json(out.join(HEALTH_REPORT_FILE));
        assert_eq!(health["security"]["status"], "failed");
        assert_eq!(health["code_quality"]["outdated"]["status"], "skipped");
        assert!(health["portfolio_health"]["total_repos"].is_null());
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_fails_run() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut config = test_config(&dir);
        config.general.output_dir = blocker;
        let api = FakeHosting::default();
        let ctx = RunContext {
            api: &api,
            config: &config,
            sections: &SECTION_ORDER,
            repositories: Vec::new(),
            dry_run: false,
            show_progress: false,
        };

        let summary = run(&ctx, Utc::now()).await;
        assert!(!summary.success);
        assert!(summary.sections.is_empty());
    }
}
