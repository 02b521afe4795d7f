//! Markdown health digest.
//!
//! Renders the health report (and, when available, the stats summary)
//! as a short Markdown page for humans browsing the output directory.

use crate::models::{
    CheckStatus, HealthReport, RepoStatsSummary, ScanOutcome, Severity, SeverityTally,
};

/// Generate the complete Markdown digest.
pub fn generate_markdown_report(report: &HealthReport, stats: Option<&RepoStatsSummary>) -> String {
    let mut output = String::new();

    output.push_str("# Portfolio Health\n\n");
    output.push_str(&format!(
        "*Generated {}*\n\n",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str(&generate_portfolio_section(report));
    output.push_str(&generate_quality_section(report));
    output.push_str(&generate_security_section(&report.security));

    if let Some(stats) = stats {
        output.push_str(&generate_activity_section(stats));
    }

    output.push_str(&generate_recommendations_section(&report.recommendations));
    output.push_str(&generate_footer());

    output
}

fn generate_portfolio_section(report: &HealthReport) -> String {
    let health = &report.portfolio_health;
    let mut section = String::new();

    section.push_str("## Portfolio\n\n");
    section.push_str(&format!("- **Score:** {}/100\n", health.score));

    match (health.total_repos, health.active_repos, health.archived_repos) {
        (Some(total), Some(active), Some(archived)) => {
            section.push_str(&format!("- **Repositories:** {}\n", total));
            section.push_str(&format!("- **Active:** {}\n", active));
            section.push_str(&format!("- **Archived:** {}\n", archived));
        }
        _ => section.push_str("- **Repositories:** not collected\n"),
    }
    if let Some(stars) = health.total_stars {
        section.push_str(&format!("- **Stars:** {}\n", stars));
    }
    section.push('\n');

    section
}

fn outcome_cell<T>(outcome: &ScanOutcome<T>, ok_text: impl FnOnce(&T) -> String) -> String {
    match outcome {
        ScanOutcome::Ok(value) => ok_text(value),
        ScanOutcome::Skipped { reason } => format!("⏭️ skipped ({})", reason),
        ScanOutcome::Failed { error } => format!("❌ error ({})", error),
    }
}

fn generate_quality_section(report: &HealthReport) -> String {
    let quality = &report.code_quality;
    let mut section = String::new();

    section.push_str("## Code Quality\n\n");
    section.push_str("| Check | Result |\n");
    section.push_str("|:---|:---|\n");

    for run in &quality.lint {
        let cell = outcome_cell(&run.outcome, |summary| match summary.status() {
            CheckStatus::Passed => format!(
                "✅ passed ({} files, {} warnings)",
                summary.files_checked, summary.warning_count
            ),
            CheckStatus::Failed => format!(
                "❌ failed ({} errors in {} files)",
                summary.error_count, summary.files_failed
            ),
        });
        section.push_str(&format!("| {} | {} |\n", run.tool, cell));
    }

    let outdated = outcome_cell(&quality.outdated, |summary| {
        format!("{} outdated packages", summary.count)
    });
    section.push_str(&format!("| Dependencies | {} |\n\n", outdated));

    section
}

fn generate_security_section(security: &ScanOutcome<SeverityTally>) -> String {
    let mut section = String::new();

    section.push_str("## Security\n\n");

    match security {
        ScanOutcome::Ok(tally) => {
            let levels = [
                Severity::Critical,
                Severity::High,
                Severity::Moderate,
                Severity::Low,
            ];
            let header: Vec<String> = levels
                .iter()
                .map(|s| format!("{} {}", s.emoji(), s))
                .collect();
            let counts: Vec<String> = levels
                .iter()
                .map(|s| tally.count(*s).to_string())
                .collect();

            section.push_str(&format!("| {} | **Total** |\n", header.join(" | ")));
            section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
            section.push_str(&format!(
                "| {} | **{}** |\n\n",
                counts.join(" | "),
                tally.total
            ));
        }
        other => {
            section.push_str(&outcome_cell(other, |_| String::new()));
            section.push_str("\n\n");
        }
    }

    section
}

fn generate_activity_section(stats: &RepoStatsSummary) -> String {
    let mut section = String::new();

    if !stats.most_active.is_empty() {
        section.push_str("## Most Active Repositories\n\n");
        section.push_str("| Repository | Recent commits | Commits (year) |\n");
        section.push_str("|:---|:---:|:---:|\n");
        for repo in &stats.most_active {
            section.push_str(&format!(
                "| [{}]({}) | {} | {} |\n",
                repo.name, repo.url, repo.recent_activity, repo.total_commits
            ));
        }
        section.push('\n');
    }

    if stats.activity_unavailable > 0 {
        section.push_str(&format!(
            "_Commit activity unavailable for {} repositories._\n\n",
            stats.activity_unavailable
        ));
    }

    if !stats.by_language.is_empty() {
        section.push_str("## Languages\n\n");
        section.push_str("| Language | Repositories |\n");
        section.push_str("|:---|:---:|\n");

        let mut langs: Vec<_> = stats.by_language.iter().collect();
        langs.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (lang, count) in langs {
            section.push_str(&format!("| {} | {} |\n", lang, count));
        }
        section.push('\n');
    }

    section
}

fn generate_recommendations_section(recommendations: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    if recommendations.is_empty() {
        section.push_str("Nothing to act on. 🎉\n\n");
        return section;
    }

    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Generated by repo-steward*\n".to_string()
}
