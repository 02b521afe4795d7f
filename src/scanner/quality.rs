//! Linter and dependency-outdated output normalization.

use super::ToolOutput;
use crate::models::{LintSummary, OutdatedPackage, OutdatedSummary};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One file entry of eslint's JSON formatter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintFile {
    #[serde(default)]
    error_count: usize,
    #[serde(default)]
    warning_count: usize,
}

#[derive(Debug, Deserialize)]
struct NpmOutdatedEntry {
    current: Option<String>,
    wanted: Option<String>,
    latest: Option<String>,
}

/// Normalize linter output.
///
/// Understands eslint's JSON array. A linter that prints nothing and
/// exits cleanly counts as a pass with no files reported.
pub fn parse_lint(output: &ToolOutput) -> Result<LintSummary> {
    let stdout = output.stdout.trim();

    if stdout.is_empty() {
        if output.status.success() {
            return Ok(LintSummary::default());
        }
        bail!("linter produced no output");
    }

    let files: Vec<EslintFile> =
        serde_json::from_str(stdout).context("unrecognized linter output")?;

    let files_failed = files.iter().filter(|f| f.error_count > 0).count();
    Ok(LintSummary {
        files_checked: files.len(),
        files_passed: files.len() - files_failed,
        files_failed,
        error_count: files.iter().map(|f| f.error_count).sum(),
        warning_count: files.iter().map(|f| f.warning_count).sum(),
    })
}

/// Normalize `npm outdated --json` output.
///
/// npm prints nothing (or `{}`) when every dependency is current.
pub fn parse_outdated(output: &ToolOutput) -> Result<OutdatedSummary> {
    let stdout = output.stdout.trim();
    if stdout.is_empty() {
        return Ok(OutdatedSummary::default());
    }

    let entries: BTreeMap<String, NpmOutdatedEntry> =
        serde_json::from_str(stdout).context("unrecognized outdated output")?;

    let packages: Vec<OutdatedPackage> = entries
        .into_iter()
        .map(|(name, entry)| OutdatedPackage {
            name,
            current: entry.current,
            wanted: entry.wanted,
            latest: entry.latest,
        })
        .collect();

    Ok(OutdatedSummary {
        count: packages.len(),
        packages,
    })
}
