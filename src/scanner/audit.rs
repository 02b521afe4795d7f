//! Vulnerability audit output normalization.

use super::ToolOutput;
use crate::models::SeverityTally;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AuditReport {
    metadata: Option<AuditMetadata>,
    error: Option<AuditError>,
}

#[derive(Debug, Deserialize)]
struct AuditMetadata {
    vulnerabilities: VulnerabilityCounts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VulnerabilityCounts {
    info: u64,
    low: u64,
    moderate: u64,
    high: u64,
    critical: u64,
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AuditError {
    code: Option<String>,
    summary: Option<String>,
}

/// Normalize `npm audit --json` output into a severity tally.
///
/// Reads `metadata.vulnerabilities`, which both the v1 and v2 report
/// formats carry. `info` findings only count towards the total.
pub fn parse_audit(output: &ToolOutput) -> Result<SeverityTally> {
    let report: AuditReport =
        serde_json::from_str(output.stdout.trim()).context("unrecognized audit output")?;

    if let Some(error) = report.error {
        bail!(
            "audit reported {}: {}",
            error.code.as_deref().unwrap_or("an error"),
            error.summary.as_deref().unwrap_or("no summary")
        );
    }

    let counts = report
        .metadata
        .map(|m| m.vulnerabilities)
        .context("audit output has no vulnerability metadata")?;

    let total = counts
        .total
        .unwrap_or(counts.info + counts.low + counts.moderate + counts.high + counts.critical);

    Ok(SeverityTally {
        critical: counts.critical,
        high: counts.high,
        moderate: counts.moderate,
        low: counts.low,
        total,
    })
}
