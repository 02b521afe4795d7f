//! External quality and security tools.
//!
//! This module runs third-party linters and auditors as subprocesses
//! and normalizes their output. Every tool is isolated: a missing
//! binary, a timeout or unparsable output degrades that tool's entry
//! and nothing else.

pub mod audit;
pub mod quality;

use crate::config::{ScannersConfig, ToolSpec};
use crate::models::{CodeQuality, LintRun, OutdatedSummary, ScanOutcome, SeverityTally};
use anyhow::Result;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Captured output of one tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Exit code and first stderr line, for error messages.
    pub fn describe_failure(&self) -> String {
        let code = self
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        match self.stderr.lines().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("exit {}: {}", code, line.trim()),
            None => format!("exit {}", code),
        }
    }
}

/// Runs tools from one working directory with a shared timeout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    working_dir: PathBuf,
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(working_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            working_dir,
            timeout,
        }
    }

    pub fn from_config(config: &ScannersConfig) -> Self {
        Self::new(
            config.working_dir.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Run a tool and capture its output.
    ///
    /// Returns `Skipped` when a required file is missing or the
    /// executable is not installed, `Failed` on timeout or spawn error.
    /// A non-zero exit is not a failure here: many tools use it to
    /// report findings.
    pub async fn run(&self, spec: &ToolSpec) -> ScanOutcome<ToolOutput> {
        if let Some(missing) = spec
            .requires
            .iter()
            .find(|f| !self.working_dir.join(f).exists())
        {
            debug!("Skipping {}: {} not found", spec.name, missing);
            return ScanOutcome::skipped(format!("{} not found", missing));
        }

        debug!("Running {}: {} {:?}", spec.name, spec.command, spec.args);

        let child = Command::new(&spec.command)
            .args(&spec.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => ScanOutcome::Ok(ToolOutput {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                ScanOutcome::skipped(format!("{} is not installed", spec.command))
            }
            Ok(Err(e)) => ScanOutcome::failed(format!("failed to start {}: {}", spec.command, e)),
            Err(_) => ScanOutcome::failed(format!(
                "timed out after {}s",
                self.timeout.as_secs_f64()
            )),
        }
    }

    /// Run a tool and normalize its output with `parse`.
    pub async fn run_parsed<T>(
        &self,
        spec: &ToolSpec,
        parse: impl FnOnce(&ToolOutput) -> Result<T>,
    ) -> ScanOutcome<T> {
        let outcome = match self.run(spec).await {
            ScanOutcome::Ok(output) => match parse(&output) {
                Ok(value) => ScanOutcome::Ok(value),
                Err(e) => ScanOutcome::failed(format!("{} ({})", e, output.describe_failure())),
            },
            ScanOutcome::Skipped { reason } => ScanOutcome::Skipped { reason },
            ScanOutcome::Failed { error } => ScanOutcome::Failed { error },
        };

        match &outcome {
            ScanOutcome::Ok(_) => info!("{} finished", spec.name),
            ScanOutcome::Skipped { reason } => info!("{} skipped: {}", spec.name, reason),
            ScanOutcome::Failed { error } => warn!("{} failed: {}", spec.name, error),
        }
        outcome
    }
}

/// Run every linter and the dependency-outdated check.
pub async fn run_quality(runner: &ToolRunner, config: &ScannersConfig) -> CodeQuality {
    let mut lint = Vec::with_capacity(config.lint.len());
    for spec in &config.lint {
        let outcome = runner.run_parsed(spec, quality::parse_lint).await;
        lint.push(LintRun {
            tool: spec.name.clone(),
            outcome,
        });
    }

    let outdated: ScanOutcome<OutdatedSummary> = runner
        .run_parsed(&config.outdated, quality::parse_outdated)
        .await;

    CodeQuality { lint, outdated }
}

/// Run the vulnerability audit.
pub async fn run_security(
    runner: &ToolRunner,
    config: &ScannersConfig,
) -> ScanOutcome<SeverityTally> {
    runner.run_parsed(&config.audit, audit::parse_audit).await
}
