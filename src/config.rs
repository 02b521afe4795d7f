//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.steward.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".steward.toml";

/// Upper bound for `lifecycle.inactivity_days` (100 years).
const MAX_INACTIVITY_DAYS: i64 = 36_500;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Repository statistics settings.
    #[serde(default)]
    pub stats: StatsConfig,

    /// External scanner settings.
    #[serde(default)]
    pub scanners: ScannersConfig,

    /// Issue lifecycle settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Health report settings.
    #[serde(default)]
    pub health: HealthConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Account whose repositories are collected.
    #[serde(default)]
    pub account: Option<String>,

    /// Directory receiving all output files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            account: None,
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Repository statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Maximum in-flight commit-activity requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Timeout for a single commit-activity request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Length of the "most active" ranking.
    #[serde(default = "default_top_active")]
    pub top_active: usize,

    /// Number of trailing weeks summed into `recent_activity`.
    #[serde(default = "default_recent_weeks")]
    pub recent_weeks: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_seconds: default_request_timeout(),
            top_active: default_top_active(),
            recent_weeks: default_recent_weeks(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_request_timeout() -> u64 {
    30
}

fn default_top_active() -> usize {
    5
}

fn default_recent_weeks() -> usize {
    4
}

/// How to invoke one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Name used in reports and logs.
    pub name: String,

    /// Executable to run.
    pub command: String,

    /// Arguments passed to the executable.
    #[serde(default)]
    pub args: Vec<String>,

    /// Files that must exist in the working directory for the tool to apply.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl ToolSpec {
    fn npm(name: &str, command: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            requires: vec!["package.json".to_string()],
        }
    }
}

/// External scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannersConfig {
    /// Per-tool timeout. Exceeding it fails that tool only.
    #[serde(default = "default_scanner_timeout")]
    pub timeout_seconds: u64,

    /// Directory the tools run in.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Linters, run in order.
    #[serde(default = "default_lint_tools")]
    pub lint: Vec<ToolSpec>,

    /// Dependency freshness check.
    #[serde(default = "default_outdated_tool")]
    pub outdated: ToolSpec,

    /// Vulnerability audit.
    #[serde(default = "default_audit_tool")]
    pub audit: ToolSpec,
}

impl Default for ScannersConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_scanner_timeout(),
            working_dir: default_working_dir(),
            lint: default_lint_tools(),
            outdated: default_outdated_tool(),
            audit: default_audit_tool(),
        }
    }
}

fn default_scanner_timeout() -> u64 {
    60
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_lint_tools() -> Vec<ToolSpec> {
    vec![ToolSpec::npm(
        "eslint",
        "npx",
        &["--no-install", "eslint", ".", "--format", "json"],
    )]
}

fn default_outdated_tool() -> ToolSpec {
    ToolSpec::npm("npm-outdated", "npm", &["outdated", "--json"])
}

fn default_audit_tool() -> ToolSpec {
    ToolSpec::npm("npm-audit", "npm", &["audit", "--json"])
}

/// Issue lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Repositories (`owner/name`) to sweep. Empty falls back to
    /// the `GITHUB_REPOSITORY` environment variable.
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Days without updates before an issue is stale.
    #[serde(default = "default_inactivity_days")]
    pub inactivity_days: i64,

    /// Open issues fetched for the stale sweep.
    #[serde(default = "default_stale_fetch_limit")]
    pub stale_fetch_limit: u32,

    /// Open issues fetched for auto-labelling.
    #[serde(default = "default_label_fetch_limit")]
    pub label_fetch_limit: u32,

    /// Comment posted before a stale issue is closed. `{days}` is
    /// replaced with `inactivity_days`.
    #[serde(default = "default_stale_comment")]
    pub stale_comment: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            inactivity_days: default_inactivity_days(),
            stale_fetch_limit: default_stale_fetch_limit(),
            label_fetch_limit: default_label_fetch_limit(),
            stale_comment: default_stale_comment(),
        }
    }
}

fn default_inactivity_days() -> i64 {
    30
}

fn default_stale_fetch_limit() -> u32 {
    100
}

fn default_label_fetch_limit() -> u32 {
    50
}

fn default_stale_comment() -> String {
    "This issue has been automatically closed because it has not had any activity \
     in the last {days} days. Feel free to reopen it if it is still relevant."
        .to_string()
}

/// Health report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Archived-to-active ratio above which cleanup is recommended.
    #[serde(default = "default_archived_ratio")]
    pub archived_ratio_threshold: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            archived_ratio_threshold: default_archived_ratio(),
        }
    }
}

fn default_archived_ratio() -> f64 {
    5.0
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;

        Ok(config)
    }

    /// Reject settings the run cannot honour safely.
    pub fn validate(&self) -> Result<(), String> {
        if self.lifecycle.inactivity_days < 1 {
            return Err(format!(
                "lifecycle.inactivity_days must be at least 1, got {}",
                self.lifecycle.inactivity_days
            ));
        }

        if self.lifecycle.inactivity_days > MAX_INACTIVITY_DAYS {
            return Err(format!(
                "lifecycle.inactivity_days must be at most {}, got {}",
                MAX_INACTIVITY_DAYS, self.lifecycle.inactivity_days
            ));
        }

        if self.stats.concurrency == 0 {
            return Err("stats.concurrency must be at least 1".to_string());
        }

        if self.health.archived_ratio_threshold <= 0.0 {
            return Err("health.archived_ratio_threshold must be positive".to_string());
        }

        Ok(())
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually provided are applied.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref account) = args.account {
            self.general.account = Some(account.clone());
        }
        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.clone();
        }
        if let Some(concurrency) = args.concurrency {
            self.stats.concurrency = concurrency;
        }
        if !args.repo.is_empty() {
            self.lifecycle.repositories = args.repo.clone();
        }
    }

    /// Repositories for the lifecycle section, falling back to the
    /// given environment value (normally `GITHUB_REPOSITORY`).
    pub fn lifecycle_repositories(&self, env_fallback: Option<String>) -> Vec<String> {
        if !self.lifecycle.repositories.is_empty() {
            return self.lifecycle.repositories.clone();
        }
        env_fallback
            .filter(|r| !r.trim().is_empty())
            .map(|r| vec![r])
            .unwrap_or_default()
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to render default config")
    }
}
