//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// Repo Steward - scheduled housekeeping for a GitHub portfolio
///
/// Rotates the daily fact, snapshots repository statistics, runs
/// linters and dependency audits, closes stale issues and labels new
/// ones. Every section writes its own JSON file.
///
/// Examples:
///   repo-steward --account octocat
///   repo-steward --account octocat --sections facts,stats
///   repo-steward --account octocat --repo octocat/site --dry-run
///   repo-steward --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Account whose repositories are collected
    ///
    /// Can also be set via GITHUB_ACCOUNT or .steward.toml.
    #[arg(short, long, value_name = "LOGIN", env = "GITHUB_ACCOUNT")]
    pub account: Option<String>,

    /// API token used for authenticated requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, default_value = "https://api.github.com", env = "GITHUB_API_URL")]
    pub api_url: String,

    /// Directory receiving the output files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .steward.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sections to run (comma-separated)
    ///
    /// Example: --sections facts,stats,health
    #[arg(
        long,
        value_name = "SECTIONS",
        value_delimiter = ',',
        default_value = "facts,stats,quality,security,lifecycle,health"
    )]
    pub sections: Vec<Section>,

    /// Repository (owner/name) for the lifecycle section; repeatable
    #[arg(short, long, value_name = "OWNER/NAME")]
    pub repo: Vec<String>,

    /// Maximum concurrent commit-activity requests
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Report what the lifecycle section would do without changing issues
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with code 2 when any section is degraded
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .steward.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// One independently isolated part of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Section {
    /// Rotate the category and publish the daily fact
    Facts,
    /// Snapshot repository statistics
    Stats,
    /// Run linters and the dependency-outdated check
    Quality,
    /// Run the vulnerability audit
    Security,
    /// Close stale issues and auto-label open ones
    Lifecycle,
    /// Compose the health report
    Health,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Facts => "facts",
            Section::Stats => "stats",
            Section::Quality => "quality",
            Section::Security => "security",
            Section::Lifecycle => "lifecycle",
            Section::Health => "health",
        };
        write!(f, "{}", name)
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("API URL must start with 'http://' or 'https://'".to_string());
        }

        if let Some(ref account) = self.account {
            if account.trim().is_empty() || account.contains('/') {
                return Err(format!("Invalid account name: '{}'", account));
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        for repo in &self.repo {
            if parse_repo_slug(repo).is_none() {
                return Err(format!(
                    "Repository must be given as 'owner/name', got '{}'",
                    repo
                ));
            }
        }

        if self.sections.is_empty() {
            return Err("At least one section must be selected".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Split an `owner/name` slug.
pub fn parse_repo_slug(slug: &str) -> Option<(&str, &str)> {
    let (owner, name) = slug.trim().split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}
