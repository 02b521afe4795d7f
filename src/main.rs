//! Repo Steward - scheduled housekeeping for a GitHub portfolio
//!
//! A CLI job, meant to be triggered by an external scheduler, that
//! rotates a daily fact, snapshots repository statistics, runs code
//! quality and security tools, and manages stale issues.
//!
//! Exit codes:
//!   0 - Run completed (sections may be degraded)
//!   1 - Invalid arguments or orchestration error
//!   2 - A section was degraded and --strict was given

mod cli;
mod config;
mod facts;
mod github;
mod lifecycle;
mod models;
mod report;
mod runner;
mod scanner;
mod stats;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use github::GitHubClient;
use models::{RunSummary, SectionStatus};
use runner::RunContext;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Repo Steward v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args.sections);

    match run_job(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .steward.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml()?;
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the account, scanners and lifecycle repositories.");
    Ok(())
}

/// Initialize logging. `RUST_LOG`, when set, overrides the verbosity flags.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(args.log_level().into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the selected sections. Returns the process exit code.
async fn run_job(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = GitHubClient::new(
        &args.api_url,
        args.token.as_deref(),
        Duration::from_secs(config.stats.request_timeout_seconds),
    )?;

    if args.token.is_none() {
        warn!("No token provided; lifecycle changes will be rejected by the API");
    }

    let repositories = config.lifecycle_repositories(std::env::var("GITHUB_REPOSITORY").ok());

    println!("🧹 Repo Steward");
    println!(
        "   Account: {}",
        config.general.account.as_deref().unwrap_or("(none)")
    );
    println!("   Output: {}", config.general.output_dir.display());
    if args.dry_run {
        println!("   Mode: dry run (no issue changes)");
    }
    println!();

    let ctx = RunContext {
        api: &client,
        config: &config,
        sections: &args.sections,
        repositories,
        dry_run: args.dry_run,
        show_progress: !args.quiet,
    };

    let summary = runner::run(&ctx, Utc::now()).await;
    print_summary(&summary);

    Ok(exit_code(&summary, args.strict))
}

fn exit_code(summary: &RunSummary, strict: bool) -> i32 {
    if !summary.success {
        1
    } else if strict && summary.has_degraded() {
        2
    } else {
        0
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 Run Summary:");
    for section in &summary.sections {
        let icon = match section.status {
            SectionStatus::Ok => "✅",
            SectionStatus::Degraded => "⚠️ ",
            SectionStatus::Skipped => "⏭️ ",
        };
        match section.detail {
            Some(ref detail) => println!("   {} {}: {}", icon, section.name, detail),
            None => println!("   {} {}", icon, section.name),
        }
    }

    let duration = summary.finished_at - summary.started_at;
    println!(
        "   Duration: {:.1}s",
        duration.num_milliseconds() as f64 / 1000.0
    );

    if summary.success {
        println!("\n✅ Run complete.");
    } else {
        eprintln!("\n❌ Run aborted before all sections finished.");
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
