//! CLI entry point for posts-contract.
//!
//! Loads fixtures, runs every contract scenario against the configured
//! API, prints a per-scenario summary and optionally writes a JSON report.
//!
//! Exit codes:
//! - 0: every selected scenario passed and no hook failed
//! - 1: a scenario or hook failed, or a runtime error occurred
//! - 2: argument validation error (clap handles this automatically)

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use posts_contract::client::ApiClient;
use posts_contract::config::{CliOverrides, FileConfig, SuiteConfig};
use posts_contract::error::ContractError;
use posts_contract::fixtures::FixtureSet;
use posts_contract::runner::{Outcome, RunOptions, SuiteReport, run_suite};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the API under test.
    #[arg(long, env = "POSTS_API_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding user.json and defaultData.json.
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,

    /// Store snapshot used as the expected state (db.json).
    #[arg(long)]
    db_snapshot: Option<PathBuf>,

    /// Optional TOML config file. CLI flags take precedence over it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only run scenarios whose "<endpoint> <title>" contains this text.
    #[arg(long)]
    grep: Option<String>,

    /// Write the JSON report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Overall per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            base_url: self.base_url.clone(),
            fixtures_dir: self.fixtures_dir.clone(),
            db_snapshot: self.db_snapshot.clone(),
            request_timeout_secs: self.timeout_secs,
            report_path: self.report.clone(),
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<SuiteConfig, ContractError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    SuiteConfig::resolve(cli.overrides(), file)
}

/// `LOG_LEVEL` wins over the config file's `logging_level`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn print_report(report: &SuiteReport) {
    let mut current_group = "";
    for result in &report.results {
        if result.group != current_group {
            println!("\n  {}", result.group);
            current_group = result.group;
        }
        match &result.outcome {
            Outcome::Passed => println!("    ✓ {} ({} ms)", result.title, result.duration_ms),
            Outcome::Failed { message } => {
                println!("    ✗ {}", result.title);
                println!("      {message}");
            }
        }
    }

    for failure in &report.hook_failures {
        let scenario = failure.scenario.as_deref().unwrap_or("suite");
        println!("\n  {:?} hook failed for {scenario}: {}", failure.hook, failure.message);
    }

    println!(
        "\n  {} passing, {} failing, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped
    );
}

fn write_report(path: &Path, report: &SuiteReport) -> Result<(), ContractError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| ContractError::Report {
        path: path.to_path_buf(),
        source,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging_level);

    let fixtures = match FixtureSet::load(&config.fixtures_dir, &config.db_snapshot) {
        Ok(fixtures) => fixtures,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match ApiClient::with_timeout(&config.base_url, config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Running /posts contract suite against {}", config.base_url);
    let options = RunOptions { grep: cli.grep };
    let report = run_suite(&client, &fixtures, &options).await;
    print_report(&report);

    if let Some(path) = &config.report_path {
        if let Err(e) = write_report(path, &report) {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
