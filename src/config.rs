//! Suite configuration: an optional TOML file under the CLI flags.
//!
//! Precedence per setting: CLI flag (or its env var) > file > default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{ContractError, Result};

pub const DEFAULT_FIXTURES_DIR: &str = "fixtures";
pub const DEFAULT_DB_SNAPSHOT: &str = "db.json";
pub const DEFAULT_LOGGING_LEVEL: &str = "info";

/// Contents of the `--config` TOML file. Every key is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub fixtures_dir: Option<PathBuf>,
    pub db_snapshot: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub report_path: Option<PathBuf>,
    pub logging_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ContractError::Config {
            message: format!("failed to read config file {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::parse(&content).map_err(|e| match e {
            ContractError::Config { message, source } => ContractError::Config {
                message: format!("{}: {message}", path.display()),
                source,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ContractError::Config {
            message: "failed to parse config file".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

/// Settings given on the command line; `None` means "not given".
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub fixtures_dir: Option<PathBuf>,
    pub db_snapshot: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub report_path: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    pub base_url: String,
    pub fixtures_dir: PathBuf,
    pub db_snapshot: PathBuf,
    pub request_timeout: Duration,
    pub report_path: Option<PathBuf>,
    pub logging_level: String,
}

impl SuiteConfig {
    pub fn resolve(cli: CliOverrides, file: FileConfig) -> Result<Self> {
        let timeout_secs = cli.request_timeout_secs.or(file.request_timeout_secs);
        if timeout_secs == Some(0) {
            return Err(ContractError::Config {
                message: "request timeout must be at least one second".to_string(),
                source: None,
            });
        }

        Ok(SuiteConfig {
            base_url: cli
                .base_url
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fixtures_dir: cli
                .fixtures_dir
                .or(file.fixtures_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURES_DIR)),
            db_snapshot: cli
                .db_snapshot
                .or(file.db_snapshot)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_SNAPSHOT)),
            request_timeout: timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            report_path: cli.report_path.or(file.report_path),
            logging_level: file
                .logging_level
                .unwrap_or_else(|| DEFAULT_LOGGING_LEVEL.to_string()),
        })
    }
}
