//! Command-line argument parsing.
//!
//! Credential and connection flags fall back to the ODPS_* environment
//! variables, so the tool can run fully non-interactively.

use crate::config::{Config, Credentials, ExportConfig};
use crate::error::{ExportError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Export a bounded ODPS table scan to a multi-sheet Excel workbook.
#[derive(Parser, Debug)]
#[command(name = "odps-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Table to export (project.table or bare table)
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Maximum rows to export (presets: 10000, 50000, 100000, 200000)
    #[arg(short = 'n', long, value_name = "ROWS", default_value_t = 100_000)]
    pub max_rows: usize,

    /// Output file path (defaults to <table>.xlsx in the current directory)
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Access key id
    #[arg(long, value_name = "ID", env = "ODPS_ACCESS_ID", hide_env_values = true)]
    pub access_id: Option<String>,

    /// Access key secret
    #[arg(long, value_name = "SECRET", env = "ODPS_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Warehouse project
    #[arg(short = 'P', long, value_name = "PROJECT", env = "ODPS_PROJECT")]
    pub project: Option<String>,

    /// Warehouse endpoint URL
    #[arg(short = 'e', long, value_name = "URL", env = "ODPS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Override the hard row-limit ceiling
    #[arg(long, value_name = "ROWS")]
    pub row_limit_ceiling: Option<usize>,

    /// Override the rows-per-sheet chunk size
    #[arg(long, value_name = "ROWS")]
    pub chunk_size: Option<usize>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use an in-memory mock warehouse (no network, for testing)
    #[arg(long)]
    pub mock_db: bool,

    /// Number of rows the mock warehouse serves
    #[arg(long, value_name = "ROWS", default_value_t = 0)]
    pub mock_rows: usize,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Builds the effective export configuration.
    ///
    /// Precedence: CLI flags (including their env fallbacks), then the config
    /// file, then the ODPS_* environment, then built-in defaults.
    pub fn to_export_config(&self, file_config: &Config) -> ExportConfig {
        let mut config = file_config.export.clone();

        if self.project.is_some() {
            config.project = self.project.clone();
        }
        if self.endpoint.is_some() {
            config.endpoint = self.endpoint.clone();
        }
        if let Some(ceiling) = self.row_limit_ceiling {
            config.row_limit_ceiling = ceiling;
        }
        if let Some(chunk) = self.chunk_size {
            config.chunk_size = chunk;
        }

        config.apply_env_defaults();
        config
    }

    /// Builds the session credentials from flags or environment.
    ///
    /// Absence of either field is a configuration error; emptiness is caught
    /// later by the connection factory as `InvalidCredentials`.
    pub fn credentials(&self) -> Result<Credentials> {
        let access_id = self.access_id.clone().ok_or_else(|| {
            ExportError::config("access id not provided (use --access-id or ODPS_ACCESS_ID)")
        })?;
        let access_secret = self.access_key.clone().ok_or_else(|| {
            ExportError::config("access key not provided (use --access-key or ODPS_ACCESS_KEY)")
        })?;
        Ok(Credentials::new(access_id, access_secret))
    }

    /// Returns where to write the artifact, given its derived filename.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(filename))
    }
}
