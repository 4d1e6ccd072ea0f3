//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// TrackRecord - yearly impact dashboard totals from JSON data files
///
/// Reads one `{year}.json` document per year, folds them into the six
/// "Total Impact" counters and prints or writes the dashboard summary.
/// Missing or broken year files count as zero and never stop the report.
///
/// Examples:
///   trackrecord
///   trackrecord --data-dir ./data --years 2025,2024
///   trackrecord --discover --format markdown --output track_record.md
///   trackrecord --check --strict
///   trackrecord --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the `{year}.json` data files
    ///
    /// Overrides `general.data_dir` from the config file (default: data).
    #[arg(short, long, value_name = "DIR", env = "TRACKRECORD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Year identifiers to aggregate (comma-separated)
    ///
    /// Example: --years 2025,2024,2023. Defaults to the years in the config file.
    #[arg(short, long, value_name = "IDS", value_delimiter = ',')]
    pub years: Option<Vec<String>>,

    /// Use every `*.json` file in the data directory as a year
    #[arg(long, conflicts_with = "years")]
    pub discover: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .trackrecord.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (text, markdown, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Leave the per-year breakdown out of the report
    #[arg(long)]
    pub no_by_year: bool,

    /// Only load each year and report whether it is usable
    #[arg(long)]
    pub check: bool,

    /// Exit with code 2 if any requested year fails to load
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .trackrecord.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact terminal summary (default)
    #[default]
    Text,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
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

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.discover && self.years.is_some() {
            return Err("Cannot use both --years and --discover".to_string());
        }

        if let Some(ref years) = self.years {
            if years.is_empty() || years.iter().any(|y| y.trim().is_empty()) {
                return Err("Year identifiers must not be empty".to_string());
            }
        }

        // A missing data directory is fine (all years count as zero),
        // but a file in its place is a mistake.
        if let Some(ref data_dir) = self.data_dir {
            if data_dir.exists() && !data_dir.is_dir() {
                return Err(format!(
                    "Data path is not a directory: {}",
                    data_dir.display()
                ));
            }
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
