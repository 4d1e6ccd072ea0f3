//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.trackrecord.toml` files.

use crate::analysis::ShapeTable;
use crate::models::EventsShape;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".trackrecord.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Known years, newest first, with the shape of their events section.
    #[serde(default = "default_years")]
    pub years: Vec<YearConfig>,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            years: default_years(),
            report: ReportConfig::default(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding `{year}.json` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Events shape for years not listed under `[[years]]`.
    #[serde(default)]
    pub default_shape: EventsShape,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_shape: EventsShape::default(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

/// One known year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearConfig {
    /// Year identifier, also the data file stem.
    pub id: String,

    /// Shape of the year's `events` section.
    #[serde(default)]
    pub events: EventsShape,
}

fn default_years() -> Vec<YearConfig> {
    [
        ("2025", EventsShape::Structured),
        ("2024", EventsShape::Structured),
        ("2023", EventsShape::Flat),
    ]
    .into_iter()
    .map(|(id, events)| YearConfig {
        id: id.to_string(),
        events,
    })
    .collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Dashboard title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Include the per-year breakdown.
    #[serde(default = "default_true")]
    pub by_year: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            by_year: true,
        }
    }
}

fn default_title() -> String {
    "AISSA Track Record".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.display().to_string();
        }

        if args.no_by_year {
            self.report.by_year = false;
        }
    }

    /// Configured year identifiers, in configured order.
    pub fn year_ids(&self) -> Vec<String> {
        self.years.iter().map(|year| year.id.clone()).collect()
    }

    /// Per-year events shapes for the aggregator.
    pub fn shape_table(&self) -> ShapeTable {
        self.years
            .iter()
            .fold(ShapeTable::new(self.general.default_shape), |table, year| {
                table.with(year.id.clone(), year.events)
            })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
