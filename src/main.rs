//! TrackRecord - yearly impact dashboard totals
//!
//! A CLI tool that reads per-year JSON records (courses, events,
//! research, university groups, individual impact stories) and renders
//! the dashboard's "Total Impact" counters.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, output file, etc.)
//!   2 - A requested year failed to load and --strict was set

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod report;

use analysis::Aggregator;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use loader::{JsonDirLoader, YearSource};
use models::{Report, ReportMetadata, Totals, YearStatus, YearTotals};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
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
    init_logging(&args);

    info!("TrackRecord v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .trackrecord.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to customize the data directory, years and event shapes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the report. `RUST_LOG`
/// overrides the level chosen by the flags.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Load the data, render the report and return the exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let year_ids = resolve_years(args.years.as_deref(), args.discover, &config);
    let loader = JsonDirLoader::new(&config.general.data_dir);
    info!(
        "Using {} year(s) from {}",
        year_ids.len(),
        loader.data_dir().display()
    );

    let aggregator = Aggregator::new(loader, config.shape_table());

    if args.check {
        return Ok(handle_check(&aggregator, &year_ids, args.strict));
    }

    let report = build_report(&aggregator, &year_ids, &config);

    let output = match args.format {
        OutputFormat::Text => report::generate_text_summary(&report),
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    let years_failed = report.metadata.years_failed;
    if years_failed > 0 {
        warn!("{} of {} year(s) contributed nothing", years_failed, year_ids.len());
    }

    let code = exit_code(years_failed, args.strict);
    if code == 2 {
        eprintln!("\n⛔ {} year(s) failed to load. Failing (exit code 2).", years_failed);
    }

    Ok(code)
}

/// Aggregate the requested years into a report.
///
/// Failed years are always listed in `failures`; the full breakdown is
/// only kept when the report asks for it.
fn build_report<S: YearSource>(
    aggregator: &Aggregator<S>,
    year_ids: &[String],
    config: &Config,
) -> Report {
    let years = aggregator.aggregate_by_year(year_ids);
    let totals: Totals = years.iter().map(|year| year.totals).sum();
    let failures: Vec<YearTotals> = years
        .iter()
        .filter(|y| !y.status.is_loaded())
        .cloned()
        .collect();

    Report {
        metadata: ReportMetadata {
            title: config.report.title.clone(),
            generated_at: Utc::now(),
            data_dir: config.general.data_dir.clone(),
            years_requested: year_ids.to_vec(),
            years_loaded: years.len() - failures.len(),
            years_failed: failures.len(),
        },
        totals,
        years: if config.report.by_year {
            years
        } else {
            Vec::new()
        },
        failures,
    }
}

/// Exit code for a finished run: 2 only when strict and something failed.
fn exit_code(years_failed: usize, strict: bool) -> i32 {
    if strict && years_failed > 0 {
        2
    } else {
        0
    }
}

/// Decide which year identifiers to aggregate.
///
/// `--years` wins over `--discover`, which wins over the config file.
/// Repeated ids are dropped so no year is counted twice.
fn resolve_years(requested: Option<&[String]>, discover: bool, config: &Config) -> Vec<String> {
    let years = if let Some(years) = requested {
        years.iter().map(|y| y.trim().to_string()).collect()
    } else if discover {
        let data_dir = Path::new(&config.general.data_dir);
        let discovered = loader::discover_years(data_dir);
        if discovered.is_empty() {
            warn!("No year files found in {}", data_dir.display());
        }
        discovered
    } else {
        config.year_ids()
    };

    let mut seen = HashSet::new();
    years
        .into_iter()
        .filter(|year| {
            let first = seen.insert(year.clone());
            if !first {
                warn!("Year {} requested more than once, counting it once", year);
            }
            first
        })
        .collect()
}

/// Handle --check: load every year, print its status, aggregate nothing.
fn handle_check<S: YearSource>(
    aggregator: &Aggregator<S>,
    year_ids: &[String],
    strict: bool,
) -> i32 {
    println!("🔍 Checking {} year(s)...\n", year_ids.len());

    let statuses = aggregator.check(year_ids);
    for (year_id, status) in &statuses {
        println!("   {} {} - {}", status.emoji(), year_id, status);
    }

    let failed = statuses
        .iter()
        .filter(|(_, status)| *status != YearStatus::Loaded)
        .count();

    if failed == 0 {
        println!("\n✅ All years loaded.");
    } else {
        println!("\n⚠️  {} year(s) will count as zero.", failed);
    }

    exit_code(failed, strict)
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
            info!("Loaded default config from {}", config::CONFIG_FILE);
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(years: &[&str]) -> Vec<String> {
        years.iter().map(|y| y.to_string()).collect()
    }

    /// A data dir holding only 2025; 2024 is missing.
    fn setup_partial_data() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("2025.json"),
            r#"{"courses": [{"title": "Intro", "completion": {"total_completed": 40}}], "research": [{}]}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.general.data_dir = dir.path().display().to_string();
        (dir, config)
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(0, false), 0);
        assert_eq!(exit_code(0, true), 0);
        assert_eq!(exit_code(1, false), 0);
        assert_eq!(exit_code(1, true), 2);
    }

    #[test]
    fn test_missing_year_exit_codes() {
        let (_dir, config) = setup_partial_data();
        let aggregator = Aggregator::new(
            JsonDirLoader::new(&config.general.data_dir),
            config.shape_table(),
        );
        let year_ids = ids(&["2025", "2024"]);

        let report = build_report(&aggregator, &year_ids, &config);
        assert_eq!(report.metadata.years_loaded, 1);
        assert_eq!(report.metadata.years_failed, 1);
        assert_eq!(report.totals.total_courses, 1);
        assert_eq!(report.totals.total_research_papers, 1);
        assert_eq!(exit_code(report.metadata.years_failed, true), 2);
        assert_eq!(exit_code(report.metadata.years_failed, false), 0);

        assert_eq!(handle_check(&aggregator, &year_ids, true), 2);
        assert_eq!(handle_check(&aggregator, &year_ids, false), 0);
        assert_eq!(handle_check(&aggregator, &ids(&["2025"]), true), 0);
    }

    #[test]
    fn test_failures_kept_without_breakdown() {
        let (_dir, mut config) = setup_partial_data();
        config.report.by_year = false;
        let aggregator = Aggregator::new(
            JsonDirLoader::new(&config.general.data_dir),
            config.shape_table(),
        );

        let report = build_report(&aggregator, &ids(&["2025", "2024"]), &config);
        assert!(report.years.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].year_id, "2024");
        assert_eq!(report.failures[0].status, YearStatus::NotFound);

        let markdown = report::generate_markdown_report(&report);
        assert!(markdown.contains("## Data Issues"));
        assert!(markdown.contains("**2024**"));
    }

    #[test]
    fn test_resolve_years_from_flag() {
        let config = Config::default();
        let requested = ids(&[" 2024", "2023 ", "2024"]);

        let years = resolve_years(Some(requested.as_slice()), false, &config);
        assert_eq!(years, vec!["2024", "2023"]);
    }

    #[test]
    fn test_duplicate_years_counted_once() {
        let (_dir, config) = setup_partial_data();
        let aggregator = Aggregator::new(
            JsonDirLoader::new(&config.general.data_dir),
            config.shape_table(),
        );
        let requested = ids(&["2025", "2025"]);

        let year_ids = resolve_years(Some(requested.as_slice()), false, &config);
        let report = build_report(&aggregator, &year_ids, &config);
        assert_eq!(report.metadata.years_requested, vec!["2025"]);
        assert_eq!(report.totals.total_courses, 1);
        assert_eq!(report.totals.total_participants, 40);
    }

    #[test]
    fn test_resolve_years_discover() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("2023.json"), "{}").unwrap();
        std::fs::write(dir.path().join("2025.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut config = Config::default();
        config.general.data_dir = dir.path().display().to_string();

        let years = resolve_years(None, true, &config);
        assert_eq!(years, vec!["2025", "2023"]);
    }

    #[test]
    fn test_resolve_years_config_fallback() {
        let config = Config::default();
        assert_eq!(
            resolve_years(None, false, &config),
            vec!["2025", "2024", "2023"]
        );

        // --years takes precedence even when --discover is also passed
        let requested = ids(&["2022"]);
        assert_eq!(resolve_years(Some(requested.as_slice()), true, &config), vec!["2022"]);
    }
}
