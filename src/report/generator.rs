//! Dashboard report generation.
//!
//! This module renders the aggregated totals as a terminal summary,
//! a Markdown document or JSON.

use crate::models::{Report, ReportMetadata, Totals, YearTotals};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", report.metadata.title));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_totals_section(&report.totals));
    output.push_str(&generate_breakdown_section(&report.years));
    output.push_str(&generate_status_section(&report.failures));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Directory:** `{}`\n", metadata.data_dir));
    section.push_str(&format!(
        "- **Years:** {}\n",
        metadata.years_requested.join(", ")
    ));
    section.push_str(&format!("- **Years Loaded:** {}\n", metadata.years_loaded));
    if metadata.years_failed > 0 {
        section.push_str(&format!("- **Years Failed:** {}\n", metadata.years_failed));
    }
    section.push('\n');

    section
}

/// Generate the "Total Impact" section.
fn generate_totals_section(totals: &Totals) -> String {
    let mut section = String::new();

    section.push_str("## Total Impact\n\n");
    section.push_str("| Metric | Total |\n");
    section.push_str("|:---|:---:|\n");
    for (label, value) in totals.labeled() {
        section.push_str(&format!("| {} | {} |\n", label, value));
    }
    section.push('\n');

    section
}

/// Generate the per-year breakdown table.
fn generate_breakdown_section(years: &[YearTotals]) -> String {
    if years.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## By Year\n\n");
    section.push_str(
        "| Year | Courses | Participants | Research Papers | Workshops & Events | University Groups | Individual Career Changes |\n",
    );
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for year in years {
        let t = &year.totals;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            year.year_id,
            t.total_courses,
            t.total_participants,
            t.total_research_papers,
            t.total_workshops_events,
            t.total_university_groups,
            t.total_individual_impacts
        ));
    }
    section.push('\n');

    section
}

/// List the years that could not be loaded.
fn generate_status_section(failures: &[YearTotals]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Data Issues\n\n");
    section.push_str("These years contributed nothing to the totals:\n\n");
    for year in failures {
        section.push_str(&format!(
            "- {} **{}**: {}\n",
            year.status.emoji(),
            year.year_id,
            year.status
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by trackrecord*\n");

    footer
}

/// Generate the compact terminal summary.
pub fn generate_text_summary(report: &Report) -> String {
    let mut lines = Vec::new();

    lines.push(format!("📊 {} - Total Impact", report.metadata.title));
    for (label, value) in report.totals.labeled() {
        lines.push(format!("   {:<26} {:>6}", label, value));
    }

    if !report.years.is_empty() {
        lines.push(String::new());
        lines.push("📅 By Year".to_string());
        for year in &report.years {
            lines.push(format!(
                "   {} {}  courses {} | participants {} | events {}",
                year.status.emoji(),
                year.year_id,
                year.totals.total_courses,
                year.totals.total_participants,
                year.totals.total_workshops_events
            ));
        }
    }

    lines.join("\n") + "\n"
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
