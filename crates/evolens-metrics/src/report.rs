//! Rendering of an [`AnalysisReport`] as text, Markdown, or JSON.

use std::fmt::Write;

use evolens_core::{EvolensError, OutputFormat, ReportConfig};
use serde::Serialize;

use crate::pipeline::AnalysisReport;
use crate::reduce::{top_by_churn, top_by_ratio, FileReport};

const RULE_WIDTH: usize = 60;
const PATH_WIDTH: usize = 60;

/// How many files each ranking shows.
///
/// # Examples
///
/// ```
/// use evolens_metrics::report::ReportOptions;
///
/// let opts = ReportOptions::default();
/// assert_eq!((opts.top_ratio, opts.top_churn), (5, 10));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Files listed by refactoring ratio.
    pub top_ratio: usize,
    /// Files listed by total churn.
    pub top_churn: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

impl ReportOptions {
    /// Options from the `[report]` configuration.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            top_ratio: config.top_ratio,
            top_churn: config.top_churn,
        }
    }
}

/// JSON view: the full report plus the two rankings.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a AnalysisReport,
    top_by_ratio: Vec<&'a str>,
    top_by_churn: Vec<&'a str>,
}

/// Render `report` in the requested format.
///
/// # Errors
///
/// Returns [`EvolensError::Serialization`] if JSON serialization fails.
pub fn format_report(
    report: &AnalysisReport,
    format: OutputFormat,
    options: &ReportOptions,
) -> Result<String, EvolensError> {
    match format {
        OutputFormat::Text => Ok(format_text(report, options)),
        OutputFormat::Markdown => Ok(format_markdown(report, options)),
        OutputFormat::Json => format_json(report, options),
    }
}

/// Generate JSON output with camelCase keys.
///
/// # Errors
///
/// Returns [`EvolensError::Serialization`] if serialization fails.
pub fn format_json(report: &AnalysisReport, options: &ReportOptions) -> Result<String, EvolensError> {
    let output = JsonReport {
        report,
        top_by_ratio: paths(top_by_ratio(&report.files, options.top_ratio)),
        top_by_churn: paths(top_by_churn(&report.files, options.top_churn)),
    };
    serde_json::to_string_pretty(&output).map_err(EvolensError::from)
}

/// Generate the plain-text summary report.
pub fn format_text(report: &AnalysisReport, options: &ReportOptions) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    let overall = &report.overall;

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "EVOLENS ANALYSIS REPORT");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "--- Overall Metrics ---");
    let _ = writeln!(out, "Commits analyzed: {}", report.commits_analyzed);
    let _ = writeln!(
        out,
        "Files tracked: {} ({} absent, {} unreadable)",
        overall.files_tracked, overall.files_absent, overall.files_unreadable
    );
    let _ = writeln!(out, "Total SLoC (matching files): {}", overall.total_sloc);
    let _ = writeln!(out, "Total Creation Churn: {}", overall.total_creation_churn);
    let _ = writeln!(
        out,
        "Total Refactoring Churn (Lines Added + Deleted): {}",
        overall.total_refactoring_churn
    );
    let _ = writeln!(
        out,
        "Overall Refactoring Ratio (Churn / SLoC): {}",
        percent(overall.refactoring_ratio)
    );

    let _ = writeln!(out, "\n--- Commit Classification ---");
    for count in report.commit_counts.iter().filter(|c| c.commits > 0) {
        let _ = writeln!(
            out,
            "  - {:<10}: {} commits",
            capitalize(&count.category),
            count.commits
        );
    }

    let _ = writeln!(
        out,
        "\n--- Top {} Files by Refactoring Ratio (Churn/SLoC) ---",
        options.top_ratio
    );
    write_file_table(&mut out, &top_by_ratio(&report.files, options.top_ratio));

    let _ = writeln!(out, "\n--- Top {} Files by Churn ---", options.top_churn);
    write_file_table(&mut out, &top_by_churn(&report.files, options.top_churn));

    let _ = writeln!(out, "\n--- Change-Set Size (files per commit) ---");
    for (size, commits) in report.change_sets.iter() {
        let _ = writeln!(out, "  {size:>4} files: {commits} commits");
    }
    let _ = writeln!(out, "  mean: {:.2} files per commit", report.change_sets.mean());

    let _ = writeln!(out, "\n--- Cumulative Refactoring Churn ---");
    match (report.cumulative_churn.first(), report.cumulative_churn.last()) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                out,
                "  {} .. {}: {} lines over {} commits",
                format_date(first.timestamp),
                format_date(last.timestamp),
                last.cumulative,
                report.cumulative_churn.len()
            );
        }
        _ => {
            let _ = writeln!(out, "  No commits analyzed.");
        }
    }
    let _ = writeln!(out, "{rule}");

    out
}

fn paths(files: Vec<&FileReport>) -> Vec<&str> {
    files.into_iter().map(|f| f.path.as_str()).collect()
}

fn write_file_table(out: &mut String, files: &[&FileReport]) {
    if files.is_empty() {
        let _ = writeln!(out, "No files with churn were found to analyze.");
        return;
    }
    let _ = writeln!(
        out,
        "{:<width$} {:<10} {:<12} {:<10} {:<10}",
        "File",
        "Ratio",
        "Refactoring",
        "Creation",
        "SLoC",
        width = PATH_WIDTH
    );
    let _ = writeln!(out, "{}", "-".repeat(PATH_WIDTH + 46));
    for file in files {
        let _ = writeln!(
            out,
            "{:<width$} {:<10} {:<12} {:<10} {:<10}",
            file.path,
            percent(file.ratio),
            file.refactoring_churn,
            file.creation_churn,
            file.sloc,
            width = PATH_WIDTH
        );
    }
}

/// Generate Markdown output.
pub fn format_markdown(report: &AnalysisReport, options: &ReportOptions) -> String {
    let mut out = String::new();
    let overall = &report.overall;

    let _ = writeln!(out, "# Evolution Metrics\n");
    let _ = writeln!(out, "**Commits analyzed:** {}\n", report.commits_analyzed);
    let _ = writeln!(out, "## Overall\n");
    let _ = writeln!(out, "- **Files tracked:** {}", overall.files_tracked);
    let _ = writeln!(out, "- **Total SLoC:** {}", overall.total_sloc);
    let _ = writeln!(out, "- **Creation churn:** {}", overall.total_creation_churn);
    let _ = writeln!(
        out,
        "- **Refactoring churn:** {}",
        overall.total_refactoring_churn
    );
    let _ = writeln!(
        out,
        "- **Refactoring ratio:** {}\n",
        percent(overall.refactoring_ratio)
    );

    let _ = writeln!(out, "## Commit Classification\n");
    let _ = writeln!(out, "| Category | Commits |");
    let _ = writeln!(out, "|----------|---------|");
    for count in report.commit_counts.iter() {
        let _ = writeln!(out, "| {} | {} |", count.category, count.commits);
    }
    out.push('\n');

    let _ = writeln!(out, "## Top Files by Refactoring Ratio\n");
    write_markdown_table(&mut out, &top_by_ratio(&report.files, options.top_ratio));

    let _ = writeln!(out, "## Top Files by Churn\n");
    write_markdown_table(&mut out, &top_by_churn(&report.files, options.top_churn));

    let _ = writeln!(out, "## Change-Set Size\n");
    let _ = writeln!(out, "| Files | Commits |");
    let _ = writeln!(out, "|-------|---------|");
    for (size, commits) in report.change_sets.iter() {
        let _ = writeln!(out, "| {size} | {commits} |");
    }

    out
}

fn write_markdown_table(out: &mut String, files: &[&FileReport]) {
    if files.is_empty() {
        let _ = writeln!(out, "No tracked files.\n");
        return;
    }
    let _ = writeln!(out, "| Rank | File | Ratio | Refactoring | Creation | SLoC |");
    let _ = writeln!(out, "|------|------|-------|-------------|----------|------|");
    for (i, file) in files.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} | {} | {} |",
            i + 1,
            file.path,
            percent(file.ratio),
            file.refactoring_churn,
            file.creation_churn,
            file.sloc,
        );
    }
    out.push('\n');
}

/// Format a ratio as a percentage with two decimals.
///
/// # Examples
///
/// ```
/// use evolens_metrics::report::percent;
///
/// assert_eq!(percent(0.375), "37.50%");
/// ```
pub fn percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Format a unix timestamp as a UTC calendar date.
///
/// # Examples
///
/// ```
/// use evolens_metrics::report::format_date;
///
/// assert_eq!(format_date(0), "1970-01-01");
/// ```
pub fn format_date(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
