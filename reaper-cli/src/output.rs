///! Output formatting for CLI
///!
///! Per-index progress lines are written as the run proceeds; the closing
///! summary can be rendered as a table, JSON, or YAML.

use colored::Colorize;
use reaper_common::{IndexOutcome, IndexReport, RunReport, RunSummary, ThresholdDate};
use serde::Serialize;
use std::io::{self, Write};
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct IndexRow {
    index: String,
    status: String,
    detail: String,
}

impl From<&IndexReport> for IndexRow {
    fn from(r: &IndexReport) -> Self {
        let (status, detail) = match &r.outcome {
            IndexOutcome::Deleted => ("deleted", String::new()),
            IndexOutcome::DeleteFailed { error } => ("failed", truncate(error, 60)),
            IndexOutcome::Kept => ("kept", String::new()),
            IndexOutcome::Skipped { reason } => ("skipped", reason.to_string()),
        };

        Self {
            index: r.index.clone(),
            status: status.to_string(),
            detail,
        }
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    threshold: &'a ThresholdDate,
    prefix: &'a str,
    summary: RunSummary,
    indices: &'a [IndexReport],
}

/// Plain-text progress lines for one handled index
pub fn progress_lines(threshold: &ThresholdDate, entry: &IndexReport) -> Vec<String> {
    let index = &entry.index;
    match &entry.outcome {
        IndexOutcome::Deleted => vec![
            format!("Deleting index: {} (older than {})", index, threshold),
            format!("Successfully deleted index: {}", index),
        ],
        IndexOutcome::DeleteFailed { error } => vec![
            format!("Deleting index: {} (older than {})", index, threshold),
            format!("Error deleting index {}: {}", index, error),
        ],
        IndexOutcome::Kept => vec![format!(
            "Skipping index: {} (newer than or equal to {})",
            index, threshold
        )],
        IndexOutcome::Skipped { reason } => {
            vec![format!("Warning: Skipping {} - {}", index, reason)]
        }
    }
}

/// Write progress for one index as soon as it has been handled
pub fn write_progress<W: Write + ?Sized>(
    w: &mut W,
    threshold: &ThresholdDate,
    entry: &IndexReport,
) -> io::Result<()> {
    let lines = progress_lines(threshold, entry);
    let Some((last, rest)) = lines.split_last() else {
        return Ok(());
    };

    for line in rest {
        writeln!(w, "{}", line)?;
    }

    match entry.outcome {
        IndexOutcome::Deleted => writeln!(w, "{} {}", "✓".green().bold(), last.green()),
        IndexOutcome::DeleteFailed { .. } => writeln!(w, "{} {}", "✗".red().bold(), last.red()),
        IndexOutcome::Kept => writeln!(w, "{}", last.dimmed()),
        IndexOutcome::Skipped { .. } => {
            writeln!(w, "{} {}", "⚠".yellow().bold(), last.yellow())
        }
    }
}

/// Write the closing summary of a run
///
/// JSON and YAML always produce a single document, even for an empty run,
/// so the output can be parsed back.
pub fn write_report<W: Write>(
    w: &mut W,
    report: &RunReport,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let summary = report.summary();

    match format {
        OutputFormat::Table if report.is_empty() => writeln!(w, "No indices found")?,
        OutputFormat::Table => {
            let rows: Vec<IndexRow> = report.indices.iter().map(IndexRow::from).collect();
            writeln!(w, "{}", Table::new(rows))?;
            writeln!(
                w,
                "{} {}",
                "ℹ".blue().bold(),
                summary_line(&summary, &report.threshold)
            )?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&view(report, summary))?;
            writeln!(w, "{}", json)?;
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&view(report, summary))?;
            write!(w, "{}", yaml)?;
        }
    }
    Ok(())
}

fn view(report: &RunReport, summary: RunSummary) -> ReportView<'_> {
    ReportView {
        threshold: &report.threshold,
        prefix: &report.prefix,
        summary,
        indices: &report.indices,
    }
}

pub fn summary_line(summary: &RunSummary, threshold: &ThresholdDate) -> String {
    format!(
        "{} indices checked against {}: {} deleted, {} failed, {} kept, {} skipped",
        summary.total, threshold, summary.deleted, summary.failed, summary.kept, summary.skipped
    )
}

/// Print an error message with red X
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Truncate a string to max length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
