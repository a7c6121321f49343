use crate::config::Settings;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::NaiveDate;
use reaper_common::{ElasticClient, IndexPattern, RetentionEngine, RunReport};
use std::io::Write;

/// Run one retention pass against the configured cluster
///
/// The summary goes to `out`. Progress lines share `out` for table output;
/// with JSON or YAML they go to `err` so `out` holds only the document.
pub async fn handle_reap_command<O: Write, E: Write>(
    settings: &Settings,
    today: NaiveDate,
    out: &mut O,
    err: &mut E,
) -> Result<RunReport> {
    let pattern = IndexPattern::new(&settings.prefix)?;
    let client = ElasticClient::new(&settings.elastic)?;
    let engine = RetentionEngine::new(client, pattern);

    let progress: &mut dyn Write = match settings.output {
        OutputFormat::Table => &mut *out,
        OutputFormat::Json | OutputFormat::Yaml => &mut *err,
    };

    let report = engine
        .run_with(settings.window, today, |threshold, entry| {
            if let Err(e) = output::write_progress(&mut *progress, threshold, entry) {
                tracing::warn!(error = %e, "failed to write progress");
            }
        })
        .await?;

    output::write_report(out, &report, settings.output)?;
    Ok(report)
}

/// Process exit status for a finished run
///
/// Failed deletions only change the status when `--fail-on-error` is set.
pub fn exit_status(settings: &Settings, report: &RunReport) -> i32 {
    if settings.fail_on_error && report.has_failures() {
        1
    } else {
        0
    }
}
