//! Subcommand handlers

pub mod init;
pub mod scrape;
pub mod validate;

use anyhow::{Context, Result};
use invite_harvester::{
    scraping::{BatchOutcome, BatchProgress, RecordFilter},
    util::truncate_str,
    Session,
};
use std::io::Write;

/// Progress line for one completed link
pub(crate) fn report_progress(progress: &BatchProgress<'_>) {
    eprintln!(
        "[{}/{}] {:<14} {} {}",
        progress.completed,
        progress.total,
        progress.record.status.to_string(),
        progress.record.link,
        truncate_str(&progress.record.group_name, 40)
    );
}

/// Print matching records of a batch as JSON lines, then the session summary
pub(crate) fn print_outcome(
    session: &Session,
    outcome: &BatchOutcome,
    filter: &RecordFilter,
    rejected: usize,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for record in outcome.records.iter().filter(|r| filter.matches(r)) {
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    let report = &outcome.report;
    let summary = session.store().summary();
    eprintln!(
        "Validated {} links ({} cached, {} fetched, {} already processed, {} rejected) in {:.1}s",
        report.dispatched,
        report.cache_hits,
        report.network_fetches,
        report.skipped_processed,
        rejected,
        report.duration.as_secs_f64()
    );
    eprintln!(
        "Active: {}  Expired/Full/Invalid: {}  Other: {}",
        summary.active, summary.expired_or_full, summary.other
    );

    Ok(())
}
