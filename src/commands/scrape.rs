use anyhow::{Context, Result};
use invite_harvester::{config::Config, Session};
use std::io::Write;
use tracing::{info, warn};

use super::{print_outcome, report_progress};
use crate::OutputArgs;

pub async fn scrape_pages(
    config: Config,
    pages: Vec<String>,
    no_validate: bool,
    output: OutputArgs,
) -> Result<()> {
    info!("Scanning {} pages for invitation links", pages.len());

    let session = Session::new(&config.validation).context("Failed to create HTTP client")?;
    let show_progress = output.show_progress();

    let report = session
        .scrape_pages(&pages, |p| {
            if show_progress {
                eprintln!("[{}/{}] {} links on {}", p.completed, p.total, p.found, p.page_url);
            }
        })
        .await;

    for page in &report.failed_pages {
        warn!("Could not scan {}", page);
    }
    eprintln!(
        "Found {} unique links on {} pages ({} failed)",
        report.links.len(),
        report.pages_scanned,
        report.failed_pages.len()
    );

    if no_validate {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for link in &report.links {
            writeln!(out, "{}", link)?;
        }
        out.flush()?;
        return Ok(());
    }

    let outcome = session
        .validate_batch(report.links, |p| {
            if show_progress {
                report_progress(p)
            }
        })
        .await;

    print_outcome(&session, &outcome, &output.filter(), 0)
}
