use anyhow::{Context, Result};
use invite_harvester::{config::Config, util::non_empty_lines, Session};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

use super::{print_outcome, report_progress};
use crate::OutputArgs;

pub async fn validate_links(config: Config, links: Vec<String>, output: OutputArgs) -> Result<()> {
    let session = Session::new(&config.validation).context("Failed to create HTTP client")?;
    let show_progress = output.show_progress();

    let (outcome, rejected) = session
        .validate_raw(links, |p| {
            if show_progress {
                report_progress(p)
            }
        })
        .await;

    print_outcome(&session, &outcome, &output.filter(), rejected)
}

pub async fn validate_file(config: Config, path: PathBuf, output: OutputArgs) -> Result<()> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read links from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read links from '{}'", path.display()))?
    };

    let lines: Vec<&str> = non_empty_lines(&text).collect();
    info!("Read {} candidate lines", lines.len());

    let session = Session::new(&config.validation).context("Failed to create HTTP client")?;
    let show_progress = output.show_progress();

    let (outcome, rejected) = session
        .validate_raw(lines, |p| {
            if show_progress {
                report_progress(p)
            }
        })
        .await;

    print_outcome(&session, &outcome, &output.filter(), rejected)
}
