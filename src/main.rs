//! invite-harvester: discover and validate group invitation links

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use invite_harvester::{
    config::{Config, LogFormat},
    scraping::RecordFilter,
    types::StatusCategory,
};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "invite-harvester")]
#[command(about = "Discover, normalize, and validate group invitation links")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output selection shared by the validating commands
#[derive(clap::Args, Clone, Default)]
pub struct OutputArgs {
    /// Only print records whose group name contains this text
    #[arg(long)]
    name: Option<String>,

    /// Only print records in these status categories
    #[arg(long, value_enum, value_delimiter = ',')]
    status: Vec<CliStatus>,

    /// Print a progress line per completed link to stderr
    #[arg(long)]
    progress: bool,
}

impl OutputArgs {
    pub fn filter(&self) -> RecordFilter {
        RecordFilter {
            name_keyword: self.name.clone(),
            categories: self.status.iter().map(|s| StatusCategory::from(*s)).collect(),
        }
    }

    pub fn show_progress(&self) -> bool {
        self.progress
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CliStatus {
    Active,
    Expired,
    Other,
}

impl From<CliStatus> for StatusCategory {
    fn from(status: CliStatus) -> Self {
        match status {
            CliStatus::Active => StatusCategory::Active,
            CliStatus::Expired => StatusCategory::ExpiredOrFull,
            CliStatus::Other => StatusCategory::Other,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate invitation links given on the command line
    Validate {
        /// Raw links (anything that is not an invitation link is skipped)
        #[arg(required = true)]
        links: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Scan web pages for invitation links, then validate them
    Scrape {
        /// Page URLs to scan
        #[arg(required = true)]
        pages: Vec<String>,

        /// Print discovered links without validating them
        #[arg(long)]
        no_validate: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Validate links read one per line from a file (`-` for stdin)
    File {
        /// Input file path
        path: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(default_value = "config.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { path, force } = &cli.command {
        return commands::init::init_config(path, *force);
    }

    let config = Config::load_or_default(&cli.config)?;
    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Validate { links, output } => {
            commands::validate::validate_links(config, links, output).await
        }
        Commands::Scrape {
            pages,
            no_validate,
            output,
        } => commands::scrape::scrape_pages(config, pages, no_validate, output).await,
        Commands::File { path, output } => {
            commands::validate::validate_file(config, path, output).await
        }
        Commands::Init { .. } => Ok(()),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays JSON lines.
fn init_logging(config: &Config, verbose: u8) -> Result<()> {
    let log_level: Level = config.logging.level.raised_by(verbose).into();

    match config.logging.format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
