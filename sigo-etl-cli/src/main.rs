//! sigo-etl — command-line runner for the SIGO occurrence ETL.

mod commands;

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Extract SIGO occurrences and write the star-schema CSV tables.
#[derive(Parser, Debug)]
#[command(name = "sigo-etl", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Workspace directory (looked up for `sigo-etl.toml`)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run the pipeline (default)
    Run(RunArgs),
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Occurrence endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bearer token (prefer the SIGO_API_TOKEN env var)
    #[arg(long)]
    pub token: Option<String>,

    /// Output directory for the CSV tables
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Replay a saved JSON response instead of calling the API
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Skip writing dashboard_data.json
    #[arg(long)]
    pub no_summary: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Print the effective configuration (token redacted)
    Show,
}

/// Default directory for the JSON run log.
fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("br", "sigo", "sigo-etl")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Open the daily-rolling JSON log under `log_dir`.
fn open_log_file(log_dir: &Path) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("sigo-etl.log")
        .build(log_dir)
        .with_context(|| format!("opening log file in {}", log_dir.display()))
}

/// Install the stderr layer and, when the log directory is usable, the JSON
/// file layer. An unusable log directory only disables file logging.
fn init_tracing(verbose: u8, quiet: bool) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = default_log_dir();
    let (json_layer, guard, file_error) = match open_log_file(&log_dir) {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(error = %format!("{e:#}"), "File logging disabled");
    }

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.quiet);

    commands::handle(cli).await
}
