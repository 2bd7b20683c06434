//! Notice aggregator CLI
//!
//! Runs the background refresher or a single cycle against the configured
//! notice boards.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use notice_aggregator::{NoticeService, error::Result, models::Config};
use serde::Serialize;

/// Campus notice aggregator
#[derive(Parser, Debug)]
#[command(
    name = "aggregator",
    version,
    about = "Aggregates campus notice boards into one cache"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh in the background until Ctrl-C
    Serve,

    /// Run one refresh cycle and print its report
    Refresh,

    /// Show per-source counts and snapshot file info
    Status,

    /// Print every cached notice, newest first
    List,

    /// Print the configured sources
    Sources,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    if let Command::Validate = cli.command {
        log::info!("Validating {}...", cli.config.display());
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK ({} sources)", config.sources.len());
        return Ok(());
    }

    let service = NoticeService::from_config(&config)?;

    match cli.command {
        Command::Serve => {
            service.scheduler().restore_snapshot().await;
            service
                .scheduler()
                .run_until(tokio::signal::ctrl_c())
                .await;
        }

        Command::Refresh => {
            service.scheduler().restore_snapshot().await;
            let report = service.force_refresh().await;
            print_json(&report)?;
        }

        Command::Status => {
            service.scheduler().restore_snapshot().await;
            print_json(&service.get_status().await)?;
        }

        Command::List => {
            service.scheduler().restore_snapshot().await;
            print_json(&service.get_all().await)?;
        }

        Command::Sources => {
            print_json(&service.list_sources())?;
        }

        Command::Validate => {}
    }

    Ok(())
}
