//! bbstream CLI
//!
//! Polls the Blackboard alert stream, archives the raw entries, and routes
//! classified alerts to the task inbox.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bbstream::{
    error::Result,
    models::{Config, RawEntry},
    pipeline::{self, Dispatcher},
    services::{JsonlSink, Session, classify_all},
    storage::EntryArchive,
};

/// bbstream - Blackboard alert stream poller
#[derive(Parser, Debug)]
#[command(name = "bbstream", version, about = "Blackboard alert stream poller")]
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
    /// Full pass: login, fetch, archive, classify, dispatch
    Run,

    /// Fetch and archive raw entries without dispatching
    Fetch,

    /// Classify and dispatch a previously archived pass
    Replay {
        /// Path to an archived raw-entry file
        #[arg(long)]
        file: PathBuf,
    },

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

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Validate => {
            log::info!("Configuration OK ({} course mappings)", config.courses.len());
        }

        Command::Fetch => {
            let session = Session::new(&config.portal)?;
            pipeline::run_login(&session, &config).await?;

            let entries = pipeline::run_acquire(&session, &config).await?;
            log::info!("Fetched {} raw entries", entries.len());
        }

        Command::Run => {
            let session = Session::new(&config.portal)?;
            pipeline::run_login(&session, &config).await?;

            let entries = pipeline::run_acquire(&session, &config).await?;
            if entries.is_empty() {
                log::info!("No alert available");
                return Ok(());
            }

            dispatch(&session, &config, &entries).await?;
        }

        Command::Replay { file } => {
            log::warn!("Replaying archived entries from {}", file.display());
            let session = Session::new(&config.portal)?;
            pipeline::run_login(&session, &config).await?;

            let entries = EntryArchive::load(&file).await?;
            if entries.is_empty() {
                log::info!("Archive holds no entries");
                return Ok(());
            }

            dispatch(&session, &config, &entries).await?;
        }
    }

    Ok(())
}

/// Classify raw entries and dispatch the resulting alerts.
async fn dispatch(session: &Session, config: &Config, entries: &[RawEntry]) -> Result<()> {
    let alerts = classify_all(entries, session.base_url());

    let sink = JsonlSink::new(&config.sink.inbox_path);
    let dispatcher = Dispatcher::new(session, config, &sink);
    let outcome = dispatcher.dispatch_all(&alerts).await?;

    if outcome.new_courses {
        log::warn!(
            "New course(s) detected. Map them in the configuration and rerun."
        );
    } else {
        log::info!(
            "{} item(s) processed ({} failures)",
            outcome.delivered,
            outcome.failures
        );
    }
    Ok(())
}
