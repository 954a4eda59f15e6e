//! Casewatch CLI - Aging and escalation of stalled records.

use casewatch_cli::commands;
use casewatch_cli::{Cli, Command, Config, Formatter};
use casewatch_store::SqliteStore;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> casewatch_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load or create config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => {
            let created = !Config::path()?.exists();
            let cfg = Config::load()?;
            if created {
                if let Err(e) = cfg.save() {
                    tracing::warn!("Could not write default config: {}", e);
                }
            }
            cfg
        }
    };

    // Override database if specified
    if let Some(database) = cli.database {
        config.database = Some(database);
    }

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let database = config.database_path()?;
    tracing::debug!("Opening database {}", database.display());
    let mut store = SqliteStore::new(&database)?;

    match cli.command {
        Command::Record(args) => {
            commands::execute_record(args, &mut store, &config.escalator, &formatter)?;
        }
        Command::Sweep(args) => {
            commands::execute_sweep(args, &mut store, &config.escalator, &formatter)?;
        }
        Command::Watch(args) => {
            commands::execute_watch(args, &mut store, &config.escalator, &formatter).await?;
        }
        Command::Alerts(args) => {
            commands::execute_alerts(args, &mut store, &formatter)?;
        }
        Command::History(args) => {
            commands::execute_history(args, &store, &formatter)?;
        }
    }

    Ok(())
}
