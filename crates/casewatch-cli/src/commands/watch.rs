//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::error::Result;
use crate::output::Formatter;
use casewatch_escalator::{EscalatorConfig, EscalatorWorker};
use casewatch_store::SqliteStore;

/// Execute the watch command.
pub async fn execute_watch(
    args: WatchArgs,
    store: &mut SqliteStore,
    config: &EscalatorConfig,
    formatter: &Formatter,
) -> Result<()> {
    let config = watch_config(&args, config);
    let mut worker = EscalatorWorker::new(config.clone())?;

    println!(
        "{}",
        formatter.info(&format!(
            "Sweeping every {} minute(s){}. Press Ctrl+C to stop.",
            config.sweep_interval_minutes,
            if config.dry_run { " (dry run)" } else { "" }
        ))
    );

    match args.cycles {
        Some(cycles) => worker.run_cycles(store, cycles).await?,
        None => worker.run(store).await?,
    }

    println!("{}", worker.metrics().summary());
    Ok(())
}

fn watch_config(args: &WatchArgs, config: &EscalatorConfig) -> EscalatorConfig {
    let mut config = config.clone();
    if let Some(interval) = args.interval {
        config.sweep_interval_minutes = interval;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::CliError;

    #[test]
    fn test_overrides() {
        let args = WatchArgs {
            interval: Some(5),
            cycles: None,
            dry_run: true,
        };
        let config = watch_config(&args, &EscalatorConfig::default());
        assert_eq!(config.sweep_interval_minutes, 5);
        assert!(config.dry_run);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_watch() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let args = WatchArgs {
            interval: Some(1),
            cycles: Some(2),
            dry_run: false,
        };
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        execute_watch(args, &mut store, &EscalatorConfig::default(), &formatter)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let args = WatchArgs {
            interval: Some(0),
            cycles: Some(1),
            dry_run: false,
        };
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let result = execute_watch(args, &mut store, &EscalatorConfig::default(), &formatter).await;
        assert!(matches!(result, Err(CliError::Escalation(_))));
    }
}
