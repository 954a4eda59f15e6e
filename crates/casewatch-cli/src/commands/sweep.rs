//! Sweep command implementation.

use crate::cli::SweepArgs;
use crate::error::Result;
use crate::output::Formatter;
use casewatch_escalator::{current_timestamp, Escalator, EscalatorConfig, SweepControl, SweepReport};
use casewatch_store::SqliteStore;

/// Execute the sweep command.
pub fn execute_sweep(
    args: SweepArgs,
    store: &mut SqliteStore,
    config: &EscalatorConfig,
    formatter: &Formatter,
) -> Result<()> {
    let report = run_sweep(&args, store, config)?;
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}

/// Run one sweep with the command-line overrides applied.
pub fn run_sweep(args: &SweepArgs, store: &mut SqliteStore, config: &EscalatorConfig) -> Result<SweepReport> {
    let mut config = config.clone();
    if args.dry_run {
        config.dry_run = true;
    }

    let mut escalator = Escalator::new(config)?;
    let now = args.at.unwrap_or_else(current_timestamp);
    let report = escalator.run_sweep(store, now, &SweepControl::new())?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewatch_domain::traits::{AlertQuery, EscalationStore};
    use casewatch_domain::{RecordKind, TrackedRecord, SECONDS_PER_DAY};

    const NOW: u64 = 30_000 * SECONDS_PER_DAY;

    fn store_with_stalled_record() -> SqliteStore {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let record = TrackedRecord::new(RecordKind::Protocol, "open", NOW - 16 * SECONDS_PER_DAY)
            .with_responsible("ana", None);
        store.insert_record(&record).unwrap();
        store
    }

    #[test]
    fn test_sweep_at_fixed_time() {
        let mut store = store_with_stalled_record();
        let args = SweepArgs {
            dry_run: false,
            at: Some(NOW),
        };

        let report = run_sweep(&args, &mut store, &EscalatorConfig::default()).unwrap();
        assert_eq!(report.alerts_created, 1);
        assert_eq!(store.list_alerts(&AlertQuery::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_dry_run_flag_overrides_config() {
        let mut store = store_with_stalled_record();
        let args = SweepArgs {
            dry_run: true,
            at: Some(NOW),
        };

        let report = run_sweep(&args, &mut store, &EscalatorConfig::default()).unwrap();
        assert_eq!(report.alerts_created, 0);
        assert_eq!(report.dry_run_escalations, 1);
        assert!(store.list_alerts(&AlertQuery::default()).unwrap().is_empty());
    }
}
