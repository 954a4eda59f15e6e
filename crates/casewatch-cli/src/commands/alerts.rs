//! Alerts command implementation.

use crate::cli::{AlertAction, AlertsArgs};
use crate::error::Result;
use crate::output::Formatter;
use casewatch_domain::traits::{AlertQuery, EscalationStore};
use casewatch_domain::UserId;
use casewatch_escalator::current_timestamp;
use casewatch_store::SqliteStore;

/// Execute an alert action.
pub fn execute_alerts(args: AlertsArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    match args.action {
        AlertAction::List {
            record,
            status,
            target,
            limit,
        } => {
            let query = AlertQuery {
                record_id: record,
                status: status.to_status(),
                target_user_id: target.map(UserId::from),
                limit,
            };
            let alerts = store.list_alerts(&query)?;
            println!("{}", formatter.format_alerts(&alerts)?);
        }
        AlertAction::Resolve { id } => {
            let alert = store.resolve_alert(id, current_timestamp())?;
            println!(
                "{}",
                formatter.success(&format!("Alert {} ({}) resolved", alert.id, alert.tier))
            );
        }
    }

    Ok(())
}
