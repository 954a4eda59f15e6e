//! Record command implementation.

use crate::cli::{RecordAction, RecordArgs};
use crate::error::{CliError, Result};
use crate::output::{Formatter, RecordRow};
use casewatch_domain::traits::EscalationStore;
use casewatch_domain::{ActivityEvent, RecordId, Tag, TrackedRecord, UserId, SECONDS_PER_DAY};
use casewatch_escalator::{current_timestamp, Escalator, EscalatorConfig};
use casewatch_store::SqliteStore;

/// Execute a record management action.
pub fn execute_record(
    args: RecordArgs,
    store: &mut SqliteStore,
    config: &EscalatorConfig,
    formatter: &Formatter,
) -> Result<()> {
    let now = current_timestamp();

    match args.action {
        RecordAction::Add {
            kind,
            status,
            stalled_days,
            last_movement_at,
            responsible,
            documents_pending,
        } => {
            let last_movement_at =
                last_movement_at.unwrap_or_else(|| now.saturating_sub(stalled_days * SECONDS_PER_DAY));
            let record = build_record(kind.into(), &status, last_movement_at, responsible, documents_pending, now)?;
            let id = store.insert_record(&record)?;
            println!("{}", formatter.record_added(&id));
        }
        RecordAction::List => {
            let rows = list_open(store, config, now)?;
            println!("{}", formatter.format_records(&rows)?);
        }
        RecordAction::Show { id } => {
            let mut escalator = Escalator::new(config.clone())?;
            let evaluation = escalator.evaluate_one(store, id, now)?;
            println!("{}", formatter.format_evaluation(&evaluation)?);
        }
        RecordAction::Touch { id, actor, at } => {
            let event = ActivityEvent {
                record_id: id,
                occurred_at: at.unwrap_or(now),
                actor: actor.map(UserId::from),
            };
            let mut escalator = Escalator::new(config.clone())?;
            escalator.record_activity(store, &event, now)?;

            let evaluation = escalator.evaluate_one(store, id, now)?;
            println!("{}", formatter.format_evaluation(&evaluation)?);
        }
        RecordAction::Status { id, status } => {
            let status = non_empty(&status, "status")?;
            store.set_status(id, status)?;
            println!("{}", formatter.success(&format!("Record {} is now '{}'", id, status)));
        }
        RecordAction::Tag { id, code, label, color } => {
            let code = non_empty(&code, "tag code")?;
            store.upsert_tag(id, &Tag::manual(code, label, color))?;
            println!("{}", formatter.success(&format!("Tag {} attached to {}", code, id)));
        }
        RecordAction::Docs { id, received } => {
            store.set_documents_pending(id, !received)?;
            let state = if received { "received" } else { "pending" };
            println!("{}", formatter.success(&format!("Documents of {} marked {}", id, state)));
        }
    }

    Ok(())
}

fn build_record(
    kind: casewatch_domain::RecordKind,
    status: &str,
    last_movement_at: u64,
    responsible: Option<String>,
    documents_pending: bool,
    now: u64,
) -> Result<TrackedRecord> {
    if last_movement_at > now {
        return Err(CliError::InvalidInput(
            "Last movement cannot be in the future".to_string(),
        ));
    }

    let mut record = TrackedRecord::new(kind, non_empty(status, "status")?, last_movement_at)
        .with_documents_pending(documents_pending);
    if let Some(owner) = responsible {
        // Assume the owner last acted when the record last moved
        record = record.with_responsible(non_empty(&owner, "responsible")?, Some(last_movement_at));
    }
    Ok(record)
}

/// Open records with their tier at `now`; unreadable records are listed without one.
pub fn list_open(store: &SqliteStore, config: &EscalatorConfig, now: u64) -> Result<Vec<RecordRow>> {
    let escalator = Escalator::new(config.clone())?;
    let records = store.list_non_terminal_records(escalator.status_policy())?;

    Ok(records
        .into_iter()
        .map(|record| {
            let assessment = escalator.assess(&record, now).unwrap_or_else(|e| {
                tracing::warn!(record_id = %record.id, "cannot classify record: {}", e);
                None
            });
            (record, assessment)
        })
        .collect())
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}

/// Look up a record or report it missing.
pub fn require_record(store: &SqliteStore, id: RecordId) -> Result<TrackedRecord> {
    store
        .get_record(id)?
        .ok_or_else(|| CliError::NotFound(format!("record {}", id)))
}
