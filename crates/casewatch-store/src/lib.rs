//! Casewatch Storage Layer
//!
//! Implements the `EscalationStore` trait on SQLite.
//!
//! # Architecture
//!
//! - `records` + `record_tags` hold tracked records and their manual tags
//! - `alerts` carries a partial unique index on `(record_id, tier)` for pending
//!   rows, so the duplicate-alert check is an atomic insert, not a read-then-write
//! - `assignment_log` is append-only (enforced by triggers)
//! - Escalations are committed in a single transaction
//!
//! # Examples
//!
//! ```no_run
//! use casewatch_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for escalation operations
//! ```

#![warn(missing_docs)]

use casewatch_domain::traits::{AlertInsert, AlertQuery, EscalationStore, EscalationWrite};
use casewatch_domain::{
    Alert, AlertId, AlertStatus, AssignmentId, AssignmentLog, AssignmentReason, RecordId,
    RecordKind, StatusPolicy, Tag, Tier, TrackedRecord, UserId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Entity already exists
    #[error("Duplicate: {0}")]
    Duplicate(String),
}

const RECORD_COLUMNS: &str =
    "id, kind, status, last_movement_at, responsible_id, responsible_last_action_at, documents_pending";

const ALERT_COLUMNS: &str = "id, record_id, tier, status, target_user_id, created_at, resolved_at";

const LOG_COLUMNS: &str =
    "id, record_id, previous_responsible_id, new_responsible_id, reason, created_at";

/// SQLite-based implementation of EscalationStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Change the lifecycle status of a record
    pub fn set_status(&mut self, id: RecordId, status: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE records SET status = ?1 WHERE id = ?2",
            params![status, id_bytes(id.value())],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        Ok(())
    }

    /// Set or clear the missing-document flag of a record
    pub fn set_documents_pending(&mut self, id: RecordId, pending: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE records SET documents_pending = ?1 WHERE id = ?2",
            params![pending, id_bytes(id.value())],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        Ok(())
    }

    /// Attach (or replace) a manual tag on a record
    pub fn upsert_tag(&mut self, id: RecordId, tag: &Tag) -> Result<(), StoreError> {
        if self.get_record(id)?.is_none() {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        self.conn.execute(
            "INSERT INTO record_tags (record_id, code, label, color, active) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(record_id, code) DO UPDATE SET
             label = excluded.label, color = excluded.color, active = excluded.active",
            params![id_bytes(id.value()), &tag.code, &tag.label, &tag.color, tag.active],
        )?;
        Ok(())
    }
}

impl EscalationStore for SqliteStore {
    type Error = StoreError;

    fn list_non_terminal_records(&self, policy: &StatusPolicy) -> Result<Vec<TrackedRecord>, Self::Error> {
        // SQLite's lower() only folds ASCII, so terminal statuses are matched here
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM records ORDER BY id", RECORD_COLUMNS))?;
        let mut records = stmt
            .query_map([], row_to_record)?
            .filter(|row| !matches!(row, Ok(record) if policy.is_record_terminal(record)))
            .collect::<Result<Vec<_>, _>>()?;

        for record in &mut records {
            record.tags = load_tags(&self.conn, record.id)?;
        }
        Ok(records)
    }

    fn get_record(&self, id: RecordId) -> Result<Option<TrackedRecord>, Self::Error> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM records WHERE id = ?1", RECORD_COLUMNS),
                params![id_bytes(id.value())],
                row_to_record,
            )
            .optional()?;

        match record {
            Some(mut record) => {
                record.tags = load_tags(&self.conn, id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn insert_record(&mut self, record: &TrackedRecord) -> Result<RecordId, Self::Error> {
        let tx = self.conn.transaction()?;
        let key = id_bytes(record.id.value());

        let inserted = tx.execute(
            &format!(
                "INSERT INTO records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) ON CONFLICT(id) DO NOTHING",
                RECORD_COLUMNS
            ),
            params![
                &key,
                record.kind.as_str(),
                &record.status,
                record.last_movement_at.map(|t| t as i64),
                record.responsible_id.as_ref().map(UserId::as_str),
                record.responsible_last_action_at.map(|t| t as i64),
                record.documents_pending,
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::Duplicate(format!("record {}", record.id)));
        }

        for tag in &record.tags {
            tx.execute(
                "INSERT OR REPLACE INTO record_tags (record_id, code, label, color, active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![&key, &tag.code, &tag.label, &tag.color, tag.active],
            )?;
        }

        tx.commit()?;
        Ok(record.id)
    }

    fn record_activity(
        &mut self,
        id: RecordId,
        occurred_at: u64,
        actor: Option<&UserId>,
    ) -> Result<(), Self::Error> {
        // Only moves forward: a late-delivered event never rewinds the clock
        let changed = self.conn.execute(
            "UPDATE records SET
                last_movement_at = MAX(COALESCE(last_movement_at, 0), ?1),
                responsible_last_action_at = CASE
                    WHEN ?2 IS NOT NULL AND responsible_id = ?2
                    THEN MAX(COALESCE(responsible_last_action_at, 0), ?1)
                    ELSE responsible_last_action_at
                END
             WHERE id = ?3",
            params![occurred_at as i64, actor.map(UserId::as_str), id_bytes(id.value())],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        Ok(())
    }

    fn get_pending_alert(&self, record_id: RecordId, tier: Tier) -> Result<Option<Alert>, Self::Error> {
        Ok(fetch_pending_alert(&self.conn, record_id, tier)?)
    }

    fn create_alert(
        &mut self,
        record_id: RecordId,
        tier: Tier,
        target_user_id: &UserId,
        created_at: u64,
    ) -> Result<AlertInsert, Self::Error> {
        let alert = Alert::pending(record_id, tier, target_user_id.clone(), created_at);
        let tx = self.conn.transaction()?;
        let outcome = insert_alert(&tx, &alert)?;
        tx.commit()?;
        Ok(outcome)
    }

    fn update_responsible(
        &mut self,
        record_id: RecordId,
        new_responsible_id: &UserId,
        assigned_at: u64,
    ) -> Result<(), Self::Error> {
        set_responsible(&self.conn, record_id, new_responsible_id, assigned_at)
    }

    fn append_assignment_log(&mut self, entry: &AssignmentLog) -> Result<(), Self::Error> {
        insert_log(&self.conn, entry)
    }

    fn commit_escalation(&mut self, write: &EscalationWrite) -> Result<AlertInsert, Self::Error> {
        let tx = self.conn.transaction()?;

        let outcome = insert_alert(&tx, &write.alert)?;
        if let AlertInsert::AlreadyPending(_) = outcome {
            // Dropping the transaction rolls it back
            return Ok(outcome);
        }

        if let Some(entry) = &write.reassignment {
            insert_log(&tx, entry)?;
            set_responsible(
                &tx,
                entry.tracked_record_id,
                &entry.new_responsible_id,
                entry.created_at,
            )?;
        }

        tx.commit()?;
        Ok(outcome)
    }

    fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>, Self::Error> {
        let mut sql = format!("SELECT {} FROM alerts WHERE 1=1", ALERT_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(record_id) = query.record_id {
            sql.push_str(" AND record_id = ?");
            params.push(Box::new(id_bytes(record_id.value())));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(target) = &query.target_user_id {
            sql.push_str(" AND target_user_id = ?");
            params.push(Box::new(target.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let alerts = stmt
            .query_map(&param_refs[..], row_to_alert)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(alerts)
    }

    fn resolve_alert(&mut self, id: AlertId, resolved_at: u64) -> Result<Alert, Self::Error> {
        let key = id_bytes(id.value());
        // Resolving twice keeps the first resolution time
        self.conn.execute(
            "UPDATE alerts SET status = 'resolved', resolved_at = ?1 WHERE id = ?2 AND status = 'pending'",
            params![resolved_at as i64, &key],
        )?;

        self.conn
            .query_row(
                &format!("SELECT {} FROM alerts WHERE id = ?1", ALERT_COLUMNS),
                params![&key],
                row_to_alert,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("alert {}", id)))
    }

    fn assignment_history(&self, record_id: RecordId) -> Result<Vec<AssignmentLog>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM assignment_log WHERE record_id = ?1 ORDER BY created_at ASC, id ASC",
            LOG_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![id_bytes(record_id.value())], row_to_log)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Insert a pending alert unless the partial unique index already holds one
fn insert_alert(conn: &Connection, alert: &Alert) -> Result<AlertInsert, StoreError> {
    let inserted = conn.execute(
        &format!(
            "INSERT INTO alerts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) ON CONFLICT DO NOTHING",
            ALERT_COLUMNS
        ),
        params![
            id_bytes(alert.id.value()),
            id_bytes(alert.tracked_record_id.value()),
            alert.tier.as_str(),
            alert.status.as_str(),
            alert.target_user_id.as_str(),
            alert.created_at as i64,
            alert.resolved_at.map(|t| t as i64),
        ],
    )?;

    if inserted == 1 {
        return Ok(AlertInsert::Created(alert.clone()));
    }

    match fetch_pending_alert(conn, alert.tracked_record_id, alert.tier)? {
        Some(existing) => Ok(AlertInsert::AlreadyPending(existing)),
        None => Err(StoreError::Duplicate(format!("alert {}", alert.id))),
    }
}

fn fetch_pending_alert(conn: &Connection, record_id: RecordId, tier: Tier) -> Result<Option<Alert>, rusqlite::Error> {
    conn.query_row(
        &format!(
            "SELECT {} FROM alerts WHERE record_id = ?1 AND tier = ?2 AND status = 'pending'",
            ALERT_COLUMNS
        ),
        params![id_bytes(record_id.value()), tier.as_str()],
        row_to_alert,
    )
    .optional()
}

fn insert_log(conn: &Connection, entry: &AssignmentLog) -> Result<(), StoreError> {
    conn.execute(
        &format!("INSERT INTO assignment_log ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)", LOG_COLUMNS),
        params![
            id_bytes(entry.id.value()),
            id_bytes(entry.tracked_record_id.value()),
            entry.previous_responsible_id.as_ref().map(UserId::as_str),
            entry.new_responsible_id.as_str(),
            entry.reason.as_str(),
            entry.created_at as i64,
        ],
    )?;
    Ok(())
}

fn set_responsible(
    conn: &Connection,
    record_id: RecordId,
    new_responsible_id: &UserId,
    assigned_at: u64,
) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE records SET responsible_id = ?1, responsible_last_action_at = ?2 WHERE id = ?3",
        params![new_responsible_id.as_str(), assigned_at as i64, id_bytes(record_id.value())],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(format!("record {}", record_id)));
    }
    Ok(())
}

fn load_tags(conn: &Connection, record_id: RecordId) -> Result<Vec<Tag>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT code, label, color, active FROM record_tags WHERE record_id = ?1 ORDER BY code",
    )?;
    let tags = stmt
        .query_map(params![id_bytes(record_id.value())], |row| {
            let mut tag = Tag::manual(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            );
            tag.active = row.get(3)?;
            Ok(tag)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

/// Identifiers are stored as 16 big-endian bytes
fn id_bytes(value: u128) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn bytes_to_value(bytes: &[u8]) -> Result<u128, StoreError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("Expected 16 bytes for identifier, got {}", bytes.len()))
    })?;
    Ok(u128::from_be_bytes(arr))
}

fn conversion_error(idx: usize, ty: Type, err: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn read_id(row: &rusqlite::Row<'_>, idx: usize) -> Result<u128, rusqlite::Error> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes_to_value(&bytes).map_err(|e| conversion_error(idx, Type::Blob, e))
}

fn read_tier(row: &rusqlite::Row<'_>, idx: usize) -> Result<Tier, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    Tier::parse(&raw).ok_or_else(|| {
        conversion_error(idx, Type::Text, StoreError::InvalidData(format!("Unknown tier: {}", raw)))
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<TrackedRecord, rusqlite::Error> {
    let kind_raw: String = row.get(1)?;
    let kind = RecordKind::parse(&kind_raw).ok_or_else(|| {
        conversion_error(1, Type::Text, StoreError::InvalidData(format!("Unknown record kind: {}", kind_raw)))
    })?;
    let last_movement_at: Option<i64> = row.get(3)?;
    let responsible_id: Option<String> = row.get(4)?;
    let responsible_last_action_at: Option<i64> = row.get(5)?;

    Ok(TrackedRecord {
        id: RecordId::from_value(read_id(row, 0)?),
        kind,
        status: row.get(2)?,
        last_movement_at: last_movement_at.map(|t| t as u64),
        responsible_id: responsible_id.map(UserId::from),
        responsible_last_action_at: responsible_last_action_at.map(|t| t as u64),
        documents_pending: row.get(6)?,
        tags: Vec::new(),
    })
}

fn row_to_alert(row: &rusqlite::Row<'_>) -> Result<Alert, rusqlite::Error> {
    let status_raw: String = row.get(3)?;
    let status = AlertStatus::parse(&status_raw).ok_or_else(|| {
        conversion_error(3, Type::Text, StoreError::InvalidData(format!("Unknown alert status: {}", status_raw)))
    })?;
    let resolved_at: Option<i64> = row.get(6)?;

    Ok(Alert {
        id: AlertId::from_value(read_id(row, 0)?),
        tracked_record_id: RecordId::from_value(read_id(row, 1)?),
        tier: read_tier(row, 2)?,
        status,
        target_user_id: UserId::from(row.get::<_, String>(4)?),
        created_at: row.get::<_, i64>(5)? as u64,
        resolved_at: resolved_at.map(|t| t as u64),
    })
}

fn row_to_log(row: &rusqlite::Row<'_>) -> Result<AssignmentLog, rusqlite::Error> {
    let reason_raw: String = row.get(4)?;
    let reason = AssignmentReason::parse(&reason_raw).ok_or_else(|| {
        conversion_error(4, Type::Text, StoreError::InvalidData(format!("Unknown reason: {}", reason_raw)))
    })?;
    let previous: Option<String> = row.get(2)?;

    Ok(AssignmentLog {
        id: AssignmentId::from_value(read_id(row, 0)?),
        tracked_record_id: RecordId::from_value(read_id(row, 1)?),
        previous_responsible_id: previous.map(UserId::from),
        new_responsible_id: UserId::from(row.get::<_, String>(3)?),
        reason,
        created_at: row.get::<_, i64>(5)? as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_bytes_roundtrip() {
        let id = RecordId::new();
        let bytes = id_bytes(id.value());
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes_to_value(&bytes).unwrap(), id.value());
    }

    #[test]
    fn test_bad_id_length() {
        assert!(matches!(bytes_to_value(&[1, 2, 3]), Err(StoreError::InvalidData(_))));
    }
}
