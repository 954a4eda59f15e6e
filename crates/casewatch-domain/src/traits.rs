//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the escalation rules and the
//! collaborators around them. Implementations live in other crates.

use crate::{
    Alert, AlertId, AlertStatus, AssignmentLog, RecordId, StatusPolicy, Tier, TrackedRecord, UserId,
};

/// Result of an atomic check-and-create of a pending alert
#[derive(Debug, Clone, PartialEq)]
pub enum AlertInsert {
    /// The alert was written
    Created(Alert),
    /// A pending alert for the same `(record, tier)` already existed; nothing was written
    AlreadyPending(Alert),
}

/// Writes belonging to one escalation, committed all-or-nothing
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationWrite {
    /// Alert to create
    pub alert: Alert,

    /// Reassignment to log and apply to the record, if any
    pub reassignment: Option<AssignmentLog>,
}

/// Query criteria for listing alerts
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    /// Filter by record
    pub record_id: Option<RecordId>,

    /// Filter by status
    pub status: Option<AlertStatus>,

    /// Filter by target user
    pub target_user_id: Option<UserId>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// Persistence for tracked records, alerts and assignment history
///
/// Implemented by the infrastructure layer (casewatch-store).
pub trait EscalationStore {
    /// Error type for store operations
    type Error;

    /// All records whose status is not terminal under `policy`
    fn list_non_terminal_records(&self, policy: &StatusPolicy) -> Result<Vec<TrackedRecord>, Self::Error>;

    /// Get a record by ID
    fn get_record(&self, id: RecordId) -> Result<Option<TrackedRecord>, Self::Error>;

    /// Insert a new record
    fn insert_record(&mut self, record: &TrackedRecord) -> Result<RecordId, Self::Error>;

    /// Record activity on a record, resetting its aging clock
    ///
    /// When `actor` is the responsible owner, their last action time moves too.
    fn record_activity(
        &mut self,
        id: RecordId,
        occurred_at: u64,
        actor: Option<&UserId>,
    ) -> Result<(), Self::Error>;

    /// Pending alert for `(record, tier)`, if any
    fn get_pending_alert(&self, record_id: RecordId, tier: Tier) -> Result<Option<Alert>, Self::Error>;

    /// Atomically create a pending alert unless one exists for `(record, tier)`
    fn create_alert(
        &mut self,
        record_id: RecordId,
        tier: Tier,
        target_user_id: &UserId,
        created_at: u64,
    ) -> Result<AlertInsert, Self::Error>;

    /// Replace the responsible owner; the new owner's activity clock starts at `assigned_at`
    fn update_responsible(
        &mut self,
        record_id: RecordId,
        new_responsible_id: &UserId,
        assigned_at: u64,
    ) -> Result<(), Self::Error>;

    /// Append an assignment log entry
    fn append_assignment_log(&mut self, entry: &AssignmentLog) -> Result<(), Self::Error>;

    /// Commit an alert together with an optional reassignment in one transaction
    ///
    /// Either every write lands or none does. A pending duplicate for the same
    /// `(record, tier)` yields `AlreadyPending` and writes nothing.
    fn commit_escalation(&mut self, write: &EscalationWrite) -> Result<AlertInsert, Self::Error>;

    /// List alerts matching criteria, newest first
    fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>, Self::Error>;

    /// Mark an alert resolved; returns the updated alert
    fn resolve_alert(&mut self, id: AlertId, resolved_at: u64) -> Result<Alert, Self::Error>;

    /// Assignment history of a record, oldest first
    fn assignment_history(&self, record_id: RecordId) -> Result<Vec<AssignmentLog>, Self::Error>;
}

/// Policy choosing a fallback owner for a record (round-robin, role-based, ...)
pub trait OwnerResolver {
    /// Pick the owner a record should be assigned to
    fn resolve_default_owner(&self, record: &TrackedRecord) -> Result<UserId, String>;
}

/// Delivers alerts to their target user (push, email, in-app)
///
/// Delivery is fire-and-forget from the engine's side.
pub trait Notifier {
    /// Deliver an alert
    fn notify(&self, alert: &Alert) -> Result<(), String>;
}
