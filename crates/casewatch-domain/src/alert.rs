//! Alerts and assignment history

use crate::{AlertId, AssignmentId, RecordId, Tier, UserId};

/// Lifecycle of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertStatus {
    /// Awaiting acknowledgement
    Pending,
    /// Explicitly acknowledged by a user
    Resolved,
}

impl AlertStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Resolved => "resolved",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AlertStatus::Pending),
            "resolved" => Some(AlertStatus::Resolved),
            _ => None,
        }
    }
}

/// Durable escalation notice
///
/// At most one pending alert exists per `(tracked_record_id, tier)`. Alerts
/// are never deleted; they only move from pending to resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Unique identifier
    pub id: AlertId,

    /// Record that escalated
    pub tracked_record_id: RecordId,

    /// Tier that was crossed
    pub tier: Tier,

    /// Creation time (Unix seconds)
    pub created_at: u64,

    /// Pending or resolved
    pub status: AlertStatus,

    /// Staff member the alert is addressed to
    pub target_user_id: UserId,

    /// Resolution time, once resolved
    pub resolved_at: Option<u64>,
}

impl Alert {
    /// Create a new pending alert
    pub fn pending(tracked_record_id: RecordId, tier: Tier, target_user_id: UserId, created_at: u64) -> Self {
        Self {
            id: AlertId::new(),
            tracked_record_id,
            tier,
            created_at,
            status: AlertStatus::Pending,
            target_user_id,
            resolved_at: None,
        }
    }

    /// Whether the alert still awaits acknowledgement
    pub fn is_pending(&self) -> bool {
        self.status == AlertStatus::Pending
    }
}

/// Why responsibility changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentReason {
    /// Record had no responsible owner when it escalated
    Unassigned,
    /// Owner produced no activity for the whole critical window
    UnresponsiveOwner,
}

impl AssignmentReason {
    /// Get the reason as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentReason::Unassigned => "unassigned",
            AssignmentReason::UnresponsiveOwner => "unresponsive_owner",
        }
    }

    /// Parse a reason from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unassigned" => Some(AssignmentReason::Unassigned),
            "unresponsive_owner" => Some(AssignmentReason::UnresponsiveOwner),
            _ => None,
        }
    }
}

/// Append-only record of a responsibility change caused by escalation
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentLog {
    /// Unique identifier
    pub id: AssignmentId,

    /// Record whose owner changed
    pub tracked_record_id: RecordId,

    /// Owner before the change
    pub previous_responsible_id: Option<UserId>,

    /// Owner after the change
    pub new_responsible_id: UserId,

    /// Why the change happened
    pub reason: AssignmentReason,

    /// When the change happened (Unix seconds)
    pub created_at: u64,
}

impl AssignmentLog {
    /// Create a log entry
    pub fn new(
        tracked_record_id: RecordId,
        previous_responsible_id: Option<UserId>,
        new_responsible_id: UserId,
        reason: AssignmentReason,
        created_at: u64,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            tracked_record_id,
            previous_responsible_id,
            new_responsible_id,
            reason,
            created_at,
        }
    }
}
