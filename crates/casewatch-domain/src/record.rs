//! Tracked records and their lifecycle status policy

use crate::{RecordId, Tag, UserId};

/// Kind of tracked record
///
/// Each kind carries its own terminal statuses and tier thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Claim protocol filed with an insurer or court
    Protocol,

    /// Hospital record (BAU) request
    HospitalRecordRequest,
}

impl RecordKind {
    /// All record kinds
    pub const ALL: [RecordKind; 2] = [RecordKind::Protocol, RecordKind::HospitalRecordRequest];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Protocol => "protocol",
            RecordKind::HospitalRecordRequest => "hospital_record_request",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "protocol" => Some(RecordKind::Protocol),
            "hospital_record_request" | "bau" => Some(RecordKind::HospitalRecordRequest),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity subject to aging
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRecord {
    /// Unique identifier
    pub id: RecordId,

    /// Record kind (selects thresholds and terminal statuses)
    pub kind: RecordKind,

    /// Current lifecycle status, free-form per kind
    pub status: String,

    /// Last recorded activity (Unix seconds); the aging clock starts here
    pub last_movement_at: Option<u64>,

    /// Currently assigned staff member
    pub responsible_id: Option<UserId>,

    /// Last activity on this record by the current responsible owner
    pub responsible_last_action_at: Option<u64>,

    /// A required document is still missing
    pub documents_pending: bool,

    /// Manually attached tags
    pub tags: Vec<Tag>,
}

impl TrackedRecord {
    /// Create a record with no owner and no manual tags
    pub fn new(kind: RecordKind, status: impl Into<String>, last_movement_at: u64) -> Self {
        Self {
            id: RecordId::new(),
            kind,
            status: status.into(),
            last_movement_at: Some(last_movement_at),
            responsible_id: None,
            responsible_last_action_at: None,
            documents_pending: false,
            tags: Vec::new(),
        }
    }

    /// Assign a responsible owner
    pub fn with_responsible(mut self, user: impl Into<UserId>, last_action_at: Option<u64>) -> Self {
        self.responsible_id = Some(user.into());
        self.responsible_last_action_at = last_action_at;
        self
    }

    /// Mark the record as missing a required document
    pub fn with_documents_pending(mut self, pending: bool) -> Self {
        self.documents_pending = pending;
        self
    }
}

/// Terminal statuses per record kind
///
/// Terminal records (archived, paid, closed, ...) are excluded from aging.
/// Statuses compare case-insensitively with full Unicode lowercasing, so
/// `CONCLUÍDO` matches `concluído`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPolicy {
    /// Terminal statuses for protocols
    pub protocol: Vec<String>,

    /// Terminal statuses for hospital record requests
    pub hospital_record_request: Vec<String>,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            protocol: vec!["archived".into(), "paid".into(), "closed".into()],
            hospital_record_request: vec!["delivered".into(), "cancelled".into(), "closed".into()],
        }
    }
}

impl StatusPolicy {
    /// Terminal statuses declared for a kind
    pub fn terminal_statuses(&self, kind: RecordKind) -> &[String] {
        match kind {
            RecordKind::Protocol => &self.protocol,
            RecordKind::HospitalRecordRequest => &self.hospital_record_request,
        }
    }

    /// Whether `status` is terminal for `kind`
    pub fn is_terminal(&self, kind: RecordKind, status: &str) -> bool {
        let status = status.trim().to_lowercase();
        self.terminal_statuses(kind)
            .iter()
            .any(|terminal| terminal.trim().to_lowercase() == status)
    }

    /// Whether a record is terminal
    pub fn is_record_terminal(&self, record: &TrackedRecord) -> bool {
        self.is_terminal(record.kind, &record.status)
    }
}

/// Activity recorded against a tracked record
///
/// Delivered by the surrounding application (e.g. a row-change feed); resets
/// the record's aging clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    /// Record that moved
    pub record_id: RecordId,

    /// When the activity happened (Unix seconds)
    pub occurred_at: u64,

    /// Staff member who acted, if known
    pub actor: Option<UserId>,
}
