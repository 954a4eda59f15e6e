//! Error types for escalation operations

use thiserror::Error;

/// Errors that can occur while evaluating or sweeping records
///
/// A suppressed duplicate alert is not an error; it is reported as
/// [`EscalationOutcome::DuplicateSuppressed`](crate::EscalationOutcome::DuplicateSuppressed).
#[derive(Error, Debug)]
pub enum EscalationError {
    /// Record cannot be evaluated (missing or future last movement)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A store read or write failed; nothing was committed for the record
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// No owner could be resolved for an unassigned record
    #[error("Owner resolution failed: {0}")]
    OwnerResolution(String),

    /// Record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<casewatch_domain::DomainError> for EscalationError {
    fn from(err: casewatch_domain::DomainError) -> Self {
        match err {
            casewatch_domain::DomainError::InvalidThresholds(msg) => EscalationError::Config(msg),
            other => EscalationError::InvalidInput(other.to_string()),
        }
    }
}
