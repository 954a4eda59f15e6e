//! Validation errors raised by domain rules

use std::fmt;

/// Errors produced when a record or configuration violates a domain rule
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Elapsed days below zero (or not a finite number)
    NegativeElapsed(String),

    /// Record has no `last_movement_at` timestamp
    MissingLastMovement,

    /// `last_movement_at` lies after the evaluation instant
    FutureLastMovement {
        /// Recorded last movement (Unix seconds)
        last_movement_at: u64,
        /// Evaluation instant (Unix seconds)
        now: u64,
    },

    /// Threshold table is not strictly increasing
    InvalidThresholds(String),

    /// Identifier could not be parsed
    InvalidId(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NegativeElapsed(value) => {
                write!(f, "elapsed days must be non-negative, got {}", value)
            }
            DomainError::MissingLastMovement => write!(f, "record has no last movement timestamp"),
            DomainError::FutureLastMovement { last_movement_at, now } => write!(
                f,
                "last movement {} is after evaluation time {}",
                last_movement_at, now
            ),
            DomainError::InvalidThresholds(msg) => write!(f, "invalid tier thresholds: {}", msg),
            DomainError::InvalidId(msg) => write!(f, "invalid identifier: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
