//! Casewatch Domain Layer
//!
//! Core business rules for aging and escalation of tracked case records.
//! Apart from `uuid` for identifiers this crate has no external dependencies;
//! persistence, owner resolution and notification are reached through the
//! traits in [`traits`].
//!
//! ## Key Concepts
//!
//! - **TrackedRecord**: any entity that ages while nobody moves it (protocols,
//!   hospital record requests)
//! - **Tier**: discrete escalation level derived from days without movement
//! - **Tag**: display label, either manual or generated from the tier
//! - **Alert**: durable escalation notice tied to a record and a tier
//! - **AssignmentLog**: append-only history of responsibility changes
//!
//! ## Example
//!
//! ```
//! use casewatch_domain::{generate_tags, AuxiliaryFlags, Tier, TierThresholds};
//!
//! let thresholds = TierThresholds::default();
//! let tier = thresholds.classify(16);
//! assert_eq!(tier, Tier::Attention);
//!
//! let tags = generate_tags(16, tier, &AuxiliaryFlags::default(), &thresholds);
//! assert_eq!(tags[0].code, "ATENCAO_15");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alert;
pub mod error;
pub mod ids;
pub mod record;
pub mod tag;
pub mod tier;
pub mod traits;

// Re-exports for convenience
pub use alert::{Alert, AlertStatus, AssignmentLog, AssignmentReason};
pub use error::DomainError;
pub use ids::{AlertId, AssignmentId, RecordId, UserId};
pub use record::{ActivityEvent, RecordKind, StatusPolicy, TrackedRecord};
pub use tag::{generate_tags, merge_tags, AuxiliaryFlags, Tag, DOC_PENDING_CODE};
pub use tier::{classify_tier, elapsed_days, Tier, TierThresholds, SECONDS_PER_DAY};
