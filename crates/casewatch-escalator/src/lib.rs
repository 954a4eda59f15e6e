//! Casewatch Escalator
//!
//! Aging and escalation engine for tracked records (protocols and hospital
//! record requests).
//!
//! # Overview
//!
//! The escalator is responsible for:
//! - **Tier classification**: whole days since the last movement mapped onto
//!   per-kind thresholds
//! - **Tagging**: aging and auxiliary tags merged with the record's manual tags
//! - **Alerting**: at most one pending alert per record and tier
//! - **Reassignment**: unassigned records, and critical records whose owner
//!   stopped acting on them, get a default owner with an audit trail
//! - **Metrics collection**: per-sweep reports and cumulative counters
//!
//! ## Tiers (default thresholds)
//!
//! | Tier | Days stalled | Aging tag |
//! |------|--------------|-----------|
//! | **Normal** | 0 - 14 | none |
//! | **Attention** | 15 - 29 | `ATENCAO_15` |
//! | **Warning** | 30 - 44 | `ALERTA_30` |
//! | **AtRisk** | 45 - 59 | `RISCO_45` |
//! | **Critical** | 60+ | `CRITICO_60` |
//!
//! # Usage
//!
//! ## One-time Sweep
//!
//! ```no_run
//! use casewatch_escalator::{Escalator, EscalatorConfig};
//! use casewatch_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new("casewatch.db")?;
//! let mut escalator = Escalator::new(EscalatorConfig::default())?;
//!
//! let report = escalator.sweep(&mut store)?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use casewatch_escalator::{EscalatorConfig, EscalatorWorker};
//! use casewatch_store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = SqliteStore::new("casewatch.db")?;
//!     let mut worker = EscalatorWorker::new(EscalatorConfig::default())?;
//!
//!     // Run indefinitely (until Ctrl+C)
//!     worker.run(&mut store).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use casewatch_escalator::EscalatorConfig;
//!
//! // Default: 15 / 30 / 45 / 60 days, hourly sweeps
//! let config = EscalatorConfig::default();
//!
//! // Strict: weekly tiers, sweeps every 15 minutes
//! let config = EscalatorConfig::strict();
//!
//! // Relaxed: monthly tiers, no automatic reassignment
//! let config = EscalatorConfig::relaxed();
//! ```
//!
//! # Configuration
//!
//! The escalator can be configured via TOML:
//!
//! ```toml
//! sweep_interval_minutes = 60
//! dry_run = false
//! reassign_unresponsive_on_critical = true
//! default_owners = ["coordinator"]
//!
//! [protocol]
//! terminal_statuses = ["archived", "paid", "closed"]
//! thresholds = { attention_days = 15, warning_days = 30, at_risk_days = 45, critical_days = 60 }
//!
//! [hospital_record_request]
//! terminal_statuses = ["delivered", "cancelled", "closed"]
//! ```

#![warn(missing_docs)]

mod error;
mod config;
mod metrics;
mod collaborators;
mod escalator;
mod worker;

pub use error::EscalationError;
pub use config::{EscalatorConfig, KindProfile, ThresholdDays};
pub use metrics::{EscalationMetrics, SweepReport};
pub use collaborators::{FixedOwner, NoopNotifier, RoundRobinOwners, TracingNotifier};
pub use escalator::{
    current_timestamp, Assessment, Escalation, EscalationOutcome, Escalator, NoActionReason,
    RecordEvaluation, SweepControl,
};
pub use worker::EscalatorWorker;
