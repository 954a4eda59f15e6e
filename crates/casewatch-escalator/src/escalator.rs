//! Core escalation engine: classify, tag, alert and reassign

use crate::collaborators::{RoundRobinOwners, TracingNotifier};
use crate::{EscalationError, EscalationMetrics, EscalatorConfig, SweepReport};
use casewatch_domain::traits::{AlertInsert, EscalationStore, EscalationWrite, Notifier, OwnerResolver};
use casewatch_domain::{
    elapsed_days, generate_tags, merge_tags, ActivityEvent, Alert, AlertId, AssignmentLog,
    AssignmentReason, AuxiliaryFlags, DomainError, RecordId, RecordKind, StatusPolicy, Tag, Tier,
    TierThresholds, TrackedRecord, UserId, SECONDS_PER_DAY,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;

/// Current timestamp in seconds since Unix epoch
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Why an evaluation took no action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoActionReason {
    /// Record is in a terminal status
    Terminal,
    /// Record is in the `Normal` tier
    BelowThreshold,
}

/// A committed escalation
#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    /// Alert that was written
    pub alert: Alert,

    /// Responsibility change written with the alert, if any
    pub reassignment: Option<AssignmentLog>,

    /// Whether the notifier accepted the alert
    pub notified: bool,
}

/// Result of evaluating one record
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationOutcome {
    /// Nothing to do
    NoAction(NoActionReason),

    /// A pending alert for this tier already exists
    DuplicateSuppressed {
        /// Current tier
        tier: Tier,
        /// Existing pending alert
        alert_id: AlertId,
    },

    /// Dry-run mode: this escalation would have been written
    DryRun {
        /// Tier that would be alerted
        tier: Tier,
        /// Alert target
        target_user_id: UserId,
        /// Reassignment that would be logged
        reassignment: Option<AssignmentLog>,
    },

    /// A new alert was committed
    Escalated(Escalation),
}

/// Tier and tags of a record at an instant
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Whole days since the last movement
    pub elapsed_days: u64,
    /// Escalation tier
    pub tier: Tier,
    /// Manual tags merged with generated ones
    pub tags: Vec<Tag>,
}

/// Result of a single-record recomputation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEvaluation {
    /// Record as stored after the evaluation
    pub record: TrackedRecord,

    /// Tier and tags; `None` for terminal records
    pub assessment: Option<Assessment>,

    /// What the evaluation did
    pub outcome: EscalationOutcome,
}

impl RecordEvaluation {
    /// Tags to display: the assessment's, or the manual tags of a terminal record
    pub fn tags(&self) -> &[Tag] {
        match &self.assessment {
            Some(assessment) => &assessment.tags,
            None => &self.record.tags,
        }
    }
}

/// Stop signal for sweeps and the background worker
///
/// Sweeps check it between records; a stopped sweep reports partial completion.
#[derive(Debug, Clone, Default)]
pub struct SweepControl {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl SweepControl {
    /// Create a control in the running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once a stop is requested
    pub async fn stopped(&self) {
        if self.is_stopped() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Escalation engine
///
/// Thresholds and terminal statuses are resolved from the configuration once,
/// at construction.
///
/// # Examples
///
/// ```no_run
/// use casewatch_escalator::{Escalator, EscalatorConfig};
/// use casewatch_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteStore::new("casewatch.db")?;
/// let mut escalator = Escalator::new(EscalatorConfig::default())?;
///
/// let report = escalator.sweep(&mut store)?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct Escalator {
    config: EscalatorConfig,
    policy: StatusPolicy,
    protocol_thresholds: TierThresholds,
    hospital_record_request_thresholds: TierThresholds,
    owners: Box<dyn OwnerResolver + Send>,
    notifier: Box<dyn Notifier + Send>,
    metrics: EscalationMetrics,
}

impl Escalator {
    /// Create an escalator; owners come from `config.default_owners` and
    /// alerts are delivered to the log
    pub fn new(config: EscalatorConfig) -> Result<Self, EscalationError> {
        config.validate()?;
        Ok(Self {
            policy: config.status_policy(),
            protocol_thresholds: config.thresholds(RecordKind::Protocol),
            hospital_record_request_thresholds: config.thresholds(RecordKind::HospitalRecordRequest),
            owners: Box::new(RoundRobinOwners::new(config.default_owners.clone())),
            notifier: Box::new(TracingNotifier),
            metrics: EscalationMetrics::new(),
            config,
        })
    }

    /// Replace the owner resolution policy
    pub fn with_owner_resolver<R: OwnerResolver + Send + 'static>(mut self, owners: R) -> Self {
        self.owners = Box::new(owners);
        self
    }

    /// Replace the notification channel
    pub fn with_notifier<N: Notifier + Send + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &EscalatorConfig {
        &self.config
    }

    /// Terminal statuses in force
    pub fn status_policy(&self) -> &StatusPolicy {
        &self.policy
    }

    /// Get a reference to the accumulated metrics
    pub fn metrics(&self) -> &EscalationMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Tier thresholds for a record kind
    pub fn thresholds(&self, kind: RecordKind) -> &TierThresholds {
        match kind {
            RecordKind::Protocol => &self.protocol_thresholds,
            RecordKind::HospitalRecordRequest => &self.hospital_record_request_thresholds,
        }
    }

    /// Classify and tag a record without side effects
    ///
    /// Returns `None` for terminal records, which are never classified.
    pub fn assess(&self, record: &TrackedRecord, now: u64) -> Result<Option<Assessment>, EscalationError> {
        if self.policy.is_record_terminal(record) {
            return Ok(None);
        }

        let last_movement_at = record.last_movement_at.ok_or(DomainError::MissingLastMovement)?;
        let days = elapsed_days(now, last_movement_at)?;
        let thresholds = self.thresholds(record.kind);
        let tier = thresholds.classify(days);

        let flags = AuxiliaryFlags {
            documents_pending: record.documents_pending,
        };
        let generated = generate_tags(days, tier, &flags, thresholds);

        Ok(Some(Assessment {
            elapsed_days: days,
            tier,
            tags: merge_tags(&record.tags, &generated),
        }))
    }

    /// Evaluate one record and escalate it if it crossed into a new tier
    ///
    /// Safe to repeat: a pending alert for the same tier suppresses a new one.
    /// The alert and any reassignment are committed together; on failure
    /// nothing is written and the next sweep retries.
    pub fn evaluate_and_escalate<S>(
        &mut self,
        store: &mut S,
        record: &TrackedRecord,
        now: u64,
    ) -> Result<EscalationOutcome, EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        let assessment = match self.assess(record, now)? {
            Some(assessment) => assessment,
            None => {
                tracing::debug!(record_id = %record.id, status = %record.status, "terminal record skipped");
                return Ok(EscalationOutcome::NoAction(NoActionReason::Terminal));
            }
        };
        let tier = assessment.tier;

        if tier == Tier::Normal {
            return Ok(EscalationOutcome::NoAction(NoActionReason::BelowThreshold));
        }

        let existing = store
            .get_pending_alert(record.id, tier)
            .map_err(|e| EscalationError::Persistence(e.to_string()))?;
        if let Some(existing) = existing {
            tracing::debug!(record_id = %record.id, %tier, alert_id = %existing.id, "pending alert exists");
            return Ok(EscalationOutcome::DuplicateSuppressed {
                tier,
                alert_id: existing.id,
            });
        }

        let (target, reassignment) = self.plan_target(record, tier, now)?;

        if self.config.dry_run {
            tracing::info!(
                record_id = %record.id,
                %tier,
                target = %target,
                reassign = reassignment.is_some(),
                "DRY RUN: would escalate"
            );
            return Ok(EscalationOutcome::DryRun {
                tier,
                target_user_id: target,
                reassignment,
            });
        }

        let write = EscalationWrite {
            alert: Alert::pending(record.id, tier, target, now),
            reassignment,
        };
        let inserted = store
            .commit_escalation(&write)
            .map_err(|e| EscalationError::Persistence(e.to_string()))?;

        let alert = match inserted {
            AlertInsert::Created(alert) => alert,
            AlertInsert::AlreadyPending(existing) => {
                // Lost a race with a concurrent evaluation of the same record
                tracing::debug!(record_id = %record.id, %tier, alert_id = %existing.id, "concurrent alert exists");
                return Ok(EscalationOutcome::DuplicateSuppressed {
                    tier,
                    alert_id: existing.id,
                });
            }
        };

        if let Some(entry) = &write.reassignment {
            tracing::info!(
                record_id = %record.id,
                previous = ?entry.previous_responsible_id.as_ref().map(UserId::as_str),
                new = %entry.new_responsible_id,
                reason = entry.reason.as_str(),
                "responsibility reassigned"
            );
        }

        let notified = match self.notifier.notify(&alert) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(alert_id = %alert.id, target = %alert.target_user_id, "notification failed: {}", e);
                false
            }
        };

        tracing::info!(
            record_id = %record.id,
            %tier,
            elapsed_days = assessment.elapsed_days,
            alert_id = %alert.id,
            "record escalated"
        );

        Ok(EscalationOutcome::Escalated(Escalation {
            alert,
            reassignment: write.reassignment,
            notified,
        }))
    }

    /// Decide who receives the alert and whether ownership changes
    fn plan_target(
        &self,
        record: &TrackedRecord,
        tier: Tier,
        now: u64,
    ) -> Result<(UserId, Option<AssignmentLog>), EscalationError> {
        match &record.responsible_id {
            None => {
                let owner = self
                    .owners
                    .resolve_default_owner(record)
                    .map_err(EscalationError::OwnerResolution)?;
                let entry = AssignmentLog::new(record.id, None, owner.clone(), AssignmentReason::Unassigned, now);
                Ok((owner, Some(entry)))
            }
            Some(current)
                if tier == Tier::Critical
                    && self.config.reassign_unresponsive_on_critical
                    && self.is_owner_unresponsive(record, now) =>
            {
                match self.owners.resolve_default_owner(record) {
                    Ok(candidate) if candidate != *current => {
                        let entry = AssignmentLog::new(
                            record.id,
                            Some(current.clone()),
                            candidate.clone(),
                            AssignmentReason::UnresponsiveOwner,
                            now,
                        );
                        Ok((candidate, Some(entry)))
                    }
                    Ok(_) => Ok((current.clone(), None)),
                    Err(e) => {
                        tracing::warn!(record_id = %record.id, "keeping unresponsive owner, no replacement: {}", e);
                        Ok((current.clone(), None))
                    }
                }
            }
            Some(current) => Ok((current.clone(), None)),
        }
    }

    /// Owner has not acted on the record for the whole critical window
    fn is_owner_unresponsive(&self, record: &TrackedRecord, now: u64) -> bool {
        let window = self.thresholds(record.kind).critical * SECONDS_PER_DAY;
        match record.responsible_last_action_at {
            None => true,
            Some(at) => now.saturating_sub(at) >= window,
        }
    }

    /// Recompute a single record (e.g. when a detail view opens)
    pub fn evaluate_one<S>(
        &mut self,
        store: &mut S,
        record_id: RecordId,
        now: u64,
    ) -> Result<RecordEvaluation, EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        let record = load_record(store, record_id)?;
        let outcome = self.evaluate_and_escalate(store, &record, now)?;

        // Ownership may have changed
        let record = match &outcome {
            EscalationOutcome::Escalated(Escalation {
                reassignment: Some(_), ..
            }) => load_record(store, record_id)?,
            _ => record,
        };
        let assessment = self.assess(&record, now)?;

        Ok(RecordEvaluation {
            record,
            assessment,
            outcome,
        })
    }

    /// Register activity on a record, resetting its aging clock
    ///
    /// Activity later than `now` is refused: the stored clock only moves
    /// forward, so a future timestamp would stop the record from aging.
    pub fn record_activity<S>(&self, store: &mut S, event: &ActivityEvent, now: u64) -> Result<(), EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        if event.occurred_at > now {
            return Err(DomainError::FutureLastMovement {
                last_movement_at: event.occurred_at,
                now,
            }
            .into());
        }

        store
            .record_activity(event.record_id, event.occurred_at, event.actor.as_ref())
            .map_err(|e| EscalationError::Persistence(e.to_string()))
    }

    /// Sweep every non-terminal record at `now`
    ///
    /// Per-record failures are counted and do not stop the sweep. The stop
    /// flag is honoured between records. Fails only if the records cannot be
    /// listed.
    pub fn run_sweep<S>(
        &mut self,
        store: &mut S,
        now: u64,
        control: &SweepControl,
    ) -> Result<SweepReport, EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        let start = Instant::now();
        let records = store
            .list_non_terminal_records(&self.policy)
            .map_err(|e| EscalationError::Persistence(e.to_string()))?;

        let mut report = SweepReport::new();
        for record in &records {
            if control.is_stopped() {
                tracing::info!(
                    remaining = records.len() - report.processed,
                    "sweep stopped before completion"
                );
                report.aborted = true;
                break;
            }

            match self.evaluate_and_escalate(store, record, now) {
                Ok(outcome) => report.record_outcome(&outcome),
                Err(EscalationError::InvalidInput(reason)) => {
                    tracing::warn!(record_id = %record.id, "record skipped: {}", reason);
                    report.record_invalid();
                }
                Err(e) => {
                    tracing::warn!(record_id = %record.id, "escalation not committed, will retry: {}", e);
                    report.record_failure();
                }
            }
        }

        report.runtime_ms = start.elapsed().as_millis() as u64;
        self.metrics.record_sweep(&report);
        Ok(report)
    }

    /// Sweep every non-terminal record now
    pub fn sweep<S>(&mut self, store: &mut S) -> Result<SweepReport, EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        self.run_sweep(store, current_timestamp(), &SweepControl::new())
    }
}

fn load_record<S>(store: &S, record_id: RecordId) -> Result<TrackedRecord, EscalationError>
where
    S: EscalationStore,
    S::Error: std::fmt::Display,
{
    store
        .get_record(record_id)
        .map_err(|e| EscalationError::Persistence(e.to_string()))?
        .ok_or_else(|| EscalationError::NotFound(record_id.to_string()))
}
