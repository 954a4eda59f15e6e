//! Sweep reports and cumulative metrics

use crate::EscalationOutcome;
use casewatch_domain::Tier;
use std::collections::HashMap;

/// Aggregate result of one sweep
///
/// `processed == succeeded + failed + skipped_invalid`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Records visited
    pub processed: usize,

    /// Records evaluated without error (including no-ops)
    pub succeeded: usize,

    /// Records whose escalation failed and will be retried next sweep
    pub failed: usize,

    /// Records skipped because they could not be evaluated
    pub skipped_invalid: usize,

    /// Alerts written
    pub alerts_created: usize,

    /// Evaluations that found an existing pending alert
    pub duplicates_suppressed: usize,

    /// Responsibility changes written
    pub reassignments: usize,

    /// Alerts committed but not delivered
    pub notification_failures: usize,

    /// Escalations that would have been written in dry-run mode
    pub dry_run_escalations: usize,

    /// Alerts written per tier
    pub alerts_by_tier: HashMap<Tier, usize>,

    /// Sweep stopped before visiting every record
    pub aborted: bool,

    /// Wall-clock duration in milliseconds
    pub runtime_ms: u64,
}

impl SweepReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a successful evaluation
    pub fn record_outcome(&mut self, outcome: &EscalationOutcome) {
        self.processed += 1;
        self.succeeded += 1;
        match outcome {
            EscalationOutcome::NoAction(_) => {}
            EscalationOutcome::DuplicateSuppressed { .. } => self.duplicates_suppressed += 1,
            EscalationOutcome::DryRun { .. } => self.dry_run_escalations += 1,
            EscalationOutcome::Escalated(escalation) => {
                self.alerts_created += 1;
                *self.alerts_by_tier.entry(escalation.alert.tier).or_insert(0) += 1;
                if escalation.reassignment.is_some() {
                    self.reassignments += 1;
                }
                if !escalation.notified {
                    self.notification_failures += 1;
                }
            }
        }
    }

    /// Count a record whose escalation failed
    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    /// Count a record skipped as invalid
    pub fn record_invalid(&mut self) {
        self.processed += 1;
        self.skipped_invalid += 1;
    }

    /// Some records still need a retry, or the sweep was stopped early
    pub fn is_partial(&self) -> bool {
        self.failed > 0 || self.aborted
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        let status = if self.is_partial() {
            "partial completion"
        } else {
            "complete"
        };
        format!(
            "Sweep {}: {} processed, {} succeeded, {} failed, {} invalid; {} alerts, {} reassignments, {} duplicates suppressed",
            status,
            self.processed,
            self.succeeded,
            self.failed,
            self.skipped_invalid,
            self.alerts_created,
            self.reassignments,
            self.duplicates_suppressed
        )
    }
}

/// Metrics accumulated across sweeps
#[derive(Debug, Clone, Default)]
pub struct EscalationMetrics {
    /// Alerts created per tier
    pub alerts_created: HashMap<Tier, usize>,

    /// Total responsibility changes
    pub reassignments: usize,

    /// Total suppressed duplicates
    pub duplicates_suppressed: usize,

    /// Total failed record evaluations
    pub failures: usize,

    /// Total records skipped as invalid
    pub invalid: usize,

    /// Total undelivered notifications
    pub notification_failures: usize,

    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Sweeps that ended in partial completion
    pub partial_sweeps: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl EscalationMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a sweep report into the totals
    pub fn record_sweep(&mut self, report: &SweepReport) {
        for (tier, count) in &report.alerts_by_tier {
            *self.alerts_created.entry(*tier).or_insert(0) += count;
        }
        self.reassignments += report.reassignments;
        self.duplicates_suppressed += report.duplicates_suppressed;
        self.failures += report.failed;
        self.invalid += report.skipped_invalid;
        self.notification_failures += report.notification_failures;
        self.sweep_count += 1;
        if report.is_partial() {
            self.partial_sweeps += 1;
        }
        self.total_runtime_ms += report.runtime_ms;
    }

    /// Get total alerts created across all tiers
    pub fn total_alerts(&self) -> usize {
        self.alerts_created.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Escalation Metrics Summary".to_string(),
            "==========================".to_string(),
            format!("Sweep cycles: {} ({} partial)", self.sweep_count, self.partial_sweeps),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
        ];

        if !self.alerts_created.is_empty() {
            lines.push("Alerts by tier:".to_string());
            for tier in Tier::ALL {
                if let Some(count) = self.alerts_created.get(&tier) {
                    lines.push(format!("  {}: {}", tier, count));
                }
            }
            lines.push(format!("  Total: {}", self.total_alerts()));
            lines.push(String::new());
        }

        lines.push(format!("Reassignments: {}", self.reassignments));
        lines.push(format!("Duplicates suppressed: {}", self.duplicates_suppressed));
        lines.push(format!("Failures: {}", self.failures));
        lines.push(format!("Invalid records: {}", self.invalid));
        lines.push(format!("Notification failures: {}", self.notification_failures));

        lines.join("\n")
    }
}
