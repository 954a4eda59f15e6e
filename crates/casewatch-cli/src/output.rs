//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use casewatch_domain::{Alert, AssignmentLog, RecordId, Tag, Tier, TrackedRecord};
use casewatch_escalator::{Assessment, EscalationOutcome, NoActionReason, RecordEvaluation, SweepReport};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// A record together with its current tier, if it is still aging.
pub type RecordRow = (TrackedRecord, Option<Assessment>);

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a list of records.
    pub fn format_records(&self, rows: &[RecordRow]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|(record, assessment)| record_json(record, assessment.as_ref()))
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => self.format_records_table(rows),
            OutputFormat::Quiet => Ok(rows
                .iter()
                .map(|(record, _)| record.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_records_table(&self, rows: &[RecordRow]) -> Result<String> {
        if rows.is_empty() {
            return Ok(self.colorize("No open records.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Kind", "Status", "Days", "Tier", "Responsible", "Tags"]);

        for (record, assessment) in rows {
            let (days, tier, tags) = match assessment {
                Some(a) => (a.elapsed_days.to_string(), self.tier(a.tier), tag_codes(&a.tags)),
                None => ("-".to_string(), "-".to_string(), tag_codes(&record.tags)),
            };
            builder.push_record([
                record.id.to_string(),
                record.kind.to_string(),
                record.status.clone(),
                days,
                tier,
                owner(record),
                tags,
            ]);
        }

        Ok(self.render(builder))
    }

    /// Format the result of a single-record evaluation.
    pub fn format_evaluation(&self, evaluation: &RecordEvaluation) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut json = record_json(&evaluation.record, evaluation.assessment.as_ref());
                json["outcome"] = outcome_json(&evaluation.outcome);
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(match &evaluation.outcome {
                EscalationOutcome::Escalated(escalation) => escalation.alert.id.to_string(),
                _ => String::new(),
            }),
            OutputFormat::Table => {
                let record = &evaluation.record;
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["ID".to_string(), record.id.to_string()]);
                builder.push_record(["Kind".to_string(), record.kind.to_string()]);
                builder.push_record(["Status".to_string(), record.status.clone()]);
                builder.push_record(["Responsible".to_string(), owner(record)]);
                if let Some(assessment) = &evaluation.assessment {
                    builder.push_record(["Days stalled".to_string(), assessment.elapsed_days.to_string()]);
                    builder.push_record(["Tier".to_string(), self.tier(assessment.tier)]);
                }
                builder.push_record(["Tags".to_string(), tag_labels(evaluation.tags())]);
                builder.push_record(["Outcome".to_string(), describe_outcome(&evaluation.outcome)]);
                Ok(self.render(builder))
            }
        }
    }

    /// Format alerts.
    pub fn format_alerts(&self, alerts: &[Alert]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = alerts.iter().map(alert_json).collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(alerts
                .iter()
                .map(|a| a.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if alerts.is_empty() {
                    return Ok(self.colorize("No alerts found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Record", "Tier", "Target", "Status", "Created", "Resolved"]);
                for alert in alerts {
                    builder.push_record([
                        alert.id.to_string(),
                        alert.tracked_record_id.to_string(),
                        self.tier(alert.tier),
                        alert.target_user_id.to_string(),
                        alert.status.as_str().to_string(),
                        alert.created_at.to_string(),
                        alert.resolved_at.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format the assignment history of a record.
    pub fn format_history(&self, record_id: RecordId, entries: &[AssignmentLog]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "id": e.id.to_string(),
                            "tracked_record_id": e.tracked_record_id.to_string(),
                            "previous_responsible_id": e.previous_responsible_id.as_ref().map(|u| u.as_str()),
                            "new_responsible_id": e.new_responsible_id.as_str(),
                            "reason": e.reason.as_str(),
                            "created_at": e.created_at
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(entries
                .iter()
                .map(|e| e.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if entries.is_empty() {
                    return Ok(self.colorize(&format!("No reassignments for {}.", record_id), "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["When", "From", "To", "Reason"]);
                for entry in entries {
                    builder.push_record([
                        entry.created_at.to_string(),
                        entry
                            .previous_responsible_id
                            .as_ref()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        entry.new_responsible_id.to_string(),
                        entry.reason.as_str().to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a sweep report.
    pub fn format_report(&self, report: &SweepReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let by_tier: serde_json::Map<String, serde_json::Value> = Tier::ALL
                    .iter()
                    .filter_map(|tier| {
                        report
                            .alerts_by_tier
                            .get(tier)
                            .map(|count| (tier.as_str().to_string(), serde_json::json!(count)))
                    })
                    .collect();
                let json = serde_json::json!({
                    "processed": report.processed,
                    "succeeded": report.succeeded,
                    "failed": report.failed,
                    "skipped_invalid": report.skipped_invalid,
                    "alerts_created": report.alerts_created,
                    "duplicates_suppressed": report.duplicates_suppressed,
                    "reassignments": report.reassignments,
                    "notification_failures": report.notification_failures,
                    "dry_run_escalations": report.dry_run_escalations,
                    "alerts_by_tier": by_tier,
                    "aborted": report.aborted,
                    "partial": report.is_partial(),
                    "runtime_ms": report.runtime_ms
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(report.alerts_created.to_string()),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                if report.is_partial() {
                    lines.push(self.warning(&report.summary()));
                    if report.failed > 0 {
                        lines.push(self.warning(&format!(
                            "{} record(s) not escalated, re-run to retry",
                            report.failed
                        )));
                    }
                    if report.aborted {
                        lines.push(self.warning("Sweep stopped early; remaining records are checked on the next run"));
                    }
                } else {
                    lines.push(self.success(&report.summary()));
                }
                if report.dry_run_escalations > 0 {
                    lines.push(self.info(&format!(
                        "Dry run: {} escalation(s) not written",
                        report.dry_run_escalations
                    )));
                }
                if report.notification_failures > 0 {
                    lines.push(self.warning(&format!(
                        "{} alert(s) could not be delivered",
                        report.notification_failures
                    )));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Format record creation result.
    pub fn record_added(&self, record_id: &RecordId) -> String {
        match self.format {
            OutputFormat::Quiet => record_id.to_string(),
            _ => self.success(&format!("Record added: {}", record_id)),
        }
    }

    fn tier(&self, tier: Tier) -> String {
        let color = match tier {
            Tier::Normal => "green",
            Tier::Attention => "yellow",
            Tier::Warning => "magenta",
            Tier::AtRisk | Tier::Critical => "red",
        };
        self.colorize(tier.as_str(), color)
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// One-line description of an evaluation outcome.
pub fn describe_outcome(outcome: &EscalationOutcome) -> String {
    match outcome {
        EscalationOutcome::NoAction(NoActionReason::Terminal) => "terminal status, not aging".to_string(),
        EscalationOutcome::NoAction(NoActionReason::BelowThreshold) => "below attention threshold".to_string(),
        EscalationOutcome::DuplicateSuppressed { tier, alert_id } => {
            format!("{} alert already pending ({})", tier, alert_id)
        }
        EscalationOutcome::DryRun {
            tier,
            target_user_id,
            reassignment,
        } => match reassignment {
            Some(entry) => format!(
                "would raise {} alert for {} (reassign: {})",
                tier,
                target_user_id,
                entry.reason.as_str()
            ),
            None => format!("would raise {} alert for {}", tier, target_user_id),
        },
        EscalationOutcome::Escalated(escalation) => {
            let mut text = format!(
                "{} alert raised for {}",
                escalation.alert.tier, escalation.alert.target_user_id
            );
            if let Some(entry) = &escalation.reassignment {
                text.push_str(&format!(" (reassigned: {})", entry.reason.as_str()));
            }
            if !escalation.notified {
                text.push_str(" [notification failed]");
            }
            text
        }
    }
}

fn owner(record: &TrackedRecord) -> String {
    record
        .responsible_id
        .as_ref()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn tag_codes(tags: &[Tag]) -> String {
    tags.iter().map(|t| t.code.as_str()).collect::<Vec<_>>().join(", ")
}

fn tag_labels(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| format!("{} ({})", t.code, t.label))
        .collect::<Vec<_>>()
        .join(", ")
}

fn tag_json(tag: &Tag) -> serde_json::Value {
    serde_json::json!({
        "code": tag.code,
        "label": tag.label,
        "color": tag.color,
        "generated_automatically": tag.generated_automatically,
        "rule_applied": tag.rule_applied,
        "active": tag.active
    })
}

fn record_json(record: &TrackedRecord, assessment: Option<&Assessment>) -> serde_json::Value {
    let tags: Vec<serde_json::Value> = match assessment {
        Some(a) => a.tags.iter().map(tag_json).collect(),
        None => record.tags.iter().map(tag_json).collect(),
    };
    serde_json::json!({
        "id": record.id.to_string(),
        "kind": record.kind.as_str(),
        "status": record.status,
        "last_movement_at": record.last_movement_at,
        "responsible_id": record.responsible_id.as_ref().map(|u| u.as_str()),
        "responsible_last_action_at": record.responsible_last_action_at,
        "documents_pending": record.documents_pending,
        "elapsed_days": assessment.map(|a| a.elapsed_days),
        "tier": assessment.map(|a| a.tier.as_str()),
        "tags": tags
    })
}

fn alert_json(alert: &Alert) -> serde_json::Value {
    serde_json::json!({
        "id": alert.id.to_string(),
        "tracked_record_id": alert.tracked_record_id.to_string(),
        "tier": alert.tier.as_str(),
        "target_user_id": alert.target_user_id.as_str(),
        "status": alert.status.as_str(),
        "created_at": alert.created_at,
        "resolved_at": alert.resolved_at
    })
}

fn outcome_json(outcome: &EscalationOutcome) -> serde_json::Value {
    match outcome {
        EscalationOutcome::NoAction(reason) => serde_json::json!({
            "action": "none",
            "reason": match reason {
                NoActionReason::Terminal => "terminal",
                NoActionReason::BelowThreshold => "below_threshold",
            }
        }),
        EscalationOutcome::DuplicateSuppressed { tier, alert_id } => serde_json::json!({
            "action": "duplicate_suppressed",
            "tier": tier.as_str(),
            "alert_id": alert_id.to_string()
        }),
        EscalationOutcome::DryRun {
            tier,
            target_user_id,
            reassignment,
        } => serde_json::json!({
            "action": "dry_run",
            "tier": tier.as_str(),
            "target_user_id": target_user_id.as_str(),
            "reassignment": reassignment.as_ref().map(|e| e.reason.as_str())
        }),
        EscalationOutcome::Escalated(escalation) => serde_json::json!({
            "action": "escalated",
            "alert": alert_json(&escalation.alert),
            "reassignment": escalation.reassignment.as_ref().map(|e| e.reason.as_str()),
            "notified": escalation.notified
        }),
    }
}
