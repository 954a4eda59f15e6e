//! End-to-end escalation tests against the SQLite store

use casewatch_domain::traits::{AlertQuery, EscalationStore, Notifier};
use casewatch_domain::{
    ActivityEvent, Alert, AlertStatus, AssignmentReason, RecordKind, Tag, Tier, TrackedRecord, UserId,
    DOC_PENDING_CODE, SECONDS_PER_DAY,
};
use casewatch_escalator::{
    EscalationError, EscalationOutcome, Escalator, EscalatorConfig, FixedOwner, NoActionReason, NoopNotifier,
    RoundRobinOwners, SweepControl,
};
use casewatch_store::SqliteStore;

const DAY: u64 = SECONDS_PER_DAY;
const NOW: u64 = 20_000 * DAY;

fn store() -> SqliteStore {
    SqliteStore::new(":memory:").unwrap()
}

fn escalator() -> Escalator {
    Escalator::new(EscalatorConfig::default())
        .unwrap()
        .with_owner_resolver(FixedOwner(UserId::from("coord")))
        .with_notifier(NoopNotifier)
}

fn insert(store: &mut SqliteStore, record: TrackedRecord) -> TrackedRecord {
    store.insert_record(&record).unwrap();
    record
}

fn pending_alerts(store: &SqliteStore, record: &TrackedRecord) -> Vec<Alert> {
    store
        .list_alerts(&AlertQuery {
            record_id: Some(record.id),
            status: Some(AlertStatus::Pending),
            ..Default::default()
        })
        .unwrap()
}

#[test]
fn test_boundary_days() {
    let escalator = escalator();
    let cases = [
        (14, Tier::Normal),
        (15, Tier::Attention),
        (29, Tier::Attention),
        (30, Tier::Warning),
        (44, Tier::Warning),
        (45, Tier::AtRisk),
        (59, Tier::AtRisk),
        (60, Tier::Critical),
        (400, Tier::Critical),
    ];

    for (days, expected) in cases {
        let record = TrackedRecord::new(RecordKind::Protocol, "open", NOW - days * DAY);
        let assessment = escalator.assess(&record, NOW).unwrap().unwrap();
        assert_eq!(assessment.tier, expected, "{} days", days);
    }
}

#[test]
fn test_scenario_attention_alert_and_tag() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "in_analysis", NOW - 16 * DAY)
            .with_responsible("ana", Some(NOW - 16 * DAY)),
    );
    let mut escalator = escalator();

    let evaluation = escalator.evaluate_one(&mut store, record.id, NOW).unwrap();
    let assessment = evaluation.assessment.clone().unwrap();
    assert_eq!(assessment.elapsed_days, 16);
    assert_eq!(assessment.tier, Tier::Attention);

    let aging: Vec<&Tag> = evaluation.tags().iter().filter(|t| t.generated_automatically).collect();
    assert_eq!(aging.len(), 1);
    assert_eq!(aging[0].code, "ATENCAO_15");
    assert_eq!(aging[0].label, "Parado há 16 dias");

    let pending = pending_alerts(&store, &record);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].tier, Tier::Attention);
    assert_eq!(pending[0].target_user_id, UserId::from("ana"));
}

#[test]
fn test_scenario_critical_reassigns_and_keeps_earlier_alerts() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "in_analysis", NOW - 66 * DAY)
            .with_responsible("ana", Some(NOW - 66 * DAY)),
    );
    let attention = store
        .create_alert(record.id, Tier::Attention, &UserId::from("ana"), NOW - 51 * DAY)
        .unwrap();
    let mut escalator = escalator();

    let outcome = escalator.evaluate_and_escalate(&mut store, &record, NOW).unwrap();
    let EscalationOutcome::Escalated(escalation) = outcome else {
        panic!("Expected escalation, got {:?}", outcome);
    };
    assert_eq!(escalation.alert.tier, Tier::Critical);
    assert_eq!(escalation.alert.target_user_id, UserId::from("coord"));

    // Earlier alert is untouched
    let pending = pending_alerts(&store, &record);
    assert_eq!(pending.len(), 2);
    let earlier = pending.iter().find(|a| a.tier == Tier::Attention).unwrap();
    match attention {
        casewatch_domain::traits::AlertInsert::Created(alert) => assert_eq!(earlier, &alert),
        other => panic!("Expected created alert, got {:?}", other),
    }

    let history = store.assignment_history(record.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_responsible_id, Some(UserId::from("ana")));
    assert_eq!(history[0].new_responsible_id, UserId::from("coord"));
    assert_eq!(history[0].reason, AssignmentReason::UnresponsiveOwner);

    let stored = store.get_record(record.id).unwrap().unwrap();
    assert_eq!(stored.responsible_id, Some(UserId::from("coord")));
    assert_eq!(stored.responsible_last_action_at, Some(NOW));
}

#[test]
fn test_scenario_same_tier_is_not_realerted() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::HospitalRecordRequest, "requested", NOW - 31 * DAY)
            .with_responsible("bruno", None),
    );
    let mut escalator = escalator();

    let first = escalator.evaluate_and_escalate(&mut store, &record, NOW).unwrap();
    assert!(matches!(first, EscalationOutcome::Escalated(_)));

    // Two days later the record is still in the warning tier
    let second = escalator
        .evaluate_and_escalate(&mut store, &record, NOW + 2 * DAY)
        .unwrap();
    assert!(matches!(
        second,
        EscalationOutcome::DuplicateSuppressed {
            tier: Tier::Warning,
            ..
        }
    ));
    assert_eq!(pending_alerts(&store, &record).len(), 1);
}

#[test]
fn test_sweeps_are_idempotent() {
    let mut store = store();
    for days in [3, 16, 31, 47, 61] {
        insert(
            &mut store,
            TrackedRecord::new(RecordKind::Protocol, "open", NOW - days * DAY).with_responsible("ana", Some(NOW)),
        );
    }
    let mut escalator = escalator();

    let first = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    let second = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();

    assert_eq!(first.alerts_created, 4);
    assert_eq!(second.alerts_created, 0);
    assert_eq!(second.duplicates_suppressed, 4);
    assert_eq!(store.list_alerts(&AlertQuery::default()).unwrap().len(), 4);
}

#[test]
fn test_future_activity_is_refused() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 70 * DAY).with_responsible("ana", None),
    );
    let mut escalator = escalator();

    // Milliseconds where seconds are expected
    let event = ActivityEvent {
        record_id: record.id,
        occurred_at: NOW * 1000,
        actor: Some(UserId::from("ana")),
    };
    let result = escalator.record_activity(&mut store, &event, NOW);
    assert!(matches!(result, Err(EscalationError::InvalidInput(_))));

    let stored = store.get_record(record.id).unwrap().unwrap();
    assert_eq!(stored.last_movement_at, Some(NOW - 70 * DAY));

    let report = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    assert_eq!(report.skipped_invalid, 0);
    assert_eq!(report.alerts_created, 1);
    let pending = pending_alerts(&store, &record);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].tier, Tier::Critical);
}

#[test]
fn test_activity_at_now_is_accepted() {
    let mut store = store();
    let record = insert(&mut store, TrackedRecord::new(RecordKind::Protocol, "open", NOW - 20 * DAY));
    let escalator = escalator();

    let event = ActivityEvent {
        record_id: record.id,
        occurred_at: NOW,
        actor: None,
    };
    escalator.record_activity(&mut store, &event, NOW).unwrap();
    assert_eq!(store.get_record(record.id).unwrap().unwrap().last_movement_at, Some(NOW));
}

#[test]
fn test_activity_resets_aging() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 40 * DAY).with_responsible("ana", None),
    );
    let mut escalator = escalator();
    escalator.evaluate_one(&mut store, record.id, NOW).unwrap();

    store
        .record_activity(record.id, NOW, Some(&UserId::from("ana")))
        .unwrap();

    let evaluation = escalator.evaluate_one(&mut store, record.id, NOW).unwrap();
    assert_eq!(evaluation.outcome, EscalationOutcome::NoAction(NoActionReason::BelowThreshold));
    let assessment = evaluation.assessment.unwrap();
    assert_eq!(assessment.tier, Tier::Normal);
    assert!(assessment.tags.iter().all(|t| !t.generated_automatically));
    assert_eq!(evaluation.record.responsible_last_action_at, Some(NOW));
}

#[test]
fn test_terminal_records_are_excluded() {
    let mut store = store();
    let archived = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "Archived", NOW - 200 * DAY),
    );
    let delivered = insert(
        &mut store,
        TrackedRecord::new(RecordKind::HospitalRecordRequest, "delivered", NOW - 200 * DAY),
    );
    // Terminal for protocols only
    let odd = insert(
        &mut store,
        TrackedRecord::new(RecordKind::HospitalRecordRequest, "paid", NOW - 20 * DAY).with_responsible("ana", None),
    );
    let mut escalator = escalator();

    let report = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.alerts_created, 1);
    assert!(pending_alerts(&store, &archived).is_empty());
    assert!(pending_alerts(&store, &delivered).is_empty());
    assert_eq!(pending_alerts(&store, &odd).len(), 1);

    let evaluation = escalator.evaluate_one(&mut store, archived.id, NOW).unwrap();
    assert_eq!(evaluation.outcome, EscalationOutcome::NoAction(NoActionReason::Terminal));
    assert!(evaluation.assessment.is_none());
}

#[test]
fn test_record_closed_between_sweeps_stops_aging() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 20 * DAY).with_responsible("ana", None),
    );
    let mut escalator = escalator();
    escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();

    store.set_status(record.id, "paid").unwrap();
    let report = escalator
        .run_sweep(&mut store, NOW + 60 * DAY, &SweepControl::new())
        .unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(store.list_alerts(&AlertQuery::default()).unwrap().len(), 1);
}

#[test]
fn test_resolved_alert_is_not_resurrected() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 20 * DAY).with_responsible("ana", None),
    );
    let mut escalator = escalator();

    let EscalationOutcome::Escalated(first) = escalator.evaluate_and_escalate(&mut store, &record, NOW).unwrap() else {
        panic!("Expected escalation");
    };
    let resolved = store.resolve_alert(first.alert.id, NOW + DAY).unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);

    // Still stalled in the same tier: a fresh alert, the old one stays resolved
    let EscalationOutcome::Escalated(second) = escalator
        .evaluate_and_escalate(&mut store, &record, NOW + 2 * DAY)
        .unwrap()
    else {
        panic!("Expected a fresh escalation");
    };
    assert_ne!(second.alert.id, first.alert.id);

    let all = store
        .list_alerts(&AlertQuery {
            record_id: Some(record.id),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(all.len(), 2);
    let old = all.iter().find(|a| a.id == first.alert.id).unwrap();
    assert_eq!(old.status, AlertStatus::Resolved);
    assert_eq!(old.resolved_at, Some(NOW + DAY));
}

#[test]
fn test_unassigned_record_is_assigned_with_audit_entry() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::HospitalRecordRequest, "requested", NOW - 46 * DAY),
    );
    let mut escalator = escalator().with_owner_resolver(RoundRobinOwners::new(["carla", "davi"]));

    let evaluation = escalator.evaluate_one(&mut store, record.id, NOW).unwrap();
    assert_eq!(evaluation.record.responsible_id, Some(UserId::from("carla")));

    let history = store.assignment_history(record.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_responsible_id, None);
    assert_eq!(history[0].reason, AssignmentReason::Unassigned);

    let pending = pending_alerts(&store, &record);
    assert_eq!(pending[0].tier, Tier::AtRisk);
    assert_eq!(pending[0].target_user_id, UserId::from("carla"));
}

#[test]
fn test_sweep_isolates_failing_records() {
    let mut store = store();
    let owned = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 20 * DAY).with_responsible("ana", None),
    );
    let unowned = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 20 * DAY),
    );
    // No owner pool: unassigned records cannot be escalated
    let mut escalator = Escalator::new(EscalatorConfig::default())
        .unwrap()
        .with_notifier(NoopNotifier);

    let report = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert!(report.is_partial());
    assert!(report.summary().contains("partial completion"));
    assert_eq!(pending_alerts(&store, &owned).len(), 1);
    assert!(pending_alerts(&store, &unowned).is_empty());

    // Fixed on the next sweep once an owner is available
    let mut escalator = escalator.with_owner_resolver(FixedOwner(UserId::from("coord")));
    let retry = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    assert!(!retry.is_partial());
    assert_eq!(pending_alerts(&store, &unowned).len(), 1);
}

#[test]
fn test_dry_run_leaves_store_untouched() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 70 * DAY),
    );
    let config = EscalatorConfig {
        dry_run: true,
        ..Default::default()
    };
    let mut escalator = Escalator::new(config)
        .unwrap()
        .with_owner_resolver(FixedOwner(UserId::from("coord")));

    let report = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    assert_eq!(report.dry_run_escalations, 1);
    assert_eq!(report.alerts_created, 0);
    assert!(store.list_alerts(&AlertQuery::default()).unwrap().is_empty());
    assert!(store.assignment_history(record.id).unwrap().is_empty());
    assert_eq!(store.get_record(record.id).unwrap().unwrap().responsible_id, None);
}

struct RejectingNotifier;

impl Notifier for RejectingNotifier {
    fn notify(&self, _alert: &Alert) -> Result<(), String> {
        Err("mailbox unavailable".to_string())
    }
}

#[test]
fn test_notification_failure_keeps_alert() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 16 * DAY).with_responsible("ana", None),
    );
    let mut escalator = escalator().with_notifier(RejectingNotifier);

    let report = escalator.run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    assert_eq!(report.alerts_created, 1);
    assert_eq!(report.notification_failures, 1);
    assert!(!report.is_partial());
    assert_eq!(pending_alerts(&store, &record).len(), 1);
}

#[test]
fn test_stopped_sweep_reports_partial_completion() {
    let mut store = store();
    insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW - 16 * DAY).with_responsible("ana", None),
    );
    let control = SweepControl::new();
    control.stop();

    let report = escalator().run_sweep(&mut store, NOW, &control).unwrap();
    assert!(report.aborted);
    assert!(report.is_partial());
    assert!(store.list_alerts(&AlertQuery::default()).unwrap().is_empty());
}

#[test]
fn test_documents_pending_tag() {
    let mut store = store();
    let record = insert(
        &mut store,
        TrackedRecord::new(RecordKind::HospitalRecordRequest, "requested", NOW - 2 * DAY)
            .with_responsible("ana", None)
            .with_documents_pending(true),
    );
    store
        .upsert_tag(record.id, &Tag::manual("URGENTE", "Urgente", "#ef4444"))
        .unwrap();

    let evaluation = escalator().evaluate_one(&mut store, record.id, NOW).unwrap();
    let codes: Vec<&str> = evaluation.tags().iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes, vec!["URGENTE", DOC_PENDING_CODE]);
    assert_eq!(evaluation.outcome, EscalationOutcome::NoAction(NoActionReason::BelowThreshold));
}

#[test]
fn test_invalid_record_is_skipped() {
    let mut store = store();
    // Movement recorded in the future relative to the sweep
    insert(
        &mut store,
        TrackedRecord::new(RecordKind::Protocol, "open", NOW + DAY),
    );

    let report = escalator().run_sweep(&mut store, NOW, &SweepControl::new()).unwrap();
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.failed, 0);
}
