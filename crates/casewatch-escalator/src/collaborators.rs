//! Owner resolution and notification collaborators

use casewatch_domain::traits::{Notifier, OwnerResolver};
use casewatch_domain::{Alert, TrackedRecord, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands records to a pool of staff members in turn
///
/// Skips the record's current owner when the pool has someone else, so an
/// unresponsive owner is never reassigned to themselves.
#[derive(Debug, Default)]
pub struct RoundRobinOwners {
    pool: Vec<UserId>,
    cursor: AtomicUsize,
}

impl RoundRobinOwners {
    /// Create a resolver over a pool of user ids
    pub fn new<I, U>(pool: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        Self {
            pool: pool.into_iter().map(Into::into).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of owners in the pool
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl OwnerResolver for RoundRobinOwners {
    fn resolve_default_owner(&self, record: &TrackedRecord) -> Result<UserId, String> {
        if self.pool.is_empty() {
            return Err("no default owners configured".to_string());
        }

        for _ in 0..self.pool.len() {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.pool.len();
            let candidate = &self.pool[index];
            if record.responsible_id.as_ref() != Some(candidate) {
                return Ok(candidate.clone());
            }
        }

        // Only the current owner is available
        Ok(self.pool[0].clone())
    }
}

/// Always resolves to the same owner (e.g. the office coordinator)
#[derive(Debug, Clone)]
pub struct FixedOwner(pub UserId);

impl OwnerResolver for FixedOwner {
    fn resolve_default_owner(&self, _record: &TrackedRecord) -> Result<UserId, String> {
        Ok(self.0.clone())
    }
}

/// Emits each alert as a structured log event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), String> {
        tracing::info!(
            alert_id = %alert.id,
            record_id = %alert.tracked_record_id,
            tier = %alert.tier,
            target = %alert.target_user_id,
            "escalation alert raised"
        );
        Ok(())
    }
}

/// Discards alerts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _alert: &Alert) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewatch_domain::RecordKind;

    #[test]
    fn test_round_robin_rotates() {
        let owners = RoundRobinOwners::new(["ana", "bruno", "carla"]);
        let record = TrackedRecord::new(RecordKind::Protocol, "open", 0);

        let picks: Vec<String> = (0..4)
            .map(|_| owners.resolve_default_owner(&record).unwrap().to_string())
            .collect();
        assert_eq!(picks, vec!["ana", "bruno", "carla", "ana"]);
    }

    #[test]
    fn test_round_robin_skips_current_owner() {
        let owners = RoundRobinOwners::new(["ana", "bruno"]);
        let record = TrackedRecord::new(RecordKind::Protocol, "open", 0).with_responsible("ana", None);

        assert_eq!(owners.resolve_default_owner(&record).unwrap(), UserId::from("bruno"));
        assert_eq!(owners.resolve_default_owner(&record).unwrap(), UserId::from("bruno"));
    }

    #[test]
    fn test_round_robin_single_owner_pool() {
        let owners = RoundRobinOwners::new(["ana"]);
        let record = TrackedRecord::new(RecordKind::Protocol, "open", 0).with_responsible("ana", None);
        assert_eq!(owners.resolve_default_owner(&record).unwrap(), UserId::from("ana"));
    }

    #[test]
    fn test_empty_pool_fails() {
        let owners = RoundRobinOwners::new(Vec::<String>::new());
        let record = TrackedRecord::new(RecordKind::Protocol, "open", 0);
        assert!(owners.is_empty());
        assert!(owners.resolve_default_owner(&record).is_err());
    }

    #[test]
    fn test_fixed_owner() {
        let owner = FixedOwner(UserId::from("coord"));
        let record = TrackedRecord::new(RecordKind::Protocol, "open", 0);
        assert_eq!(owner.resolve_default_owner(&record).unwrap(), UserId::from("coord"));
    }
}
