//! Configuration for escalation sweeps
//!
//! Defines per-kind tier thresholds, terminal statuses, the reassignment
//! policy and the sweep interval.

use crate::EscalationError;
use casewatch_domain::{RecordKind, StatusPolicy, TierThresholds};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Day thresholds as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdDays {
    /// First day of the attention tier
    pub attention_days: u64,
    /// First day of the warning tier
    pub warning_days: u64,
    /// First day of the at-risk tier
    pub at_risk_days: u64,
    /// First day of the critical tier
    pub critical_days: u64,
}

impl ThresholdDays {
    /// Convert into the domain threshold table
    pub fn to_thresholds(self) -> TierThresholds {
        TierThresholds {
            attention: self.attention_days,
            warning: self.warning_days,
            at_risk: self.at_risk_days,
            critical: self.critical_days,
        }
    }
}

impl Default for ThresholdDays {
    fn default() -> Self {
        Self {
            attention_days: 15,
            warning_days: 30,
            at_risk_days: 45,
            critical_days: 60,
        }
    }
}

/// Aging rules for one record kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindProfile {
    /// Tier thresholds
    #[serde(default)]
    pub thresholds: ThresholdDays,

    /// Statuses excluded from aging
    pub terminal_statuses: Vec<String>,
}

fn default_protocol_profile() -> KindProfile {
    KindProfile {
        thresholds: ThresholdDays::default(),
        terminal_statuses: StatusPolicy::default().protocol,
    }
}

fn default_hospital_record_request_profile() -> KindProfile {
    KindProfile {
        thresholds: ThresholdDays::default(),
        terminal_statuses: StatusPolicy::default().hospital_record_request,
    }
}

/// Configuration for the escalation engine
///
/// # Examples
///
/// ```
/// use casewatch_escalator::EscalatorConfig;
///
/// let config = EscalatorConfig::default();
/// assert_eq!(config.protocol.thresholds.critical_days, 60);
///
/// let config = EscalatorConfig::strict();
/// assert_eq!(config.protocol.thresholds.attention_days, 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalatorConfig {
    /// How often the background worker sweeps (in minutes)
    /// Default: every 60 minutes
    pub sweep_interval_minutes: u64,

    /// Dry-run mode: evaluate and log without writing anything
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Reassign critical records whose owner has been inactive for the whole
    /// critical window
    /// Default: true
    #[serde(default = "default_true")]
    pub reassign_unresponsive_on_critical: bool,

    /// Pool of fallback owners used for unassigned or unresponsive records
    #[serde(default)]
    pub default_owners: Vec<String>,

    /// Rules for protocols
    #[serde(default = "default_protocol_profile")]
    pub protocol: KindProfile,

    /// Rules for hospital record requests
    #[serde(default = "default_hospital_record_request_profile")]
    pub hospital_record_request: KindProfile,
}

fn default_true() -> bool {
    true
}

impl Default for EscalatorConfig {
    /// 15 / 30 / 45 / 60 day tiers, hourly sweeps, unresponsive reassignment on
    fn default() -> Self {
        Self {
            sweep_interval_minutes: 60,
            dry_run: false,
            reassign_unresponsive_on_critical: true,
            default_owners: Vec::new(),
            protocol: default_protocol_profile(),
            hospital_record_request: default_hospital_record_request_profile(),
        }
    }
}

impl EscalatorConfig {
    /// Strict configuration: weekly tiers and sweeps every 15 minutes
    pub fn strict() -> Self {
        let weekly = ThresholdDays {
            attention_days: 7,
            warning_days: 14,
            at_risk_days: 21,
            critical_days: 28,
        };
        let mut config = Self {
            sweep_interval_minutes: 15,
            ..Self::default()
        };
        config.protocol.thresholds = weekly;
        config.hospital_record_request.thresholds = weekly;
        config
    }

    /// Relaxed configuration: monthly tiers, sweeps every 4 hours, no
    /// automatic reassignment of unresponsive owners
    pub fn relaxed() -> Self {
        let monthly = ThresholdDays {
            attention_days: 30,
            warning_days: 60,
            at_risk_days: 90,
            critical_days: 120,
        };
        let mut config = Self {
            sweep_interval_minutes: 240,
            reassign_unresponsive_on_critical: false,
            ..Self::default()
        };
        config.protocol.thresholds = monthly;
        config.hospital_record_request.thresholds = monthly;
        config
    }

    /// Parse a configuration from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self, EscalationError> {
        let config: EscalatorConfig =
            toml::from_str(contents).map_err(|e| EscalationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EscalationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EscalationError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), EscalationError> {
        if self.sweep_interval_minutes == 0 {
            return Err(EscalationError::Config(
                "sweep_interval_minutes must be greater than 0".to_string(),
            ));
        }
        for kind in RecordKind::ALL {
            self.thresholds(kind)
                .validate()
                .map_err(|e| EscalationError::Config(format!("{}: {}", kind, e)))?;
        }
        if self.default_owners.iter().any(|owner| owner.trim().is_empty()) {
            return Err(EscalationError::Config(
                "default_owners must not contain empty ids".to_string(),
            ));
        }
        Ok(())
    }

    /// Rules configured for a record kind
    pub fn profile(&self, kind: RecordKind) -> &KindProfile {
        match kind {
            RecordKind::Protocol => &self.protocol,
            RecordKind::HospitalRecordRequest => &self.hospital_record_request,
        }
    }

    /// Tier thresholds for a record kind
    pub fn thresholds(&self, kind: RecordKind) -> TierThresholds {
        self.profile(kind).thresholds.to_thresholds()
    }

    /// Terminal statuses per kind
    pub fn status_policy(&self) -> StatusPolicy {
        StatusPolicy {
            protocol: self.protocol.terminal_statuses.clone(),
            hospital_record_request: self.hospital_record_request.terminal_statuses.clone(),
        }
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EscalatorConfig::default();
        assert_eq!(config.sweep_interval_minutes, 60);
        assert!(!config.dry_run);
        assert!(config.reassign_unresponsive_on_critical);
        assert!(config.default_owners.is_empty());
        assert_eq!(config.thresholds(RecordKind::Protocol), TierThresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let strict = EscalatorConfig::strict();
        assert_eq!(strict.thresholds(RecordKind::HospitalRecordRequest).critical, 28);
        assert!(strict.sweep_interval() < EscalatorConfig::default().sweep_interval());
        assert!(strict.validate().is_ok());

        let relaxed = EscalatorConfig::relaxed();
        assert_eq!(relaxed.thresholds(RecordKind::Protocol).attention, 30);
        assert!(!relaxed.reassign_unresponsive_on_critical);
        assert!(relaxed.validate().is_ok());
    }

    #[test]
    fn test_from_toml_with_defaults() {
        let config = EscalatorConfig::from_toml_str(
            r#"
            sweep_interval_minutes = 30
            default_owners = ["ana", "bruno"]

            [hospital_record_request]
            terminal_statuses = ["delivered"]
            thresholds = { attention_days = 10, warning_days = 20, at_risk_days = 25, critical_days = 40 }
            "#,
        )
        .unwrap();

        assert_eq!(config.sweep_interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.default_owners, vec!["ana", "bruno"]);
        assert!(config.reassign_unresponsive_on_critical);
        assert_eq!(config.protocol, default_protocol_profile());
        assert_eq!(config.thresholds(RecordKind::HospitalRecordRequest).critical, 40);

        let policy = config.status_policy();
        assert!(policy.is_terminal(RecordKind::HospitalRecordRequest, "delivered"));
        assert!(!policy.is_terminal(RecordKind::HospitalRecordRequest, "cancelled"));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let result = EscalatorConfig::from_toml_str(
            r#"
            sweep_interval_minutes = 30

            [protocol]
            terminal_statuses = ["archived"]
            thresholds = { attention_days = 30, warning_days = 15, at_risk_days = 45, critical_days = 60 }
            "#,
        );
        assert!(matches!(result, Err(EscalationError::Config(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = EscalatorConfig {
            sweep_interval_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("escalator.toml");
        std::fs::write(&path, "sweep_interval_minutes = 5\ndry_run = true\n").unwrap();

        let config = EscalatorConfig::load(&path).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.sweep_interval_minutes, 5);

        assert!(EscalatorConfig::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = EscalatorConfig::strict();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: EscalatorConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(config.protocol, deserialized.protocol);
        assert_eq!(config.sweep_interval_minutes, deserialized.sweep_interval_minutes);
    }
}
