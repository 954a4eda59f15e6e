//! Tier module - escalation levels derived from days without movement

use crate::DomainError;

/// Seconds in one elapsed day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Escalation tier of a tracked record
///
/// Tiers are totally ordered: `Normal < Attention < Warning < AtRisk < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Recently moved, no tag generated
    Normal,

    /// Stalled past the attention threshold (15+ days by default)
    Attention,

    /// Stalled past the warning threshold (30+ days by default)
    Warning,

    /// Stalled past the at-risk threshold (45+ days by default)
    AtRisk,

    /// Stalled past the critical threshold (60+ days by default)
    Critical,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 5] = [
        Tier::Normal,
        Tier::Attention,
        Tier::Warning,
        Tier::AtRisk,
        Tier::Critical,
    ];

    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Normal => "normal",
            Tier::Attention => "attention",
            Tier::Warning => "warning",
            Tier::AtRisk => "at_risk",
            Tier::Critical => "critical",
        }
    }

    /// Parse a tier from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(Tier::Normal),
            "attention" => Some(Tier::Attention),
            "warning" => Some(Tier::Warning),
            "at_risk" | "at-risk" => Some(Tier::AtRisk),
            "critical" => Some(Tier::Critical),
            _ => None,
        }
    }

    /// Get the next tier up (escalation)
    pub fn next(&self) -> Option<Self> {
        match self {
            Tier::Normal => Some(Tier::Attention),
            Tier::Attention => Some(Tier::Warning),
            Tier::Warning => Some(Tier::AtRisk),
            Tier::AtRisk => Some(Tier::Critical),
            Tier::Critical => None,
        }
    }

    /// Whether this tier produces an aging tag and alert
    pub fn is_escalated(&self) -> bool {
        *self > Tier::Normal
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid tier: {}", s))
    }
}

/// Day thresholds at which each tier begins (inclusive lower bounds)
///
/// Different record kinds may carry different tables; the defaults are
/// 15 / 30 / 45 / 60 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierThresholds {
    /// First day of `Attention`
    pub attention: u64,
    /// First day of `Warning`
    pub warning: u64,
    /// First day of `AtRisk`
    pub at_risk: u64,
    /// First day of `Critical`
    pub critical: u64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            attention: 15,
            warning: 30,
            at_risk: 45,
            critical: 60,
        }
    }
}

impl TierThresholds {
    /// Check that thresholds are non-zero and strictly increasing
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.attention == 0 {
            return Err(DomainError::InvalidThresholds(
                "attention threshold must be greater than 0".to_string(),
            ));
        }
        let ordered = self.attention < self.warning
            && self.warning < self.at_risk
            && self.at_risk < self.critical;
        if !ordered {
            return Err(DomainError::InvalidThresholds(format!(
                "expected attention < warning < at_risk < critical, got {} / {} / {} / {}",
                self.attention, self.warning, self.at_risk, self.critical
            )));
        }
        Ok(())
    }

    /// Lower bound in days for a tier (`Normal` starts at 0)
    pub fn threshold_for(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Normal => 0,
            Tier::Attention => self.attention,
            Tier::Warning => self.warning,
            Tier::AtRisk => self.at_risk,
            Tier::Critical => self.critical,
        }
    }

    /// Classify whole elapsed days into a tier
    ///
    /// Highest threshold wins; a value exactly on a boundary belongs to the
    /// higher tier.
    pub fn classify(&self, elapsed_days: u64) -> Tier {
        Tier::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| elapsed_days >= self.threshold_for(*tier))
            .unwrap_or(Tier::Normal)
    }

    /// Classify fractional elapsed days, flooring before classification
    pub fn classify_fractional(&self, elapsed_days: f64) -> Result<Tier, DomainError> {
        if !elapsed_days.is_finite() || elapsed_days < 0.0 {
            return Err(DomainError::NegativeElapsed(elapsed_days.to_string()));
        }
        Ok(self.classify(elapsed_days.floor() as u64))
    }
}

/// Classify with the default 15 / 30 / 45 / 60 table
pub fn classify_tier(elapsed_days: u64) -> Tier {
    TierThresholds::default().classify(elapsed_days)
}

/// Whole days between `last_movement_at` and `now` (both Unix seconds)
pub fn elapsed_days(now: u64, last_movement_at: u64) -> Result<u64, DomainError> {
    if last_movement_at > now {
        return Err(DomainError::FutureLastMovement { last_movement_at, now });
    }
    Ok((now - last_movement_at) / SECONDS_PER_DAY)
}
