//! Display tags generated from the escalation tier and auxiliary flags

use crate::{Tier, TierThresholds};

/// Code of the missing-document tag
pub const DOC_PENDING_CODE: &str = "DOC_PENDENTE";

/// Display label attached to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Machine code (e.g. `CRITICO_60`)
    pub code: String,

    /// Human-readable text
    pub label: String,

    /// Hex color used by the UI
    pub color: String,

    /// Produced by a rule rather than attached by a user
    pub generated_automatically: bool,

    /// Rule that produced the tag (empty for manual tags)
    pub rule_applied: String,

    /// Whether the tag is currently shown
    pub active: bool,
}

impl Tag {
    /// Create a manual, active tag
    pub fn manual(code: impl Into<String>, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            color: color.into(),
            generated_automatically: false,
            rule_applied: String::new(),
            active: true,
        }
    }
}

/// Non-aging conditions that produce their own tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuxiliaryFlags {
    /// A required document is still missing
    pub documents_pending: bool,
}

fn tier_prefix(tier: Tier) -> Option<(&'static str, &'static str)> {
    // (code prefix, color)
    match tier {
        Tier::Normal => None,
        Tier::Attention => Some(("ATENCAO", "#eab308")),
        Tier::Warning => Some(("ALERTA", "#f97316")),
        Tier::AtRisk => Some(("RISCO", "#dc2626")),
        Tier::Critical => Some(("CRITICO", "#7f1d1d")),
    }
}

/// Compute the display tags for a record
///
/// Emits at most one aging tag (none for `Normal`) followed by one tag per
/// raised auxiliary flag. The aging label carries the actual elapsed days.
pub fn generate_tags(
    elapsed_days: u64,
    tier: Tier,
    flags: &AuxiliaryFlags,
    thresholds: &TierThresholds,
) -> Vec<Tag> {
    let mut tags = Vec::new();

    if let Some((prefix, color)) = tier_prefix(tier) {
        let threshold = thresholds.threshold_for(tier);
        tags.push(Tag {
            code: format!("{}_{}", prefix, threshold),
            label: format!("Parado há {} dias", elapsed_days),
            color: color.to_string(),
            generated_automatically: true,
            rule_applied: format!("stalled >= {} days", threshold),
            active: true,
        });
    }

    if flags.documents_pending {
        tags.push(Tag {
            code: DOC_PENDING_CODE.to_string(),
            label: "Documentação pendente".to_string(),
            color: "#2563eb".to_string(),
            generated_automatically: true,
            rule_applied: "documents pending".to_string(),
            active: true,
        });
    }

    tags
}

/// Union of manual and generated tags by code
///
/// Manual tags come first and win over a generated tag with the same code.
pub fn merge_tags(manual: &[Tag], generated: &[Tag]) -> Vec<Tag> {
    let mut merged: Vec<Tag> = manual.to_vec();
    for tag in generated {
        if !merged.iter().any(|existing| existing.code == tag.code) {
            merged.push(tag.clone());
        }
    }
    merged
}
