//! Risk classification of an affected component set.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackweave_common::config::{EdgeView, PropagationMode, RiskConfig};
use stackweave_common::constants::EMERGENCY_AFFECTED_COUNT;
use stackweave_common::types::{ChangeAction, Criticality};

use crate::factors::FactorScore;

/// Overall risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Routine change.
    Low,
    /// Needs review.
    Medium,
    /// Needs review and a staged rollout.
    High,
    /// Needs sign-off and a maintenance window.
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Change-management category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// Pre-approved, low-risk change.
    Standard,
    /// Change that goes through normal review.
    Normal,
    /// Change that needs expedited handling.
    Emergency,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "STANDARD"),
            Self::Normal => write!(f, "NORMAL"),
            Self::Emergency => write!(f, "EMERGENCY"),
        }
    }
}

/// How much of the scoring rests on known inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    /// Every factor input was known.
    High,
    /// At most half of the factor inputs were unknown.
    Medium,
    /// More than half of the factor inputs were unknown.
    Low,
}

impl ConfidenceLevel {
    /// Derives the confidence level from unknown and total input counts.
    #[must_use]
    pub const fn from_unknowns(unknown: usize, total: usize) -> Self {
        if unknown == 0 {
            Self::High
        } else if unknown * 2 <= total {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

/// Criticality derived from the number of dependents.
#[must_use]
pub const fn derived_criticality(incoming: usize) -> Criticality {
    match incoming {
        0 => Criticality::Low,
        1..=3 => Criticality::Medium,
        4..=5 => Criticality::High,
        _ => Criticality::Critical,
    }
}

/// A component inside the blast radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedComponent {
    /// Component address.
    pub address: String,
    /// Planned action; `no-change` for components reached by propagation.
    pub action: ChangeAction,
    /// Whether the component is named in the change set.
    pub direct: bool,
    /// Declared or derived criticality.
    pub criticality: Criticality,
    /// Risk percentage in `[0, 100]`.
    pub risk_percentage: f64,
    /// Per-factor breakdown.
    pub factors: Vec<FactorScore>,
}

impl AffectedComponent {
    /// Risk as a fraction in `[0, 1]`.
    #[must_use]
    pub fn risk_fraction(&self) -> f64 {
        self.risk_percentage / 100.0
    }
}

/// Result of a blast-radius analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastRadiusAssessment {
    /// Addresses that seeded propagation.
    pub changed: Vec<String>,
    /// Affected components, changed ones first.
    pub affected: Vec<AffectedComponent>,
    /// Overall risk tier.
    pub risk_level: RiskLevel,
    /// Change-management category.
    pub change_type: ChangeType,
    /// Confidence in the scoring.
    pub confidence: ConfidenceLevel,
    /// Propagation mode used.
    pub propagation: PropagationMode,
    /// Edge view used.
    pub edge_view: EdgeView,
    /// Review recommendations for the risk tier.
    pub recommendations: Vec<String>,
    /// Mitigation steps for the risk tier.
    pub mitigation_steps: Vec<String>,
    /// Ordered rollback steps.
    pub rollback_plan: Vec<String>,
    /// When the assessment was produced.
    pub assessed_at: DateTime<Utc>,
}

impl BlastRadiusAssessment {
    /// Average risk fraction over the affected components.
    #[must_use]
    pub fn average_risk(&self) -> f64 {
        average_risk(&self.affected)
    }
}

fn average_risk(affected: &[AffectedComponent]) -> f64 {
    if affected.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = affected.len() as f64;
    affected.iter().map(AffectedComponent::risk_fraction).sum::<f64>() / count
}

/// Classifies the overall risk of `affected` against the configured thresholds.
#[must_use]
pub fn assess_overall_risk(affected: &[AffectedComponent], config: &RiskConfig) -> RiskLevel {
    let average = average_risk(affected);
    let very_risky = affected.iter().filter(|c| c.risk_fraction() > 0.8).count();

    if affected.iter().any(|c| c.criticality == Criticality::Critical) || average > config.critical_threshold {
        RiskLevel::Critical
    } else if very_risky > 2 || average > config.high_threshold {
        RiskLevel::High
    } else if average > config.medium_threshold {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Chooses the change-management category.
///
/// Any deletion makes the change an emergency, whatever the risk tier.
#[must_use]
pub fn determine_change_type(risk: RiskLevel, affected: &[AffectedComponent]) -> ChangeType {
    if affected.iter().any(|c| c.action == ChangeAction::Delete)
        || risk == RiskLevel::Critical
        || affected.len() > EMERGENCY_AFFECTED_COUNT
    {
        ChangeType::Emergency
    } else if matches!(risk, RiskLevel::Medium | RiskLevel::High) {
        ChangeType::Normal
    } else {
        ChangeType::Standard
    }
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| (*s).to_string()).collect()
}

/// Review recommendations for a risk tier.
#[must_use]
pub fn recommendations(risk: RiskLevel) -> Vec<String> {
    owned(match risk {
        RiskLevel::Critical => &[
            "Require approval from the owners of every affected component",
            "Schedule the change inside a maintenance window",
            "Notify dependent teams before applying",
            "Run a full plan against a staging copy of the stack",
        ],
        RiskLevel::High => &[
            "Require a second reviewer familiar with the affected components",
            "Apply in stages, starting with the least critical component",
            "Run a full plan before applying",
        ],
        RiskLevel::Medium => &[
            "Request a peer review of the plan output",
            "Verify dependent components after applying",
        ],
        RiskLevel::Low => &["Follow the standard change process"],
    })
}

/// Mitigation steps for a risk tier.
#[must_use]
pub fn mitigation_steps(risk: RiskLevel) -> Vec<String> {
    owned(match risk {
        RiskLevel::Critical => &[
            "Snapshot state and data stores of every affected component",
            "Prepare and rehearse the rollback procedure",
            "Keep an operator on call for the duration of the change",
            "Monitor dependent services for at least one hour after applying",
        ],
        RiskLevel::High => &[
            "Snapshot state of the changed components",
            "Monitor dependent services after applying",
            "Confirm the rollback procedure before starting",
        ],
        RiskLevel::Medium => &[
            "Back up state of the changed components",
            "Check health of dependent components after applying",
        ],
        RiskLevel::Low => &["Check the plan output for unexpected changes"],
    })
}

/// Ordered rollback steps for `affected`.
///
/// A restore step is added whenever any affected component is deleted.
#[must_use]
pub fn rollback_plan(affected: &[AffectedComponent]) -> Vec<String> {
    let mut plan = owned(&[
        "Revert the configuration change in version control",
        "Re-run plan to confirm the reverted state",
    ]);
    if affected.iter().any(|c| c.action == ChangeAction::Delete) {
        plan.push("Restore deleted resources from backups or state snapshots".to_string());
    }
    plan.push("Apply the reverted configuration, dependencies first".to_string());
    plan.push("Verify health of every affected component".to_string());
    plan
}
