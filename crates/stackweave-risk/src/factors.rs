//! Weighted risk factors.
//!
//! Every factor maps a raw count to a score in `[0.1, 1.0]` through a
//! bucketed, monotonic non-decreasing step function. The set of factors and
//! their weights is fixed in [`FACTORS`].

use serde::{Deserialize, Serialize};

/// Score used for a factor whose raw input could not be obtained.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// The kind of a risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactorKind {
    /// Commit count within the frequency window.
    ChangeFrequency,
    /// Incoming plus outgoing edges.
    DependencyCount,
    /// Assignment count plus explicit dependency count.
    StructuralComplexity,
    /// Incoming edge count.
    Criticality,
    /// Commit count within the recency window.
    ChangeRecency,
}

/// A factor's weight and bucket function.
#[derive(Debug, Clone, Copy)]
pub struct FactorDefinition {
    /// Which factor this is.
    pub kind: FactorKind,
    /// Weight in the risk sum. Weights of [`FACTORS`] add up to 1.
    pub weight: f64,
    /// Maps a raw count to a score.
    pub bucket: fn(u64) -> f64,
}

impl FactorDefinition {
    /// Scores a factor value; unknown values score [`NEUTRAL_SCORE`].
    #[must_use]
    pub fn score(&self, value: FactorValue) -> f64 {
        match value {
            FactorValue::Known(raw) => (self.bucket)(raw),
            FactorValue::Unknown => NEUTRAL_SCORE,
        }
    }
}

/// Raw factor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "state", content = "raw")]
pub enum FactorValue {
    /// The raw count is known.
    Known(u64),
    /// The raw count could not be obtained.
    Unknown,
}

impl FactorValue {
    /// Whether the value is unknown.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

fn frequency_bucket(count: u64) -> f64 {
    match count {
        0 => 0.1,
        1..=4 => 0.3,
        5..=9 => 0.5,
        10..=24 => 0.7,
        25..=49 => 0.9,
        _ => 1.0,
    }
}

fn dependency_bucket(count: u64) -> f64 {
    match count {
        0 => 0.1,
        1 => 0.3,
        2..=3 => 0.5,
        4..=6 => 0.7,
        7..=9 => 0.8,
        10..=14 => 0.9,
        _ => 1.0,
    }
}

fn complexity_bucket(count: u64) -> f64 {
    match count {
        0..=2 => 0.1,
        3..=5 => 0.3,
        6..=10 => 0.5,
        11..=20 => 0.7,
        21..=40 => 0.9,
        _ => 1.0,
    }
}

fn criticality_bucket(count: u64) -> f64 {
    match count {
        0 => 0.1,
        1 => 0.4,
        2..=3 => 0.6,
        4..=5 => 0.8,
        _ => 1.0,
    }
}

fn recency_bucket(count: u64) -> f64 {
    match count {
        0 => 0.1,
        1 => 0.4,
        2..=4 => 0.7,
        _ => 1.0,
    }
}

/// The factor registry.
pub static FACTORS: [FactorDefinition; 5] = [
    FactorDefinition {
        kind: FactorKind::ChangeFrequency,
        weight: 0.30,
        bucket: frequency_bucket,
    },
    FactorDefinition {
        kind: FactorKind::DependencyCount,
        weight: 0.25,
        bucket: dependency_bucket,
    },
    FactorDefinition {
        kind: FactorKind::StructuralComplexity,
        weight: 0.20,
        bucket: complexity_bucket,
    },
    FactorDefinition {
        kind: FactorKind::Criticality,
        weight: 0.15,
        bucket: criticality_bucket,
    },
    FactorDefinition {
        kind: FactorKind::ChangeRecency,
        weight: 0.10,
        bucket: recency_bucket,
    },
];

/// Returns the definition of `kind`.
#[must_use]
pub fn definition(kind: FactorKind) -> &'static FactorDefinition {
    let index = match kind {
        FactorKind::ChangeFrequency => 0,
        FactorKind::DependencyCount => 1,
        FactorKind::StructuralComplexity => 2,
        FactorKind::Criticality => 3,
        FactorKind::ChangeRecency => 4,
    };
    &FACTORS[index]
}

/// Raw inputs of all factors for one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorInputs {
    /// Commits within the frequency window.
    pub change_frequency: FactorValue,
    /// Incoming plus outgoing edges.
    pub dependency_count: FactorValue,
    /// Assignments plus explicit dependencies.
    pub structural_complexity: FactorValue,
    /// Incoming edges.
    pub criticality: FactorValue,
    /// Commits within the recency window.
    pub change_recency: FactorValue,
}

impl FactorInputs {
    /// Returns the raw input of `kind`.
    #[must_use]
    pub const fn value(&self, kind: FactorKind) -> FactorValue {
        match kind {
            FactorKind::ChangeFrequency => self.change_frequency,
            FactorKind::DependencyCount => self.dependency_count,
            FactorKind::StructuralComplexity => self.structural_complexity,
            FactorKind::Criticality => self.criticality,
            FactorKind::ChangeRecency => self.change_recency,
        }
    }

    /// Number of unknown inputs.
    #[must_use]
    pub fn unknown_count(&self) -> usize {
        FACTORS
            .iter()
            .filter(|f| self.value(f.kind).is_unknown())
            .count()
    }
}

/// One scored factor of a component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    /// Which factor.
    pub kind: FactorKind,
    /// Raw input.
    pub value: FactorValue,
    /// Bucketed score.
    pub score: f64,
    /// Weight in the risk sum.
    pub weight: f64,
}

/// Scores every factor of `inputs`, in registry order.
#[must_use]
pub fn score_all(inputs: &FactorInputs) -> Vec<FactorScore> {
    FACTORS
        .iter()
        .map(|f| {
            let value = inputs.value(f.kind);
            FactorScore {
                kind: f.kind,
                value,
                score: f.score(value),
                weight: f.weight,
            }
        })
        .collect()
}

/// Risk percentage in `[0, 100]`: the weighted factor sum scaled by 100.
#[must_use]
pub fn risk_percentage(inputs: &FactorInputs) -> f64 {
    let sum: f64 = FACTORS
        .iter()
        .map(|f| f.weight * f.score(inputs.value(f.kind)))
        .sum();
    (sum * 100.0).clamp(0.0, 100.0)
}
