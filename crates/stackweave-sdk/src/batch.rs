//! Per-component outcomes of a batch run.

use std::fmt;

use serde::Serialize;
use stackweave_common::error::StackError;
use stackweave_compose::generator::GeneratedConfig;

/// Why a component was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Cancellation was observed before the component started.
    Cancelled,
    /// The component was not part of the requested selection.
    NotSelected,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::NotSelected => write!(f, "not selected"),
        }
    }
}

/// Result of processing one component.
#[derive(Debug)]
pub enum Outcome {
    /// Configuration was generated.
    Generated(GeneratedConfig),
    /// Generation failed; no output was produced.
    Failed(StackError),
    /// The component was not processed.
    Skipped(SkipReason),
}

impl Outcome {
    /// Short status label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Generated(_) => "generated",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// One component's slot in a batch report.
#[derive(Debug)]
pub struct BatchItem {
    /// Component address.
    pub component: String,
    /// What happened to it.
    pub outcome: Outcome,
}

/// Counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Components in the batch.
    pub total: usize,
    /// Components with generated configuration.
    pub generated: usize,
    /// Components that failed.
    pub failed: usize,
    /// Components that were skipped.
    pub skipped: usize,
    /// Generated components rendered without their module contract.
    pub declared_only: usize,
    /// Inputs bound under a different name than declared.
    pub renames: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} component(s): {} generated, {} failed, {} skipped",
            self.total, self.generated, self.failed, self.skipped
        )?;
        if self.declared_only > 0 {
            write!(f, " ({} without module contract)", self.declared_only)?;
        }
        Ok(())
    }
}

/// Outcomes of a batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One item per component.
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    /// Counts outcomes.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.items.len(),
            ..BatchSummary::default()
        };
        for item in &self.items {
            match &item.outcome {
                Outcome::Generated(config) => {
                    summary.generated += 1;
                    summary.renames += config.renames.len();
                    if config.declared_only {
                        summary.declared_only += 1;
                    }
                }
                Outcome::Failed(_) => summary.failed += 1,
                Outcome::Skipped(_) => summary.skipped += 1,
            }
        }
        summary
    }

    /// Generated configurations, in input order.
    pub fn generated(&self) -> impl Iterator<Item = &GeneratedConfig> {
        self.items.iter().filter_map(|i| match &i.outcome {
            Outcome::Generated(config) => Some(config),
            _ => None,
        })
    }

    /// Failures, in input order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &StackError)> {
        self.items.iter().filter_map(|i| match &i.outcome {
            Outcome::Failed(error) => Some((i.component.as_str(), error)),
            _ => None,
        })
    }

    /// Returns the item for `component`.
    #[must_use]
    pub fn item(&self, component: &str) -> Option<&BatchItem> {
        self.items.iter().find(|i| i.component == component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_each_outcome() {
        let report = BatchReport {
            items: vec![
                BatchItem {
                    component: "a".into(),
                    outcome: Outcome::Failed(StackError::Config { message: "bad".into() }),
                },
                BatchItem {
                    component: "b".into(),
                    outcome: Outcome::Skipped(SkipReason::Cancelled),
                },
            ],
        };
        let summary = report.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.to_string(), "2 component(s): 0 generated, 1 failed, 1 skipped");
        assert_eq!(report.failures().count(), 1);
    }
}
