//! Batch configuration generation.
//!
//! Builds the dependency graph once, rejects cyclic stacks, and generates
//! every component on a bounded worker pool. Failures stay scoped to their
//! component; the batch always produces a report in input order.

use std::collections::HashMap;

use rayon::prelude::*;
use stackweave_common::error::{Result, StackError};
use stackweave_common::types::Component;
use stackweave_compose::generator::ConfigGenerator;
use stackweave_compose::graph::{self, DependencyGraph, DuplicateDeclaration};

use crate::batch::{BatchItem, BatchReport, Outcome, SkipReason};
use crate::cancel::CancelToken;

/// Generates configuration for whole stacks.
#[derive(Debug, Clone)]
pub struct StackComposer {
    generator: ConfigGenerator,
    workers: usize,
}

impl StackComposer {
    /// Creates a composer; `workers == 0` uses one worker per CPU.
    #[must_use]
    pub const fn new(generator: ConfigGenerator, workers: usize) -> Self {
        Self { generator, workers }
    }

    /// The underlying per-component generator.
    #[must_use]
    pub const fn generator(&self) -> &ConfigGenerator {
        &self.generator
    }

    /// Generates every component.
    ///
    /// # Errors
    ///
    /// Returns `StackError::CycleDetected` if the stack is cyclic, or
    /// `StackError::Config` if the worker pool cannot start.
    pub fn generate_all(&self, components: Vec<Component>, cancel: &CancelToken) -> Result<BatchReport> {
        self.generate_selected(components, &[], cancel)
    }

    /// Generates the components named in `selection`, or all of them when
    /// `selection` is empty. Other components are reported as skipped.
    ///
    /// # Errors
    ///
    /// See [`Self::generate_all`].
    pub fn generate_selected(
        &self,
        components: Vec<Component>,
        selection: &[String],
        cancel: &CancelToken,
    ) -> Result<BatchReport> {
        let build = graph::build(components);
        build.graph.check_acyclic()?;

        let mut rejected: HashMap<String, StackError> = HashMap::new();
        for failure in build.failures {
            let _ = rejected.entry(failure.component).or_insert(failure.error);
        }
        let graph = build.graph;
        let duplicates = build.duplicates;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("stackweave-gen-{i}"))
            .build()
            .map_err(|e| StackError::Config {
                message: format!("failed to start generation workers: {e}"),
            })?;

        tracing::info!(components = graph.len(), workers = pool.current_num_threads(), "generating stack");
        let components: Vec<&Component> = graph.components().collect();
        let outcomes: Vec<Option<Outcome>> = pool.install(|| {
            components
                .par_iter()
                .map(|c| {
                    let selected = selection.is_empty() || selection.contains(&c.address);
                    if !selected {
                        Some(Outcome::Skipped(SkipReason::NotSelected))
                    } else if rejected.contains_key(&c.address) {
                        None
                    } else {
                        Some(self.process(c, &graph, cancel))
                    }
                })
                .collect()
        });

        let kept: Vec<BatchItem> = components
            .iter()
            .zip(outcomes)
            .map(|(c, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    rejected.remove(&c.address).map_or_else(
                        || {
                            Outcome::Failed(StackError::NotFound {
                                kind: "component",
                                id: c.address.clone(),
                            })
                        },
                        Outcome::Failed,
                    )
                });
                BatchItem {
                    component: c.address.clone(),
                    outcome,
                }
            })
            .collect();

        let report = BatchReport {
            items: interleave_duplicates(kept, duplicates, selection),
        };
        let summary = report.summary();
        tracing::info!(
            generated = summary.generated,
            failed = summary.failed,
            skipped = summary.skipped,
            "stack generation finished"
        );
        Ok(report)
    }

    fn process(&self, component: &Component, graph: &DependencyGraph, cancel: &CancelToken) -> Outcome {
        if cancel.is_cancelled() {
            tracing::debug!(component = %component.address, "skipping after cancellation");
            return Outcome::Skipped(SkipReason::Cancelled);
        }
        match self.generator.generate(component, graph) {
            Ok(config) => Outcome::Generated(config),
            Err(e) => {
                tracing::warn!(component = %component.address, error = %e, "generation failed");
                Outcome::Failed(e)
            }
        }
    }
}

/// Places a failed item for each duplicate declaration at its input position
/// among the items of the kept declarations.
fn interleave_duplicates(
    kept: Vec<BatchItem>,
    duplicates: Vec<DuplicateDeclaration>,
    selection: &[String],
) -> Vec<BatchItem> {
    let total = kept.len() + duplicates.len();
    let mut kept = kept.into_iter();
    let mut duplicates = duplicates.into_iter().peekable();
    let mut items = Vec::with_capacity(total);
    for position in 0..total {
        let duplicate = duplicates.next_if(|d| d.position == position);
        if let Some(d) = duplicate {
            let selected = selection.is_empty() || selection.contains(&d.failure.component);
            let outcome = if selected {
                Outcome::Failed(d.failure.error)
            } else {
                Outcome::Skipped(SkipReason::NotSelected)
            };
            items.push(BatchItem {
                component: d.failure.component,
                outcome,
            });
        } else if let Some(item) = kept.next() {
            items.push(item);
        }
    }
    items
}
