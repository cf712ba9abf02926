//! Blocking blast-radius assessment.
//!
//! The CLI and other synchronous callers run the async analyzer on a
//! dedicated runtime.

use std::path::Path;
use std::sync::Arc;

use stackweave_common::config::RiskConfig;
use stackweave_common::error::{Result, StackError};
use stackweave_common::types::ChangeSet;
use stackweave_compose::graph::DependencyGraph;
use stackweave_risk::BlastRadiusAnalyzer;
use stackweave_risk::assessment::BlastRadiusAssessment;
use stackweave_risk::history::{GitHistory, History, NoHistory};

/// Chooses the history source: git for `repo` when given, otherwise none.
///
/// Falls back to [`NoHistory`] when git is not installed.
#[must_use]
pub fn history_source(repo: Option<&Path>) -> Arc<dyn History> {
    let Some(repo) = repo else {
        return Arc::new(NoHistory);
    };
    match GitHistory::new(repo) {
        Ok(git) => Arc::new(git),
        Err(e) => {
            tracing::warn!(repo = %repo.display(), error = %e, "change history unavailable");
            Arc::new(NoHistory)
        }
    }
}

/// Assesses `changes` against `graph`, blocking until done.
///
/// # Errors
///
/// Returns `StackError::CycleDetected` if the graph is cyclic, or
/// `StackError::Config` if the runtime cannot start.
pub fn assess_blocking(
    graph: &DependencyGraph,
    changes: &ChangeSet,
    history: Arc<dyn History>,
    config: RiskConfig,
) -> Result<BlastRadiusAssessment> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("stackweave-history")
        .build()
        .map_err(|e| StackError::Config {
            message: format!("failed to start async runtime: {e}"),
        })?;
    let analyzer = BlastRadiusAnalyzer::new(history, config);
    runtime.block_on(analyzer.assess(graph, changes))
}
