//! Blast-radius analysis of a change set against a graph snapshot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use stackweave_common::config::{EdgeView, PropagationMode, RiskConfig};
use stackweave_common::error::Result;
use stackweave_common::types::{ChangeAction, ChangeSet};
use stackweave_compose::graph::DependencyGraph;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::assessment::{
    self, AffectedComponent, BlastRadiusAssessment, ConfidenceLevel, derived_criticality,
};
use crate::factors::{self, FACTORS, FactorInputs, FactorValue};
use crate::history::History;
use crate::propagation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Frequency,
    Recency,
}

fn count(n: usize) -> FactorValue {
    FactorValue::Known(u64::try_from(n).unwrap_or(u64::MAX))
}

/// Assesses the blast radius of planned changes.
#[derive(Clone)]
pub struct BlastRadiusAnalyzer {
    history: Arc<dyn History>,
    config: RiskConfig,
}

impl std::fmt::Debug for BlastRadiusAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlastRadiusAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BlastRadiusAnalyzer {
    /// Creates an analyzer backed by `history`.
    #[must_use]
    pub fn new(history: Arc<dyn History>, config: RiskConfig) -> Self {
        Self { history, config }
    }

    /// Overrides the propagation mode.
    #[must_use]
    pub const fn with_propagation(mut self, mode: PropagationMode) -> Self {
        self.config.propagation = mode;
        self
    }

    /// Overrides the edge view.
    #[must_use]
    pub const fn with_edge_view(mut self, view: EdgeView) -> Self {
        self.config.edge_view = view;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Assesses `changes` against `graph`.
    ///
    /// `no-change` entries do not seed propagation. Entries naming unknown
    /// components are logged and ignored. History lookups that fail or time
    /// out yield unknown factors and lower the confidence level.
    ///
    /// # Errors
    ///
    /// Returns `StackError::CycleDetected` if the graph is cyclic.
    pub async fn assess(&self, graph: &DependencyGraph, changes: &ChangeSet) -> Result<BlastRadiusAssessment> {
        graph.check_acyclic()?;

        let mut changed: Vec<String> = Vec::new();
        for entry in &changes.changes {
            if entry.action == ChangeAction::NoChange {
                continue;
            }
            if !graph.contains(&entry.address) {
                tracing::warn!(component = %entry.address, action = %entry.action, "change names unknown component, ignoring");
                continue;
            }
            if !changed.contains(&entry.address) {
                changed.push(entry.address.clone());
            }
        }

        let edges = propagation::select_edges(graph, self.config.edge_view);
        let addresses = propagation::propagate_changes(&changed, &edges, self.config.propagation);
        tracing::info!(
            changed = changed.len(),
            affected = addresses.len(),
            mode = %self.config.propagation,
            "computed blast radius"
        );

        let paths: Vec<String> = addresses
            .iter()
            .map(|a| graph.component(a).map_or_else(|| a.clone(), |c| c.history_path().to_string()))
            .collect();
        let history = self.lookup_history(&paths).await;

        let direct: HashSet<&str> = changed.iter().map(String::as_str).collect();
        let mut affected = Vec::with_capacity(addresses.len());
        let mut unknown = 0;
        for (i, address) in addresses.iter().enumerate() {
            let Some(component) = graph.component(address) else {
                continue;
            };
            let incoming = graph.incoming_count(address);
            let outgoing = graph.outgoing_count(address);
            let (frequency, recency) = history.get(&i).copied().unwrap_or((FactorValue::Unknown, FactorValue::Unknown));
            let inputs = FactorInputs {
                change_frequency: frequency,
                dependency_count: count(incoming + outgoing),
                structural_complexity: count(component.assignments.len() + component.dependencies.len()),
                criticality: count(incoming),
                change_recency: recency,
            };
            unknown += inputs.unknown_count();

            let is_direct = direct.contains(address.as_str());
            affected.push(AffectedComponent {
                address: address.clone(),
                action: if is_direct {
                    changes.action_for(address).unwrap_or(ChangeAction::NoChange)
                } else {
                    ChangeAction::NoChange
                },
                direct: is_direct,
                criticality: component.criticality.unwrap_or_else(|| derived_criticality(incoming)),
                risk_percentage: factors::risk_percentage(&inputs),
                factors: factors::score_all(&inputs),
            });
        }

        let risk_level = assessment::assess_overall_risk(&affected, &self.config);
        let change_type = assessment::determine_change_type(risk_level, &affected);
        let confidence = ConfidenceLevel::from_unknowns(unknown, affected.len() * FACTORS.len());
        tracing::info!(%risk_level, %change_type, %confidence, "assessed blast radius");

        Ok(BlastRadiusAssessment {
            changed,
            rollback_plan: assessment::rollback_plan(&affected),
            affected,
            risk_level,
            change_type,
            confidence,
            propagation: self.config.propagation,
            edge_view: self.config.edge_view,
            recommendations: assessment::recommendations(risk_level),
            mitigation_steps: assessment::mitigation_steps(risk_level),
            assessed_at: chrono::Utc::now(),
        })
    }

    /// Looks up frequency and recency counts for every path, keyed by index.
    async fn lookup_history(&self, paths: &[String]) -> HashMap<usize, (FactorValue, FactorValue)> {
        let semaphore = Arc::new(Semaphore::new(self.config.history_concurrency.max(1)));
        let limit = self.config.history_timeout();
        let mut tasks: JoinSet<(usize, Window, FactorValue)> = JoinSet::new();

        for (i, path) in paths.iter().enumerate() {
            for window in [Window::Frequency, Window::Recency] {
                let history = Arc::clone(&self.history);
                let semaphore = Arc::clone(&semaphore);
                let path = path.clone();
                let since = match window {
                    Window::Frequency => self.config.frequency_window.clone(),
                    Window::Recency => self.config.recency_window.clone(),
                };
                let _ = tasks.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return (i, window, FactorValue::Unknown);
                    };
                    let value = match tokio::time::timeout(limit, history.commit_count(&path, Some(&since))).await {
                        Ok(Ok(n)) => FactorValue::Known(n),
                        Ok(Err(e)) => {
                            tracing::warn!(%path, window = %since, error = %e, "history lookup failed, factor unknown");
                            FactorValue::Unknown
                        }
                        Err(_) => {
                            tracing::warn!(%path, window = %since, timeout_ms = %limit.as_millis(), "history lookup timed out, factor unknown");
                            FactorValue::Unknown
                        }
                    };
                    (i, window, value)
                });
            }
        }

        let mut results: HashMap<usize, (FactorValue, FactorValue)> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, window, value)) => {
                    let slot = results
                        .entry(i)
                        .or_insert((FactorValue::Unknown, FactorValue::Unknown));
                    match window {
                        Window::Frequency => slot.0 = value,
                        Window::Recency => slot.1 = value,
                    }
                }
                Err(e) => tracing::warn!(error = %e, "history task failed"),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use stackweave_common::error::StackError;
    use stackweave_common::types::{ChangeEntry, Component, Criticality, ModuleDescriptor};
    use stackweave_compose::graph;

    use super::*;
    use crate::assessment::{ChangeType, RiskLevel};
    use crate::history::{NoHistory, StaticHistory};

    struct SlowHistory;

    #[async_trait]
    impl History for SlowHistory {
        async fn commit_count(&self, _path: &str, _since: Option<&str>) -> Result<u64> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(100)
        }
    }

    fn comp(address: &str) -> Component {
        Component::new(address, ModuleDescriptor::new("acme", address, "aws"))
    }

    fn stack() -> DependencyGraph {
        graph::build(vec![
            comp("vpc"),
            comp("sg").depends_on("vpc"),
            comp("ec2").depends_on("vpc").depends_on("sg"),
        ])
        .graph
    }

    fn update(address: &str) -> ChangeSet {
        ChangeSet::new(vec![ChangeEntry::new(address, ChangeAction::Update)])
    }

    fn addresses(a: &BlastRadiusAssessment) -> Vec<&str> {
        a.affected.iter().map(|c| c.address.as_str()).collect()
    }

    #[tokio::test]
    async fn last_declared_view_reproduces_single_hop_snapshot() {
        let analyzer = BlastRadiusAnalyzer::new(Arc::new(NoHistory), RiskConfig::default())
            .with_edge_view(EdgeView::LastDeclared);
        let result = analyzer.assess(&stack(), &update("vpc")).await.expect("assess");
        assert_eq!(addresses(&result), vec!["vpc", "sg"]);
        assert!(result.affected[0].direct);
        assert_eq!(result.affected[1].action, ChangeAction::NoChange);
        assert!(!result.affected[1].direct);
    }

    #[tokio::test]
    async fn default_view_includes_direct_dependents() {
        let analyzer = BlastRadiusAnalyzer::new(Arc::new(NoHistory), RiskConfig::default());
        let result = analyzer.assess(&stack(), &update("vpc")).await.expect("assess");
        assert_eq!(addresses(&result), vec!["vpc", "sg", "ec2"]);
    }

    #[tokio::test]
    async fn unknown_and_no_change_entries_do_not_seed() {
        let analyzer = BlastRadiusAnalyzer::new(Arc::new(NoHistory), RiskConfig::default());
        let changes = ChangeSet::new(vec![
            ChangeEntry::new("ghost", ChangeAction::Update),
            ChangeEntry::new("vpc", ChangeAction::NoChange),
            ChangeEntry::new("ec2", ChangeAction::Update),
        ]);
        let result = analyzer.assess(&stack(), &changes).await.expect("assess");
        assert_eq!(result.changed, vec!["ec2"]);
        assert_eq!(addresses(&result), vec!["ec2"]);
    }

    #[tokio::test]
    async fn cycle_is_fatal() {
        let g = graph::build(vec![comp("a").depends_on("b"), comp("b").depends_on("a")]).graph;
        let analyzer = BlastRadiusAnalyzer::new(Arc::new(NoHistory), RiskConfig::default());
        let err = analyzer.assess(&g, &update("a")).await.unwrap_err();
        assert!(matches!(err, StackError::CycleDetected { .. }));
    }

    #[tokio::test]
    async fn delete_is_emergency_with_restore_step() {
        let analyzer = BlastRadiusAnalyzer::new(Arc::new(NoHistory), RiskConfig::default());
        let changes = ChangeSet::new(vec![ChangeEntry::new("ec2", ChangeAction::Delete)]);
        let result = analyzer.assess(&stack(), &changes).await.expect("assess");
        assert_eq!(result.change_type, ChangeType::Emergency);
        assert!(result.rollback_plan.iter().any(|s| s.contains("Restore deleted resources")));
    }

    #[tokio::test]
    async fn known_history_raises_confidence() {
        let mut config = RiskConfig::default();
        config.frequency_window = "90.days".into();
        config.recency_window = "7.days".into();
        let history = StaticHistory::new()
            .with_count("vpc", Some("90.days"), 60)
            .with_count("vpc", Some("7.days"), 6);
        let analyzer = BlastRadiusAnalyzer::new(Arc::new(history), config)
            .with_propagation(PropagationMode::HopLimited(0));
        let result = analyzer.assess(&stack(), &update("vpc")).await.expect("assess");
        assert_eq!(result.confidence, ConfidenceLevel::High);
        let vpc = &result.affected[0];
        // frequency 1.0, deps(2) 0.5, complexity(0) 0.1, criticality(2) 0.6, recency 1.0
        let expected = 100.0 * (0.30 + 0.25 * 0.5 + 0.20 * 0.1 + 0.15 * 0.6 + 0.10);
        assert!((vpc.risk_percentage - expected).abs() < 1e-9, "{}", vpc.risk_percentage);
        assert_eq!(vpc.criticality, Criticality::Medium);
    }

    #[tokio::test]
    async fn timed_out_lookup_scores_like_neutral_unknown() {
        let mut config = RiskConfig::default();
        config.history_timeout_ms = 20;
        let slow = BlastRadiusAnalyzer::new(Arc::new(SlowHistory), config.clone());
        let none = BlastRadiusAnalyzer::new(Arc::new(NoHistory), config);

        let timed_out = slow.assess(&stack(), &update("vpc")).await.expect("assess");
        let unknown = none.assess(&stack(), &update("vpc")).await.expect("assess");
        assert_eq!(timed_out.confidence, ConfidenceLevel::Medium);
        for (a, b) in timed_out.affected.iter().zip(&unknown.affected) {
            assert!((a.risk_percentage - b.risk_percentage).abs() < 1e-9);
            assert!(a.factors[0].value.is_unknown());
        }
    }

    #[tokio::test]
    async fn declared_critical_component_makes_risk_critical() {
        let mut vpc = comp("vpc");
        vpc.criticality = Some(Criticality::Critical);
        let g = graph::build(vec![vpc, comp("sg").depends_on("vpc")]).graph;
        let analyzer = BlastRadiusAnalyzer::new(Arc::new(NoHistory), RiskConfig::default());
        let result = analyzer.assess(&g, &update("vpc")).await.expect("assess");
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert_eq!(result.change_type, ChangeType::Emergency);
    }
}
