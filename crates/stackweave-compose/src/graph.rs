//! Dependency graph management using `petgraph`.
//!
//! Builds a directed graph from component declarations, both explicit
//! dependency lists and implicit `<component>.<output>` references, and
//! resolves cycle checks and topological ordering for deployment.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use stackweave_common::error::{Result, StackError};
use stackweave_common::types::Component;

/// A directed edge: `dependent` depends on `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Component that consumes the dependency.
    pub dependent: String,
    /// Component being depended on.
    pub depends_on: String,
}

impl DependencyEdge {
    /// Creates an edge.
    #[must_use]
    pub fn new(dependent: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            depends_on: depends_on.into(),
        }
    }
}

/// A dependency graph of components.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Internal petgraph representation; edges point dependency -> dependent.
    graph: petgraph::Graph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    components: Vec<Component>,
    edges: Vec<DependencyEdge>,
    dependencies: HashMap<String, Vec<String>>,
    dependents: HashMap<String, Vec<String>>,
}

/// A declaration error scoped to one component.
#[derive(Debug)]
pub struct BuildFailure {
    /// Address of the offending component.
    pub component: String,
    /// What was wrong with it.
    pub error: StackError,
}

/// A declaration dropped because an earlier one already took its address.
#[derive(Debug)]
pub struct DuplicateDeclaration {
    /// Position of the dropped declaration in the input.
    pub position: usize,
    /// The error attributed to the dropped declaration.
    pub failure: BuildFailure,
}

/// Result of building a graph: the graph plus per-component failures.
#[derive(Debug)]
pub struct GraphBuild {
    /// The graph, containing the first declaration of every address.
    pub graph: DependencyGraph,
    /// Failures of components in the graph, each scoped to one component.
    pub failures: Vec<BuildFailure>,
    /// Later declarations of an address already in the graph, in input order.
    pub duplicates: Vec<DuplicateDeclaration>,
}

impl GraphBuild {
    /// Whether every component was declared without errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.duplicates.is_empty()
    }

    /// Addresses of graph components with at least one failure.
    ///
    /// A duplicate declaration does not mark the kept first declaration.
    #[must_use]
    pub fn failed_components(&self) -> HashSet<&str> {
        self.failures.iter().map(|f| f.component.as_str()).collect()
    }
}

/// Builds a dependency graph from component declarations.
///
/// Explicit dependencies and references both become edges, deduplicated per
/// target. The first declaration of an address wins and later ones are
/// reported as duplicates. Self-dependencies and references to unknown
/// components are reported per component; the rest of the batch still builds.
/// Cycles are not checked here; see [`DependencyGraph::check_acyclic`].
#[must_use]
pub fn build(components: Vec<Component>) -> GraphBuild {
    let mut graph = DependencyGraph::new();
    let mut failures = Vec::new();
    let mut duplicates = Vec::new();

    for (position, component) in components.into_iter().enumerate() {
        if graph.contains(&component.address) {
            tracing::warn!(component = %component.address, position, "duplicate component address");
            duplicates.push(DuplicateDeclaration {
                position,
                failure: BuildFailure {
                    error: StackError::Config {
                        message: format!("duplicate component address: \"{}\"", component.address),
                    },
                    component: component.address,
                },
            });
            continue;
        }
        let _ = graph.add_component(component);
    }

    let declared: Vec<(String, Vec<String>)> = graph
        .components
        .iter()
        .map(|c| (c.address.clone(), referenced_components(c)))
        .collect();

    for (address, targets) in declared {
        for target in targets {
            if target == address {
                failures.push(BuildFailure {
                    component: address.clone(),
                    error: StackError::Config {
                        message: format!("component \"{address}\" depends on itself"),
                    },
                });
            } else if !graph.contains(&target) {
                tracing::warn!(component = %address, reference = %target, "unresolved dependency");
                failures.push(BuildFailure {
                    component: address.clone(),
                    error: StackError::UnresolvedDependency {
                        component: address.clone(),
                        reference: target,
                    },
                });
            } else {
                graph.add_dependency(&address, &target);
            }
        }
    }

    tracing::info!(
        components = graph.len(),
        edges = graph.edges.len(),
        failures = failures.len(),
        duplicates = duplicates.len(),
        "built dependency graph"
    );
    GraphBuild {
        graph,
        failures,
        duplicates,
    }
}

/// Components a declaration depends on: explicit entries first, then
/// references in assignment order, without repeats.
fn referenced_components(component: &Component) -> Vec<String> {
    let mut seen = HashSet::new();
    component
        .dependencies
        .iter()
        .map(String::as_str)
        .chain(component.assignments.references().map(|(_, r)| r.component.as_str()))
        .filter(|t| seen.insert(*t))
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component node to the graph.
    ///
    /// Node indices follow insertion order, so a node's index is also its
    /// position in the component list.
    pub fn add_component(&mut self, component: Component) -> NodeIndex {
        let idx = self.graph.add_node(component.address.clone());
        let _ = self.nodes.insert(component.address.clone(), idx);
        let _ = self.dependencies.insert(component.address.clone(), Vec::new());
        let _ = self.dependents.insert(component.address.clone(), Vec::new());
        self.components.push(component);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The petgraph edge points from `dependency` to `dependent` so that
    /// topological sort yields dependencies first. Unknown addresses and
    /// repeated edges are ignored.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        let (Some(&from), Some(&to)) = (self.nodes.get(dependency), self.nodes.get(dependent)) else {
            return;
        };
        if self.graph.contains_edge(from, to) {
            return;
        }
        let _ = self.graph.add_edge(from, to, ());
        self.edges.push(DependencyEdge::new(dependent, dependency));
        if let Some(deps) = self.dependencies.get_mut(dependent) {
            deps.push(dependency.to_string());
        }
        if let Some(users) = self.dependents.get_mut(dependency) {
            users.push(dependent.to_string());
        }
    }

    /// Whether a component with this address exists.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains_key(address)
    }

    /// Returns the component with this address.
    #[must_use]
    pub fn component(&self, address: &str) -> Option<&Component> {
        self.nodes
            .get(address)
            .and_then(|idx| self.components.get(idx.index()))
    }

    /// Components in declaration order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// Edges in discovery order.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the graph has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components `address` depends on (outgoing edges), in declaration order.
    #[must_use]
    pub fn dependencies_of(&self, address: &str) -> &[String] {
        self.dependencies.get(address).map_or(&[], Vec::as_slice)
    }

    /// Components depending on `address` (incoming edges), in discovery order.
    #[must_use]
    pub fn dependents_of(&self, address: &str) -> &[String] {
        self.dependents.get(address).map_or(&[], Vec::as_slice)
    }

    /// Number of components depending on `address`.
    #[must_use]
    pub fn incoming_count(&self, address: &str) -> usize {
        self.dependents_of(address).len()
    }

    /// Number of components `address` depends on.
    #[must_use]
    pub fn outgoing_count(&self, address: &str) -> usize {
        self.dependencies_of(address).len()
    }

    /// Verifies the graph is acyclic.
    ///
    /// Acyclic graphs are confirmed by `petgraph`'s topological sort. When it
    /// finds a cycle, a depth-first search over dependencies in declaration
    /// order recovers the path, using an explicit stack so deep chains cannot
    /// exhaust the thread stack.
    ///
    /// # Errors
    ///
    /// Returns `StackError::CycleDetected` with the cycle's members in
    /// traversal order, the first member repeated at the end.
    pub fn check_acyclic(&self) -> Result<()> {
        if petgraph::algo::toposort(&self.graph, None).is_ok() {
            return Ok(());
        }
        let mut state: HashMap<&str, Visit> = HashMap::new();
        // Each frame is a component on the current path and the index of
        // its next dependency to visit.
        let mut stack: Vec<(&str, usize)> = Vec::new();
        for component in &self.components {
            let root = component.address.as_str();
            if state.contains_key(root) {
                continue;
            }
            let _ = state.insert(root, Visit::InProgress);
            stack.push((root, 0));
            while let Some(frame) = stack.last_mut() {
                let (address, cursor) = *frame;
                let Some(next) = self.dependencies_of(address).get(cursor) else {
                    let _ = stack.pop();
                    let _ = state.insert(address, Visit::Done);
                    continue;
                };
                let next = next.as_str();
                frame.1 += 1;
                match state.get(next) {
                    Some(Visit::InProgress) => {
                        let start = stack.iter().position(|(p, _)| *p == next).unwrap_or(0);
                        let mut members: Vec<String> =
                            stack[start..].iter().map(|(p, _)| (*p).to_string()).collect();
                        members.push(next.to_string());
                        return Err(StackError::CycleDetected { members });
                    }
                    Some(Visit::Done) => {}
                    None => {
                        let _ = state.insert(next, Visit::InProgress);
                        stack.push((next, 0));
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns a topological ordering of components for deployment.
    ///
    /// Dependencies appear before the components that depend on them.
    ///
    /// # Errors
    ///
    /// Returns `StackError::CycleDetected` if the graph contains cycles.
    pub fn deployment_order(&self) -> Result<Vec<String>> {
        self.check_acyclic()?;
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(StackError::CycleDetected {
                members: self
                    .graph
                    .node_weight(cycle.node_id())
                    .cloned()
                    .into_iter()
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use stackweave_common::types::{AssignmentValue, ModuleDescriptor};

    use super::*;

    fn comp(address: &str) -> Component {
        Component::new(address, ModuleDescriptor::new("acme", address, "aws"))
    }

    fn wired(address: &str, input: &str, reference: &str) -> Component {
        comp(address).assign(input, AssignmentValue::reference(reference).expect("ref"))
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = build(Vec::new()).graph;
        let order = graph.deployment_order().expect("should resolve");
        assert!(order.is_empty());
    }

    #[test]
    fn single_node_resolves() {
        let graph = build(vec![comp("vpc")]).graph;
        let order = graph.deployment_order().expect("should resolve");
        assert_eq!(order, vec!["vpc"]);
    }

    #[test]
    fn linear_dependency_chain() {
        let graph = build(vec![comp("app").depends_on("db"), comp("db")]).graph;
        let order = graph.deployment_order().expect("should resolve");
        let app_pos = order.iter().position(|n| n == "app").expect("app");
        let db_pos = order.iter().position(|n| n == "db").expect("db");
        assert!(db_pos < app_pos, "db should come before app: {order:?}");
    }

    #[test]
    fn diamond_dependency() {
        let graph = build(vec![
            comp("a").depends_on("b").depends_on("c"),
            comp("b").depends_on("d"),
            comp("c").depends_on("d"),
            comp("d"),
        ])
        .graph;

        let order = graph.deployment_order().expect("should resolve");
        assert_eq!(order.len(), 4);
        let pos = |name: &str| order.iter().position(|n| n == name).expect(name);
        assert!(pos("d") < pos("b"));
        assert!(pos("d") < pos("c"));
        assert!(pos("b") < pos("a"));
        assert!(pos("c") < pos("a"));
    }

    #[test]
    fn references_create_implicit_edges() {
        let result = build(vec![comp("vpc"), wired("sg", "vpc_id", "vpc.vpc_id")]);
        assert!(result.is_clean());
        assert_eq!(result.graph.edges(), &[DependencyEdge::new("sg", "vpc")]);
        assert_eq!(result.graph.dependents_of("vpc"), &["sg".to_string()]);
        assert_eq!(result.graph.incoming_count("vpc"), 1);
        assert_eq!(result.graph.outgoing_count("sg"), 1);
    }

    #[test]
    fn explicit_and_implicit_edges_deduplicate() {
        let ec2 = wired("ec2", "vpc_id", "vpc.vpc_id")
            .depends_on("vpc")
            .assign("subnet_id", AssignmentValue::reference("vpc.public_subnets").expect("ref"));
        let graph = build(vec![comp("vpc"), ec2]).graph;
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.dependencies_of("ec2"), &["vpc".to_string()]);
    }

    #[test]
    fn unresolved_reference_is_reported_per_component() {
        let result = build(vec![
            comp("vpc"),
            wired("sg", "vpc_id", "ghost.vpc_id"),
            wired("db", "vpc_id", "vpc.vpc_id"),
        ]);
        assert_eq!(result.failures.len(), 1);
        assert!(matches!(
            &result.failures[0].error,
            StackError::UnresolvedDependency { component, reference }
                if component == "sg" && reference == "ghost"
        ));
        assert_eq!(result.failed_components(), HashSet::from(["sg"]));
        assert!(result.graph.contains("sg"));
        assert_eq!(result.graph.dependencies_of("db"), &["vpc".to_string()]);
    }

    #[test]
    fn duplicate_and_self_dependency_rejected() {
        let result = build(vec![comp("vpc"), comp("vpc"), comp("sg").depends_on("sg")]);
        assert!(!result.is_clean());
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failed_components(), HashSet::from(["sg"]));
        assert_eq!(result.graph.len(), 2);
        assert!(result.graph.edges().is_empty());
    }

    #[test]
    fn duplicate_is_attributed_to_the_later_declaration() {
        let first = comp("vpc").assign("cidr", AssignmentValue::Literal("10.0.0.0/16".into()));
        let result = build(vec![first, comp("sg"), comp("vpc")]);
        assert_eq!(result.duplicates.len(), 1);
        let duplicate = &result.duplicates[0];
        assert_eq!(duplicate.position, 2);
        assert_eq!(duplicate.failure.component, "vpc");
        assert!(duplicate.failure.error.to_string().contains("duplicate component address"));

        let kept = result.graph.component("vpc").expect("kept");
        assert_eq!(kept.assignments.len(), 1);
        assert!(result.failed_components().is_empty());
    }

    #[test]
    fn component_lookup_uses_address_index() {
        let graph = build((0..50).map(|i| comp(&format!("c{i}"))).collect()).graph;
        assert_eq!(graph.component("c37").map(|c| c.address.as_str()), Some("c37"));
        assert_eq!(graph.component("c0").map(|c| c.address.as_str()), Some("c0"));
        assert!(graph.component("c50").is_none());
    }

    #[test]
    fn long_chain_resolves_without_recursion() {
        let n = 10_000;
        let components: Vec<Component> = (0..n)
            .map(|i| {
                let c = comp(&format!("c{i}"));
                if i == 0 { c } else { c.depends_on(format!("c{}", i - 1)) }
            })
            .collect();
        let graph = build(components).graph;
        graph.check_acyclic().expect("chain is acyclic");
        let order = graph.deployment_order().expect("should resolve");
        assert_eq!(order.len(), n);
        assert_eq!(order.first().map(String::as_str), Some("c0"));
        assert_eq!(order.last().map(String::as_str), Some("c9999"));
    }

    #[test]
    fn long_cycle_reports_every_member() {
        let n = 10_000;
        let components: Vec<Component> = (0..n)
            .map(|i| comp(&format!("c{i}")).depends_on(format!("c{}", (i + 1) % n)))
            .collect();
        let graph = build(components).graph;
        match graph.check_acyclic() {
            Err(StackError::CycleDetected { members }) => {
                assert_eq!(members.len(), n + 1);
                assert_eq!(members.first(), members.last());
                assert_eq!(members[1], "c1");
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn cycle_detection() {
        let graph = build(vec![comp("a").depends_on("b"), comp("b").depends_on("a")]).graph;
        let err = graph.check_acyclic().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cyclic"), "got: {msg}");
        assert!(graph.deployment_order().is_err());
    }

    #[test]
    fn three_node_cycle_names_members() {
        let graph = build(vec![
            comp("entry").depends_on("a"),
            comp("a").depends_on("b"),
            comp("b").depends_on("c"),
            comp("c").depends_on("a"),
        ])
        .graph;

        match graph.check_acyclic() {
            Err(StackError::CycleDetected { members }) => {
                assert_eq!(members, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn independent_nodes_all_present() {
        let graph = build(vec![comp("x"), comp("y"), comp("z")]).graph;
        let order = graph.deployment_order().expect("should resolve");
        assert_eq!(order.len(), 3);
        assert!(order.contains(&"x".to_string()));
        assert!(order.contains(&"y".to_string()));
        assert!(order.contains(&"z".to_string()));
    }
}
