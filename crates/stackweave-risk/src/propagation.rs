//! Change propagation over dependency edges.

use std::collections::HashSet;

use stackweave_common::config::{EdgeView, PropagationMode};
use stackweave_compose::graph::{DependencyEdge, DependencyGraph};

/// Selects the edges of `graph` that feed propagation.
///
/// [`EdgeView::LastDeclared`] keeps, for each dependent, only the edge to
/// its last-declared dependency.
#[must_use]
pub fn select_edges(graph: &DependencyGraph, view: EdgeView) -> Vec<DependencyEdge> {
    match view {
        EdgeView::All => graph.edges().to_vec(),
        EdgeView::LastDeclared => graph
            .components()
            .filter_map(|c| {
                graph
                    .dependencies_of(&c.address)
                    .last()
                    .map(|dep| DependencyEdge::new(c.address.as_str(), dep.as_str()))
            })
            .collect(),
    }
}

/// Returns the addresses affected by a change to `changed`.
///
/// The result starts with the changed addresses in input order, followed by
/// the dependents discovered hop by hop, in edge order within each hop.
/// Each hop follows edges whose `depends_on` was reached by the previous
/// hop, so a single hop reaches exactly the direct dependents of the
/// changed set regardless of edge order.
#[must_use]
pub fn propagate_changes(changed: &[String], edges: &[DependencyEdge], mode: PropagationMode) -> Vec<String> {
    let mut affected: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for address in changed {
        if seen.insert(address.clone()) {
            affected.push(address.clone());
        }
    }

    let max_hops = mode.max_hops();
    let mut frontier: HashSet<String> = seen.clone();
    let mut hop = 0_u32;
    while !frontier.is_empty() && max_hops.is_none_or(|max| hop < max) {
        let mut next = HashSet::new();
        for edge in edges {
            if frontier.contains(&edge.depends_on) && seen.insert(edge.dependent.clone()) {
                affected.push(edge.dependent.clone());
                let _ = next.insert(edge.dependent.clone());
            }
        }
        frontier = next;
        hop += 1;
    }

    tracing::debug!(changed = changed.len(), affected = affected.len(), %mode, hops = hop, "propagated changes");
    affected
}
