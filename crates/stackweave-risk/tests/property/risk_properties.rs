use proptest::prelude::*;
use stackweave_common::config::PropagationMode;
use stackweave_common::types::{ChangeAction, Criticality};
use stackweave_compose::graph::DependencyEdge;
use stackweave_risk::assessment::{self, AffectedComponent, ChangeType, RiskLevel};
use stackweave_risk::factors::{self, FACTORS, FactorInputs, FactorKind, FactorValue};
use stackweave_risk::propagation::propagate_changes;

fn factor_value() -> impl Strategy<Value = FactorValue> {
    prop_oneof![
        (0u64..10_000).prop_map(FactorValue::Known),
        Just(FactorValue::Unknown),
    ]
}

fn inputs() -> impl Strategy<Value = FactorInputs> {
    (factor_value(), factor_value(), factor_value(), factor_value(), factor_value()).prop_map(
        |(change_frequency, dependency_count, structural_complexity, criticality, change_recency)| FactorInputs {
            change_frequency,
            dependency_count,
            structural_complexity,
            criticality,
            change_recency,
        },
    )
}

fn risk_level() -> impl Strategy<Value = RiskLevel> {
    prop::sample::select(vec![RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical])
}

fn component(address: String, action: ChangeAction, risk: f64) -> AffectedComponent {
    AffectedComponent {
        address,
        action,
        direct: true,
        criticality: Criticality::Low,
        risk_percentage: risk,
        factors: Vec::new(),
    }
}

proptest! {
    #[test]
    fn risk_percentage_stays_in_range(inputs in inputs()) {
        let risk = factors::risk_percentage(&inputs);
        prop_assert!((0.0..=100.0).contains(&risk), "risk {risk}");
    }

    #[test]
    fn every_bucket_is_monotonic(a in 0u64..200, b in 0u64..200) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        for f in &FACTORS {
            prop_assert!(f.score(FactorValue::Known(lo)) <= f.score(FactorValue::Known(hi)), "{:?}", f.kind);
        }
    }

    #[test]
    fn dependency_count_is_high_from_ten(n in 10u64..1_000) {
        let f = factors::definition(FactorKind::DependencyCount);
        prop_assert!(f.score(FactorValue::Known(n)) >= 0.9);
    }

    #[test]
    fn delete_forces_emergency(risk in risk_level(), others in prop::collection::vec(0.0f64..100.0, 0..8)) {
        let mut affected: Vec<AffectedComponent> = others
            .into_iter()
            .enumerate()
            .map(|(i, r)| component(format!("c{i}"), ChangeAction::Update, r))
            .collect();
        affected.push(component("gone".into(), ChangeAction::Delete, 0.0));
        prop_assert_eq!(assessment::determine_change_type(risk, &affected), ChangeType::Emergency);
    }

    #[test]
    fn single_hop_reaches_every_direct_dependent(
        raw_edges in prop::collection::vec((0u8..8, 0u8..8), 0..20),
        seeds in prop::collection::vec(0u8..8, 1..4),
    ) {
        let edges: Vec<DependencyEdge> = raw_edges
            .iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| DependencyEdge::new(format!("n{a}"), format!("n{b}")))
            .collect();
        let changed: Vec<String> = seeds.iter().map(|s| format!("n{s}")).collect();
        let affected = propagate_changes(&changed, &edges, PropagationMode::SingleHop);
        for edge in &edges {
            if changed.contains(&edge.depends_on) {
                prop_assert!(affected.contains(&edge.dependent), "missing {}", edge.dependent);
            }
        }
        for seed in &changed {
            prop_assert!(affected.contains(seed));
        }
    }
}
