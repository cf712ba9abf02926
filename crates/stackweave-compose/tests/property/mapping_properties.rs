use std::collections::BTreeMap;

use proptest::prelude::*;
use stackweave_common::types::{AssignmentValue, Component, ModuleDescriptor, TypeTag, VariableDefinition};
use stackweave_compose::graph;
use stackweave_compose::mapper::{self, VariableMapper};

fn type_tag() -> impl Strategy<Value = TypeTag> {
    prop::sample::select(TypeTag::ALL.to_vec())
}

fn list_like() -> impl Strategy<Value = TypeTag> {
    prop::sample::select(vec![TypeTag::List, TypeTag::Set])
}

proptest! {
    #[test]
    fn identical_types_always_score_one(t in type_tag()) {
        prop_assert!((mapper::type_score(t, t) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn list_bool_incompatibility_is_symmetric(t in list_like()) {
        prop_assert!(mapper::type_score(t, TypeTag::Bool).abs() < f64::EPSILON);
        prop_assert!(mapper::type_score(TypeTag::Bool, t).abs() < f64::EPSILON);
    }

    #[test]
    fn description_score_stays_in_unit_range(a in "[a-z ]{0,60}", b in "[a-z ]{0,60}", t in type_tag()) {
        let source = VariableDefinition::new("s", t, a);
        let target = VariableDefinition::new("t", t, b);
        let score = mapper::description_score(&source, &target);
        prop_assert!((0.0..=1.0).contains(&score), "score {score}");
    }

    #[test]
    fn bool_inputs_never_receive_lists(desc in "[a-z ]{0,40}", names in prop::collection::vec("[a-z_]{1,12}", 1..6)) {
        let source = VariableDefinition::new("items", TypeTag::List, desc.clone());
        let targets: BTreeMap<String, VariableDefinition> = names
            .into_iter()
            .map(|n| (n.clone(), VariableDefinition::new(n, TypeTag::Bool, desc.clone())))
            .collect();
        prop_assert!(VariableMapper::default().infer_mapping(&source, &targets).is_none());
    }

    #[test]
    fn chains_order_dependencies_first(len in 1usize..12) {
        let components: Vec<Component> = (0..len)
            .map(|i| {
                let c = Component::new(format!("c{i}"), ModuleDescriptor::new("acme", "m", "aws"));
                if i == 0 {
                    c
                } else {
                    c.assign("input", AssignmentValue::reference(&format!("c{}.out", i - 1)).expect("ref"))
                }
            })
            .rev()
            .collect();
        let build = graph::build(components);
        prop_assert!(build.is_clean());
        let order = build.graph.deployment_order().expect("acyclic");
        let expected: Vec<String> = (0..len).map(|i| format!("c{i}")).collect();
        prop_assert_eq!(order, expected);
    }
}
