//! Mock output synthesis.
//!
//! Placeholder values let a dependent component validate and plan before
//! the component it depends on has been deployed.

use serde_json::Value;
use stackweave_common::constants::MOCK_CIDR;
use stackweave_common::types::TypeTag;

fn has_token(name: &str, wanted: &[&str]) -> bool {
    name.split(|c: char| c == '_' || c == '-')
        .any(|t| wanted.contains(&t))
}

fn placeholder_list(name: &str) -> Value {
    Value::Array(vec![
        Value::String(format!("mock-{name}-1")),
        Value::String(format!("mock-{name}-2")),
    ])
}

/// Synthesizes a mock value for the output `name` of type `type_tag`.
///
/// Name rules win over the type, checked in order: identifiers and ARNs
/// give a single placeholder string, subnets a two-element list, CIDR and IP
/// names a fixed example CIDR. Otherwise maps give `{}`, lists and sets a
/// two-element list, and everything else a placeholder string.
#[must_use]
pub fn mock_output(name: &str, type_tag: TypeTag) -> Value {
    let lower = name.to_ascii_lowercase();
    if has_token(&lower, &["id", "ids", "arn", "arns"]) {
        Value::String(format!("mock-{name}"))
    } else if lower.contains("subnet") {
        placeholder_list(name)
    } else if lower.contains("cidr") || has_token(&lower, &["ip", "ips"]) {
        Value::String(MOCK_CIDR.to_string())
    } else if type_tag.is_map_like() {
        Value::Object(serde_json::Map::new())
    } else if type_tag.is_list_like() {
        placeholder_list(name)
    } else {
        Value::String(format!("mock-{name}"))
    }
}
