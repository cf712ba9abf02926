//! Variable mapping between module interfaces.
//!
//! Decides which input of a consuming module should receive a given output
//! of a producing module, by exact name, by a weighted score over type
//! compatibility, description context and known wiring patterns, or by a
//! pattern-only fallback.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stackweave_common::constants::DEFAULT_MATCH_THRESHOLD;
use stackweave_common::types::{TypeTag, VariableDefinition};

use crate::patterns::{self, DOMAIN_TERMS, PATTERNS};

/// Weight of the type score in the combined score.
pub const TYPE_WEIGHT: f64 = 0.4;
/// Weight of the description score in the combined score.
pub const DESCRIPTION_WEIGHT: f64 = 0.4;
/// Weight of the pattern score in the combined score.
pub const PATTERN_WEIGHT: f64 = 0.2;
/// Pattern score awarded when a candidate is a related input of a matching pattern.
pub const PATTERN_BONUS: f64 = 1.0;

const STRUCTURAL_HINT_BOOST: f64 = 1.2;
const PATTERN_TERM_BOOST: f64 = 1.3;

const LIST_HINTS: &[&str] = &["list", "lists", "array", "arrays", "ids", "multiple", "set"];
const BOOL_HINTS: &[&str] = &[
    "enable", "enabled", "disable", "disabled", "whether", "flag", "toggle", "true", "false",
];

/// How a target input was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    /// Same name and identical type.
    Exact,
    /// Best combined score above the threshold.
    Scored,
    /// Type-compatible related input of a matching pattern.
    PatternFallback,
    /// No inference; the declared input name was kept.
    Declared,
}

/// A chosen target input and its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Target input name.
    pub target: String,
    /// Confidence in `[0, 1]`.
    pub score: f64,
    /// How the target was chosen.
    pub kind: MatchKind,
}

/// Type compatibility between a source and a target type.
///
/// `1.0` for identical types, `0.8` between list-like types, `0.0` between
/// list-like and boolean types (in either order), `0.1` for any other pair.
/// Map and object are not a family: they score `0.1` against each other.
#[must_use]
pub fn type_score(source: TypeTag, target: TypeTag) -> f64 {
    if source == target {
        1.0
    } else if (source.is_list_like() && target.is_bool_like())
        || (source.is_bool_like() && target.is_list_like())
    {
        0.0
    } else if source.is_list_like() && target.is_list_like() {
        0.8
    } else {
        0.1
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Extracts the keyword set of a description.
///
/// Keeps domain terms of any length and other tokens longer than three characters.
#[must_use]
pub fn extract_keywords(description: &str) -> BTreeSet<String> {
    tokens(description)
        .filter(|t| t.len() > 3 || DOMAIN_TERMS.contains(&t.as_str()))
        .collect()
}

fn signals(description: &str, hints: &[&str]) -> bool {
    tokens(description).any(|t| hints.contains(&t.as_str()))
}

fn structural_hints_for(type_tag: TypeTag) -> Option<&'static [&'static str]> {
    if type_tag.is_list_like() {
        Some(LIST_HINTS)
    } else if type_tag.is_bool_like() {
        Some(BOOL_HINTS)
    } else {
        None
    }
}

/// Description context score between two variables, clamped to `[0, 1]`.
#[must_use]
pub fn description_score(source: &VariableDefinition, target: &VariableDefinition) -> f64 {
    let source_terms = extract_keywords(&source.description);
    let target_terms = extract_keywords(&target.description);
    let denominator = source_terms.len().max(target_terms.len());
    if denominator == 0 {
        return 0.0;
    }

    let shared: Vec<&String> = source_terms.intersection(&target_terms).collect();
    #[allow(clippy::cast_precision_loss)]
    let mut score = shared.len() as f64 / denominator as f64;

    let hinted = structural_hints_for(source.type_tag).is_some_and(|hints| {
        signals(&source.description, hints) && signals(&target.description, hints)
    });
    if hinted {
        score *= STRUCTURAL_HINT_BOOST;
    }
    if shared.iter().any(|t| patterns::is_pattern_term(t)) {
        score *= PATTERN_TERM_BOOST;
    }
    score.min(1.0)
}

/// Pattern score of wiring a `source_type` value into the input `target_name`.
#[must_use]
pub fn pattern_score(source_type: TypeTag, target_name: &str) -> f64 {
    if PATTERNS
        .iter()
        .any(|p| p.carries(source_type) && p.relates_to(target_name))
    {
        PATTERN_BONUS
    } else {
        0.0
    }
}

/// Combined score of a candidate, or `None` when the types are incompatible.
#[must_use]
pub fn combined_score(source: &VariableDefinition, target_name: &str, target: &VariableDefinition) -> Option<f64> {
    let ts = type_score(source.type_tag, target.type_tag);
    if ts <= 0.0 {
        return None;
    }
    let ds = description_score(source, target);
    let ps = pattern_score(source.type_tag, target_name);
    Some(TYPE_WEIGHT.mul_add(ts, DESCRIPTION_WEIGHT.mul_add(ds, PATTERN_WEIGHT * ps)))
}

/// Chooses target inputs for source outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableMapper {
    threshold: f64,
}

impl VariableMapper {
    /// Creates a mapper with the given scored-match threshold.
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Scored-match threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the name of the input that should receive `source`, if any.
    #[must_use]
    pub fn infer_mapping(
        &self,
        source: &VariableDefinition,
        targets: &BTreeMap<String, VariableDefinition>,
    ) -> Option<String> {
        self.infer_match(source, targets).map(|m| m.target)
    }

    /// Like [`Self::infer_mapping`] but also reports the score and match kind.
    #[must_use]
    pub fn infer_match(
        &self,
        source: &VariableDefinition,
        targets: &BTreeMap<String, VariableDefinition>,
    ) -> Option<Match> {
        if targets
            .get(&source.name)
            .is_some_and(|t| t.type_tag == source.type_tag)
        {
            return Some(Match {
                target: source.name.clone(),
                score: 1.0,
                kind: MatchKind::Exact,
            });
        }

        find_best_match(source, targets, self.threshold).or_else(|| pattern_fallback(source, targets))
    }
}

impl Default for VariableMapper {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

/// Returns the highest-scoring candidate whose combined score exceeds `threshold`.
///
/// Candidates are visited in name order and only a strictly higher score
/// replaces the current best, so ties go to the lexicographically smallest name.
#[must_use]
pub fn find_best_match(
    source: &VariableDefinition,
    targets: &BTreeMap<String, VariableDefinition>,
    threshold: f64,
) -> Option<Match> {
    let mut best: Option<Match> = None;
    for (name, target) in targets {
        let Some(score) = combined_score(source, name, target) else {
            tracing::debug!(source = %source.name, candidate = %name, "incompatible types");
            continue;
        };
        tracing::debug!(source = %source.name, candidate = %name, score, "scored candidate");
        if score <= threshold {
            continue;
        }
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(Match {
                target: name.clone(),
                score,
                kind: MatchKind::Scored,
            });
        }
    }
    best
}

fn pattern_fallback(
    source: &VariableDefinition,
    targets: &BTreeMap<String, VariableDefinition>,
) -> Option<Match> {
    targets
        .iter()
        .filter(|(_, t)| type_score(source.type_tag, t.type_tag) > 0.0)
        .find(|(name, _)| patterns::patterns_for(source.type_tag).any(|p| p.relates_to(name)))
        .map(|(name, target)| Match {
            target: name.clone(),
            score: combined_score(source, name, target).unwrap_or_default(),
            kind: MatchKind::PatternFallback,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, type_tag: TypeTag, description: &str) -> VariableDefinition {
        VariableDefinition::new(name, type_tag, description)
    }

    fn targets(vars: Vec<VariableDefinition>) -> BTreeMap<String, VariableDefinition> {
        vars.into_iter().map(|v| (v.name.clone(), v)).collect()
    }

    #[test]
    fn identical_types_score_one() {
        for t in TypeTag::ALL {
            assert!((type_score(t, t) - 1.0).abs() < f64::EPSILON, "{t}");
        }
    }

    #[test]
    fn list_and_bool_are_incompatible_both_ways() {
        assert!(type_score(TypeTag::List, TypeTag::Bool).abs() < f64::EPSILON);
        assert!(type_score(TypeTag::Bool, TypeTag::List).abs() < f64::EPSILON);
        assert!(type_score(TypeTag::Set, TypeTag::Bool).abs() < f64::EPSILON);
        assert!(type_score(TypeTag::Bool, TypeTag::Set).abs() < f64::EPSILON);
    }

    #[test]
    fn only_list_like_pairs_score_point_eight() {
        assert!((type_score(TypeTag::List, TypeTag::Set) - 0.8).abs() < f64::EPSILON);
        assert!((type_score(TypeTag::Set, TypeTag::List) - 0.8).abs() < f64::EPSILON);
        assert!((type_score(TypeTag::Map, TypeTag::Object) - 0.1).abs() < f64::EPSILON);
        assert!((type_score(TypeTag::Object, TypeTag::Map) - 0.1).abs() < f64::EPSILON);
        assert!((type_score(TypeTag::String, TypeTag::Number) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn keywords_keep_domain_terms_and_long_tokens() {
        let kw = extract_keywords("ID of the vpc");
        assert_eq!(kw, ["id", "vpc"].iter().map(|s| (*s).to_string()).collect());
        let kw = extract_keywords("List of private subnet IDs");
        assert!(kw.contains("list"));
        assert!(kw.contains("private"));
        assert!(kw.contains("ids"));
        assert!(!kw.contains("of"));
    }

    #[test]
    fn vpc_id_maps_exactly() {
        let mapper = VariableMapper::default();
        let source = var("vpc_id", TypeTag::String, "VPC identifier");
        let t = targets(vec![var("vpc_id", TypeTag::String, "ID of the vpc")]);
        let m = mapper.infer_match(&source, &t).expect("match");
        assert_eq!(m.target, "vpc_id");
        assert!(m.score >= 0.6);
        assert_eq!(m.kind, MatchKind::Exact);
    }

    #[test]
    fn scored_match_renames_to_related_input() {
        let mapper = VariableMapper::default();
        let source = var("private_subnets", TypeTag::List, "List of IDs of private subnets");
        let t = targets(vec![
            var("subnet_ids", TypeTag::List, "A list of private subnet IDs to launch in"),
            var("enable_monitoring", TypeTag::Bool, "Whether to enable detailed monitoring"),
            var("name", TypeTag::String, "Name of the instance"),
        ]);
        let m = mapper.infer_match(&source, &t).expect("match");
        assert_eq!(m.target, "subnet_ids");
        assert_eq!(m.kind, MatchKind::Scored);
        assert!(m.score > 0.6);
    }

    #[test]
    fn bool_candidates_are_never_chosen_for_lists() {
        let source = var("subnets", TypeTag::List, "enable flag list");
        let t = targets(vec![var("enabled", TypeTag::Bool, "enable flag list")]);
        assert!(find_best_match(&source, &t, 0.0).is_none());
    }

    #[test]
    fn ties_resolve_to_smallest_name() {
        let source = var("thing", TypeTag::String, "shared words here");
        let t = targets(vec![
            var("zeta", TypeTag::String, "shared words here"),
            var("alpha", TypeTag::String, "shared words here"),
        ]);
        let m = find_best_match(&source, &t, 0.5).expect("match");
        assert_eq!(m.target, "alpha");
    }

    #[test]
    fn pattern_fallback_when_below_threshold() {
        let mapper = VariableMapper::default();
        let source = var("network_list", TypeTag::List, "");
        let t = targets(vec![
            var("name", TypeTag::String, ""),
            var("subnet_ids", TypeTag::Set, ""),
        ]);
        assert!(find_best_match(&source, &t, mapper.threshold()).is_none());
        let m = mapper.infer_match(&source, &t).expect("match");
        assert_eq!(m.target, "subnet_ids");
        assert_eq!(m.kind, MatchKind::PatternFallback);
    }

    #[test]
    fn pattern_fallback_accepts_loosely_typed_candidates() {
        let mapper = VariableMapper::default();
        let source = var("size", TypeTag::String, "");
        let t = targets(vec![var("instance_type", TypeTag::Number, "")]);
        assert!(find_best_match(&source, &t, mapper.threshold()).is_none());
        let m = mapper.infer_match(&source, &t).expect("match");
        assert_eq!(m.target, "instance_type");
        assert_eq!(m.kind, MatchKind::PatternFallback);
    }

    #[test]
    fn pattern_fallback_skips_incompatible_candidates() {
        let mapper = VariableMapper::default();
        let source = var("subnets", TypeTag::List, "");
        let t = targets(vec![var("encrypted", TypeTag::Bool, "")]);
        assert!(mapper.infer_match(&source, &t).is_none());
    }

    #[test]
    fn no_match_without_evidence() {
        let mapper = VariableMapper::default();
        let source = var("endpoint", TypeTag::String, "Connection endpoint");
        let t = targets(vec![var("retention_days", TypeTag::Number, "Days to keep logs")]);
        assert!(mapper.infer_mapping(&source, &t).is_none());
    }

    #[test]
    fn description_score_is_clamped() {
        let source = var("a", TypeTag::List, "list of vpc subnet ids");
        let target = var("b", TypeTag::List, "list of vpc subnet ids");
        let score = description_score(&source, &target);
        assert!(score <= 1.0);
        assert!(score > 0.99);
    }
}
