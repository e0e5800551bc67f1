use std::fmt;

use msz_core::AssumptionSet;
use serde::{Deserialize, Serialize};

const COUNT_SUFFIXES: [&str; 5] = ["_count", "_vol", "_num", "_institutions", "_number"];
const RATE_HINTS: [&str; 4] = ["adopt", "rate", "pene", "penetration"];
const PRICE_HINTS: [&str; 5] = ["price", "cost", "arpu", "spend", "revenue"];

/// Decomposition structure recognised from assumption keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// Per-segment count × rate × price, summed.
    InstitutionSegmented,
    /// population → core share → penetration → frequency → price.
    PopulationChain,
    /// existing market × substitution rate × optional premium.
    Substitution,
    /// end market × value share.
    ValueChain,
    /// targets × optional frequency × problem cost × willingness to pay.
    ValueBased,
}

impl Pattern {
    /// Stable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Pattern::InstitutionSegmented => "institution-segmented",
            Pattern::PopulationChain => "population-chain",
            Pattern::Substitution => "substitution",
            Pattern::ValueChain => "value-chain",
            Pattern::ValueBased => "value-based",
        }
    }

    /// First pattern whose key requirements `assumptions` satisfies.
    pub fn detect(assumptions: &AssumptionSet) -> Option<Pattern> {
        resolve(assumptions).map(|blueprint| blueprint.pattern())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Keys making up one segment of the segmented pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) prefix: String,
    pub(crate) label: String,
    pub(crate) count_key: String,
    pub(crate) rate_key: String,
    pub(crate) price_key: String,
}

/// One multiplicative stage of a chain pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stage {
    pub(crate) key: &'static str,
    pub(crate) id: &'static str,
    pub(crate) label: &'static str,
}

/// Typed build plan produced by a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Blueprint {
    Segmented(Vec<Segment>),
    Chain { pattern: Pattern, stages: Vec<Stage> },
}

impl Blueprint {
    pub(crate) fn pattern(&self) -> Pattern {
        match self {
            Blueprint::Segmented(_) => Pattern::InstitutionSegmented,
            Blueprint::Chain { pattern, .. } => *pattern,
        }
    }
}

type Matcher = fn(&AssumptionSet) -> Option<Blueprint>;

/// Tried in order; the first hit wins and patterns are never combined.
const MATCHERS: [Matcher; 5] = [
    match_segmented,
    match_population,
    match_substitution,
    match_value_chain,
    match_value_based,
];

pub(crate) fn resolve(assumptions: &AssumptionSet) -> Option<Blueprint> {
    MATCHERS.iter().find_map(|matcher| matcher(assumptions))
}

fn match_segmented(assumptions: &AssumptionSet) -> Option<Blueprint> {
    let mut segments: Vec<Segment> = Vec::new();
    for key in assumptions.keys() {
        let Some(prefix) = COUNT_SUFFIXES
            .iter()
            .find_map(|suffix| key.strip_suffix(*suffix))
        else {
            continue;
        };
        if prefix.is_empty() || segments.iter().any(|segment| segment.prefix == prefix) {
            continue;
        }
        if let Some(segment) = segment_for(assumptions, prefix, key) {
            segments.push(segment);
        }
    }
    (!segments.is_empty()).then_some(Blueprint::Segmented(segments))
}

fn segment_for(assumptions: &AssumptionSet, prefix: &str, count_key: &str) -> Option<Segment> {
    let head = format!("{prefix}_");
    let mut rate_key = None;
    let mut price_key = None;
    for sibling in assumptions.keys() {
        if sibling == count_key {
            continue;
        }
        let Some(suffix) = sibling.strip_prefix(head.as_str()) else {
            continue;
        };
        if rate_key.is_none() && RATE_HINTS.iter().any(|hint| suffix.contains(*hint)) {
            rate_key = Some(sibling);
        } else if price_key.is_none() && PRICE_HINTS.iter().any(|hint| suffix.contains(*hint)) {
            price_key = Some(sibling);
        }
    }
    let label = assumptions
        .get(count_key)
        .and_then(|assumption| assumption.used_in.split_whitespace().last())
        .map(str::to_string)
        .unwrap_or_else(|| prefix.to_uppercase());
    Some(Segment {
        prefix: prefix.to_string(),
        label,
        count_key: count_key.to_string(),
        rate_key: rate_key?.to_string(),
        price_key: price_key?.to_string(),
    })
}

/// Keeps required stages and whichever optional stages are present.
fn chain(
    assumptions: &AssumptionSet,
    pattern: Pattern,
    stages: &[(Stage, bool)],
) -> Option<Blueprint> {
    let required = stages
        .iter()
        .filter(|(_, optional)| !optional)
        .all(|(stage, _)| assumptions.contains_key(stage.key));
    if !required {
        return None;
    }
    let stages = stages
        .iter()
        .filter(|(stage, _)| assumptions.contains_key(stage.key))
        .map(|(stage, _)| *stage)
        .collect();
    Some(Blueprint::Chain { pattern, stages })
}

const fn stage(key: &'static str, id: &'static str, label: &'static str) -> Stage {
    Stage { key, id, label }
}

fn match_population(assumptions: &AssumptionSet) -> Option<Blueprint> {
    chain(
        assumptions,
        Pattern::PopulationChain,
        &[
            (stage("base_pop", "population", "Base population"), false),
            (stage("core_pop_pct", "core_population", "Core population"), true),
            (stage("pene_rate", "consumers", "Paying users"), false),
            (stage("freq", "consumption", "Total purchases"), true),
            (stage("price", "market_size", "Market size"), false),
        ],
    )
}

fn match_substitution(assumptions: &AssumptionSet) -> Option<Blueprint> {
    chain(
        assumptions,
        Pattern::Substitution,
        &[
            (stage("existing_market", "existing_market", "Existing market"), false),
            (stage("substitution_rate", "substituted", "Substituted share"), false),
            (stage("price_premium", "price_adjusted", "Price adjusted"), true),
        ],
    )
}

fn match_value_chain(assumptions: &AssumptionSet) -> Option<Blueprint> {
    chain(
        assumptions,
        Pattern::ValueChain,
        &[
            (stage("end_market", "end_market", "End market"), false),
            (stage("value_share", "captured_value", "Captured value"), false),
        ],
    )
}

fn match_value_based(assumptions: &AssumptionSet) -> Option<Blueprint> {
    chain(
        assumptions,
        Pattern::ValueBased,
        &[
            (stage("target_count", "targets", "Target customers"), false),
            (stage("prob_freq", "occurrences", "Problem occurrences"), true),
            (stage("prob_cost", "problem_value", "Problem value"), false),
            (stage("wtp_ratio", "willingness_to_pay", "Willingness to pay"), false),
        ],
    )
}
