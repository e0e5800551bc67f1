use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub(crate) fn default_unit() -> String {
    "CNY".to_string()
}

fn default_frequency() -> f64 {
    1.0
}

fn default_premium() -> f64 {
    1.0
}

fn default_custom_name() -> String {
    "custom".to_string()
}

/// Named narrowing applied to a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationFilter {
    /// Label of the segment that survives the filter.
    pub name: String,
    /// Share of the running population kept, in `(0, 1]`.
    pub rate: f64,
}

impl PopulationFilter {
    /// Creates a filter.
    pub fn new(name: impl Into<String>, rate: f64) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }
}

/// Inputs to the population-based method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationParams {
    /// Starting population.
    pub base_population: f64,
    /// Successive narrowing filters.
    #[serde(default)]
    pub filters: Vec<PopulationFilter>,
    /// Product penetration among the filtered population.
    pub penetration_rate: f64,
    /// Spend per purchase.
    pub average_spend: f64,
    /// Purchases per year.
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    /// Currency or unit of the result.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Source overrides keyed by assumption name.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

/// Inputs to the institution-based method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionParams {
    /// Number of target institutions.
    pub institution_count: f64,
    /// Share of institutions that adopt.
    pub adoption_rate: f64,
    /// Units bought per adopting institution.
    pub units_per_institution: f64,
    /// Price per unit.
    pub price_per_unit: f64,
    /// Currency or unit of the result.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Source overrides keyed by assumption name.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

/// Inputs to the substitution-based method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionParams {
    /// Size of the market being displaced.
    pub existing_market_size: f64,
    /// Share of that market substituted.
    pub substitution_rate: f64,
    /// Price multiplier relative to the incumbent (`> 1` premium, `< 1` discount).
    #[serde(default = "default_premium")]
    pub price_premium: f64,
    /// Currency or unit of the result.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Source overrides keyed by assumption name.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

/// Inputs to the value-chain-based method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChainParams {
    /// Size of the downstream end market.
    pub end_market_size: f64,
    /// Share of end-market value captured by this link.
    pub value_share: f64,
    /// Currency or unit of the result.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Source overrides keyed by assumption name.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

/// Inputs to the value-based method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueParams {
    /// Number of target customers.
    pub target_count: f64,
    /// Occurrences of the problem per customer per year.
    pub problem_frequency: f64,
    /// Cost of one occurrence.
    pub problem_cost: f64,
    /// Share of the problem cost customers would pay to remove it.
    pub willingness_to_pay_ratio: f64,
    /// Currency or unit of the result.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Source overrides keyed by assumption name.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

/// Inputs to a custom decomposition; the formula is supplied separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomParams {
    /// Label recorded as the method and formula.
    #[serde(default = "default_custom_name")]
    pub method_name: String,
    /// Named inputs in the order they are recorded.
    pub inputs: IndexMap<String, f64>,
    /// Currency or unit of the result.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Source overrides keyed by input name.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

impl CustomParams {
    /// Creates parameters with the default unit and no source overrides.
    pub fn new(method_name: impl Into<String>, inputs: IndexMap<String, f64>) -> Self {
        Self {
            method_name: method_name.into(),
            inputs,
            unit: default_unit(),
            sources: BTreeMap::new(),
        }
    }
}
