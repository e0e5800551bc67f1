use std::fmt;

use msz_core::errors::{ErrorInfo, MszError};
use msz_core::{format_magnitude, from_flat_map, to_flat_map};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decomposition method that produced a [`FermiResult`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Population filtered down to paying users.
    PopulationBased,
    /// Institutions times adoption, usage and price.
    InstitutionBased,
    /// Share of an existing market captured by substitution.
    SubstitutionBased,
    /// Share of an end market captured by one value-chain link.
    ValueChainBased,
    /// Problem cost recovered through willingness to pay.
    ValueBased,
    /// Caller supplied aggregation, labelled by name.
    Custom(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::PopulationBased => f.write_str("population-based"),
            Method::InstitutionBased => f.write_str("institution-based"),
            Method::SubstitutionBased => f.write_str("substitution-based"),
            Method::ValueChainBased => f.write_str("value-chain-based"),
            Method::ValueBased => f.write_str("value-based"),
            Method::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// One recorded stage of a decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// What the stage does.
    pub description: String,
    /// Running value after the stage.
    pub value: f64,
    /// Basis or interpretation of the running value.
    pub basis: String,
}

impl Step {
    pub(crate) fn new(description: impl Into<String>, value: f64, basis: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            value,
            basis: basis.into(),
        }
    }
}

/// Assumption that fed into a decomposition, with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionRecord {
    /// Assumption name.
    pub name: String,
    /// Value used.
    pub value: f64,
    /// Where the value came from.
    pub source: String,
}

impl AssumptionRecord {
    pub(crate) fn new(name: impl Into<String>, value: f64, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            source: source.into(),
        }
    }
}

/// Traceable point estimate. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFermiResult")]
pub struct FermiResult {
    value: f64,
    unit: String,
    steps: Vec<Step>,
    formula: String,
    method: Method,
    assumptions: Vec<AssumptionRecord>,
}

/// Unchecked wire form; every deserialized result passes through it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFermiResult {
    value: f64,
    unit: String,
    steps: Vec<Step>,
    formula: String,
    method: Method,
    assumptions: Vec<AssumptionRecord>,
}

impl TryFrom<RawFermiResult> for FermiResult {
    type Error = MszError;

    fn try_from(raw: RawFermiResult) -> Result<Self, Self::Error> {
        let result = FermiResult {
            value: raw.value,
            unit: raw.unit,
            steps: raw.steps,
            formula: raw.formula,
            method: raw.method,
            assumptions: raw.assumptions,
        };
        if !result.is_consistent() {
            return Err(MszError::Validation(
                ErrorInfo::new(
                    "inconsistent-result",
                    "value does not match the final step of the decomposition",
                )
                .with_context("value", result.value.to_string())
                .with_context("steps", result.steps.len().to_string()),
            ));
        }
        Ok(result)
    }
}

impl FermiResult {
    pub(crate) fn new(
        unit: &str,
        steps: Vec<Step>,
        formula: String,
        method: Method,
        assumptions: Vec<AssumptionRecord>,
    ) -> Self {
        let value = steps.last().map(|step| step.value).unwrap_or(0.0);
        Self {
            value,
            unit: unit.to_string(),
            steps,
            formula,
            method,
            assumptions,
        }
    }

    /// Final estimate; equals the last step's value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Unit of [`Self::value`].
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Ordered computation steps.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Human readable formula.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Method that produced the estimate.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Assumptions with their sources, in the order they were applied.
    pub fn assumptions(&self) -> &[AssumptionRecord] {
        &self.assumptions
    }

    /// Whether `value` matches the final step.
    pub fn is_consistent(&self) -> bool {
        match self.steps.last() {
            Some(last) => last.value.to_bits() == self.value.to_bits(),
            None => false,
        }
    }

    /// Flattens the result into a JSON object map.
    pub fn to_map(&self) -> Result<Map<String, Value>, MszError> {
        to_flat_map(self)
    }

    /// Rebuilds a result from [`Self::to_map`] output, rejecting maps whose
    /// value disagrees with the final step.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, MszError> {
        let raw: RawFermiResult = from_flat_map(map)?;
        FermiResult::try_from(raw)
    }
}

impl fmt::Display for FermiResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Fermi estimate ==")?;
        writeln!(f, "method: {}", self.method)?;
        writeln!(f, "result: {} {}", format_magnitude(self.value), self.unit)?;
        writeln!(f)?;
        writeln!(f, "formula: {}", self.formula)?;
        writeln!(f)?;
        writeln!(f, "steps:")?;
        for (idx, step) in self.steps.iter().enumerate() {
            writeln!(
                f,
                "  {}. {}: {} ({})",
                idx + 1,
                step.description,
                format_magnitude(step.value),
                step.basis
            )?;
        }
        writeln!(f)?;
        write!(f, "key assumptions:")?;
        for record in &self.assumptions {
            write!(f, "\n  - {}: {} (source: {})", record.name, record.value, record.source)?;
        }
        Ok(())
    }
}
