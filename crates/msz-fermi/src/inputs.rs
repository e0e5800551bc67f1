use std::fs;
use std::path::Path;

use msz_core::errors::{ErrorInfo, MszError};
use serde::{Deserialize, Serialize};

use crate::estimator;
use crate::params::{
    InstitutionParams, PopulationParams, SubstitutionParams, ValueChainParams, ValueParams,
};
use crate::result::{FermiResult, Method};

/// Inputs for one of the built-in methods, tagged by `method`.
///
/// ```yaml
/// method: institution-based
/// institution_count: 5000
/// adoption_rate: 0.85
/// units_per_institution: 1
/// price_per_unit: 1500000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum FermiInputs {
    /// See [`estimator::population_based`].
    PopulationBased(PopulationParams),
    /// See [`estimator::institution_based`].
    InstitutionBased(InstitutionParams),
    /// See [`estimator::substitution_based`].
    SubstitutionBased(SubstitutionParams),
    /// See [`estimator::value_chain_based`].
    ValueChainBased(ValueChainParams),
    /// See [`estimator::value_based`].
    ValueBased(ValueParams),
}

impl FermiInputs {
    /// Method these inputs select.
    pub fn method(&self) -> Method {
        match self {
            FermiInputs::PopulationBased(_) => Method::PopulationBased,
            FermiInputs::InstitutionBased(_) => Method::InstitutionBased,
            FermiInputs::SubstitutionBased(_) => Method::SubstitutionBased,
            FermiInputs::ValueChainBased(_) => Method::ValueChainBased,
            FermiInputs::ValueBased(_) => Method::ValueBased,
        }
    }
}

/// Runs the method selected by `inputs`.
pub fn estimate(inputs: &FermiInputs) -> Result<FermiResult, MszError> {
    let result = match inputs {
        FermiInputs::PopulationBased(params) => estimator::population_based(params),
        FermiInputs::InstitutionBased(params) => estimator::institution_based(params),
        FermiInputs::SubstitutionBased(params) => estimator::substitution_based(params),
        FermiInputs::ValueChainBased(params) => estimator::value_chain_based(params),
        FermiInputs::ValueBased(params) => estimator::value_based(params),
    }?;
    tracing::debug!(
        method = %result.method(),
        value = result.value(),
        steps = result.steps().len(),
        "fermi estimate computed"
    );
    Ok(result)
}

/// Parses tagged inputs from a YAML document.
pub fn inputs_from_yaml_str(raw: &str) -> Result<FermiInputs, MszError> {
    serde_yaml::from_str(raw)
        .map_err(|err| MszError::Serde(ErrorInfo::new("inputs_yaml", err.to_string())))
}

/// Loads tagged inputs from a YAML file.
pub fn load_inputs(path: &Path) -> Result<FermiInputs, MszError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        MszError::Serde(
            ErrorInfo::new("inputs_read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    inputs_from_yaml_str(&raw)
}
