use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use msz_core::errors::{ErrorInfo, MszError};
use serde::{Deserialize, Serialize};

use crate::ranged::{RangedAssumption, RawRangedAssumption};

/// YAML-configurable parameters governing a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Samples drawn per assumption. The only cost knob; callers bound it.
    #[serde(default = "default_simulations")]
    pub n_simulations: usize,
    /// Unit attached to the outcome.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Whether to run the one-factor-at-a-time sweep.
    #[serde(default = "default_true")]
    pub run_sensitivity: bool,
    /// Evaluate the formula across samples on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Master seed policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_simulations() -> usize {
    10_000
}

fn default_unit() -> String {
    "CNY".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_simulations: default_simulations(),
            unit: default_unit(),
            run_sensitivity: true,
            parallel: true,
            seed_policy: SeedPolicy::default(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed for the run's generator.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded alongside the seed.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    42
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Configuration plus the named ranged assumptions to simulate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationPlan {
    /// Run configuration.
    pub config: SimulationConfig,
    /// Assumptions in formula-binding order.
    pub assumptions: IndexMap<String, RangedAssumption>,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    config: SimulationConfig,
    assumptions: IndexMap<String, RawRangedAssumption>,
}

fn yaml_error(code: &str, err: impl ToString) -> MszError {
    MszError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Parses a [`SimulationConfig`] from YAML.
pub fn config_from_yaml_str(raw: &str) -> Result<SimulationConfig, MszError> {
    serde_yaml::from_str(raw).map_err(|err| yaml_error("config_yaml", err))
}

/// Parses a [`SimulationPlan`] from YAML.
///
/// Each assumption is validated individually, so a bad range or an unknown
/// distribution tag reports which assumption it belongs to.
pub fn plan_from_yaml_str(raw: &str) -> Result<SimulationPlan, MszError> {
    let plan: RawPlan = serde_yaml::from_str(raw).map_err(|err| yaml_error("plan_yaml", err))?;
    let mut assumptions = IndexMap::with_capacity(plan.assumptions.len());
    for (name, raw_assumption) in plan.assumptions {
        let assumption = raw_assumption
            .into_assumption()
            .map_err(|err| err.with_context("assumption", name.clone()))?;
        assumptions.insert(name, assumption);
    }
    Ok(SimulationPlan {
        config: plan.config,
        assumptions,
    })
}

/// Loads a [`SimulationPlan`] from a YAML file.
pub fn load_plan(path: &Path) -> Result<SimulationPlan, MszError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        yaml_error("plan_read", err).with_context("path", path.display().to_string())
    })?;
    plan_from_yaml_str(&raw)
}
