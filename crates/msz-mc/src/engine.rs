use indexmap::IndexMap;
use msz_core::errors::{ErrorInfo, MszError};
use msz_core::{Bindings, RngHandle};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::{SeedPolicy, SimulationConfig, SimulationPlan};
use crate::ranged::RangedAssumption;
use crate::result::MonteCarloResult;
use crate::sensitivity::{self, SensitivityOutcome};

/// Monte Carlo engine owning one explicitly seeded generator.
///
/// Consecutive runs on the same engine continue the generator's stream; build
/// a fresh engine (or [`fork`](Self::fork)) to replay a seed.
#[derive(Debug, Clone)]
pub struct UncertaintyEngine {
    rng: RngHandle,
}

impl UncertaintyEngine {
    /// Creates an engine seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RngHandle::from_seed(seed),
        }
    }

    /// Creates an engine from the config's master seed.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.seed_policy.master_seed)
    }

    /// Seed the engine was created from.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Independent engine for `substream`, derived from this engine's seed.
    pub fn fork(&self, substream: u64) -> Self {
        Self {
            rng: self.rng.substream(substream),
        }
    }

    /// Draws `n` values from a single assumption.
    pub fn sample(&mut self, assumption: &RangedAssumption, n: usize) -> Result<Vec<f64>, MszError> {
        assumption.validate()?;
        Ok(self.draw(assumption, n))
    }

    fn draw(&mut self, assumption: &RangedAssumption, n: usize) -> Vec<f64> {
        let distribution = assumption.distribution;
        (0..n)
            .map(|_| {
                distribution.sample(
                    &mut self.rng,
                    assumption.min,
                    assumption.most_likely,
                    assumption.max,
                )
            })
            .collect()
    }

    /// Runs the simulation described by `plan`.
    pub fn run_plan<F>(&mut self, plan: &SimulationPlan, formula: F) -> Result<MonteCarloResult, MszError>
    where
        F: Fn(&Bindings<'_>) -> Result<f64, MszError> + Sync,
    {
        self.run(&plan.assumptions, formula, &plan.config)
    }

    /// Samples every assumption, evaluates `formula` per sample and reduces
    /// the outcomes to summary statistics and sensitivity.
    ///
    /// All assumptions are validated before the first draw. Samples are drawn
    /// assumption by assumption in map order, so the seed alone fixes the
    /// sample path; `config.parallel` only changes how the formula is applied.
    pub fn run<F>(
        &mut self,
        assumptions: &IndexMap<String, RangedAssumption>,
        formula: F,
        config: &SimulationConfig,
    ) -> Result<MonteCarloResult, MszError>
    where
        F: Fn(&Bindings<'_>) -> Result<f64, MszError> + Sync,
    {
        let n = config.n_simulations;
        if n == 0 {
            return Err(MszError::invalid_parameter(
                "n_simulations",
                n as f64,
                "be at least 1",
            ));
        }
        for (name, assumption) in assumptions {
            assumption
                .validate()
                .map_err(|err| err.with_context("assumption", name.clone()))?;
        }

        let names: Vec<String> = assumptions.keys().cloned().collect();
        let columns: Vec<Vec<f64>> = assumptions
            .values()
            .map(|assumption| self.draw(assumption, n))
            .collect();

        let evaluate = |idx: usize| -> Result<f64, MszError> {
            let row: Vec<f64> = columns.iter().map(|column| column[idx]).collect();
            let value = Bindings::new(&names, &row)
                .and_then(|bindings| formula(&bindings))
                .map_err(|err| err.with_context("sample", idx.to_string()))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(MszError::Formula(
                    ErrorInfo::new(
                        "non-finite-output",
                        format!("formula produced {value} at sample {idx}"),
                    )
                    .with_context("sample", idx.to_string()),
                ))
            }
        };
        // Outcomes are collected in index order before short-circuiting, so a
        // failing run reports the lowest failing sample in both modes.
        let samples: Vec<f64> = if config.parallel {
            (0..n)
                .into_par_iter()
                .map(evaluate)
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<Result<_, _>>()?
        } else {
            (0..n).map(evaluate).collect::<Result<_, _>>()?
        };

        let mut warnings = Vec::new();
        let mut ranking = IndexMap::new();
        if config.run_sensitivity {
            let ordered: Vec<&RangedAssumption> = assumptions.values().collect();
            match sensitivity::one_at_a_time(&names, &ordered, &formula)? {
                SensitivityOutcome::Ranked { impacts, skipped } => {
                    for info in &skipped {
                        warn!(detail = %info.message, "sensitivity entry dropped");
                    }
                    ranking = impacts;
                    warnings.extend(skipped);
                }
                SensitivityOutcome::UndefinedBaseline(baseline) => {
                    warn!(baseline, "sensitivity skipped: baseline outcome is zero or non-finite");
                    warnings.push(
                        ErrorInfo::new(
                            "undefined-sensitivity",
                            "baseline outcome is zero or non-finite; percent changes are undefined",
                        )
                        .with_context("baseline", baseline.to_string()),
                    );
                }
            }
        }

        let result = MonteCarloResult::from_parts(samples, ranking, &config.unit, warnings);
        debug!(
            seed = self.rng.seed(),
            n_simulations = n,
            assumptions = names.len(),
            mean = result.mean,
            p5 = result.p5,
            p95 = result.p95,
            "monte carlo run complete"
        );
        Ok(result)
    }
}

/// Triangular shorthand: seeds a fresh engine and runs `n` samples over
/// `(name, (min, mode, max))` ranges.
pub fn quick_run<F>(
    seed: u64,
    ranges: &[(&str, (f64, f64, f64))],
    formula: F,
    n: usize,
    unit: &str,
) -> Result<MonteCarloResult, MszError>
where
    F: Fn(&Bindings<'_>) -> Result<f64, MszError> + Sync,
{
    let mut assumptions = IndexMap::with_capacity(ranges.len());
    for (name, (min, mode, max)) in ranges {
        let assumption = RangedAssumption::triangular(*min, *mode, *max)
            .map_err(|err| err.with_context("assumption", *name))?;
        assumptions.insert((*name).to_string(), assumption);
    }
    let config = SimulationConfig {
        n_simulations: n,
        unit: unit.to_string(),
        seed_policy: SeedPolicy {
            master_seed: seed,
            label: None,
        },
        ..SimulationConfig::default()
    };
    UncertaintyEngine::from_config(&config).run(&assumptions, formula, &config)
}
