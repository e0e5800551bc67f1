#![deny(missing_docs)]
#![doc = "Monte Carlo uncertainty engine: ranged assumptions in, outcome distribution and sensitivity out."]

//! Every run owns an explicitly seeded generator. Samples are drawn
//! sequentially; only formula evaluation fans out across the rayon pool.

/// YAML configuration schema and defaults.
pub mod config;
/// Sampling laws and their tags.
pub mod distribution;
/// Seeded engine and `run`/`quick_run` entry points.
pub mod engine;
/// Ranged assumptions and their validation.
pub mod ranged;
/// Run result and its derived views.
pub mod result;
/// One-factor-at-a-time sensitivity.
pub mod sensitivity;
/// Summary statistics over finished samples.
pub mod stats;

pub use config::{
    config_from_yaml_str, load_plan, plan_from_yaml_str, SeedPolicy, SimulationConfig,
    SimulationPlan,
};
pub use distribution::Distribution;
pub use engine::{quick_run, UncertaintyEngine};
pub use ranged::RangedAssumption;
pub use result::MonteCarloResult;
pub use sensitivity::{one_at_a_time, SensitivityOutcome};
pub use stats::Summary;
