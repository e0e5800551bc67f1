#![deny(missing_docs)]
#![doc = "Fermi decomposition calculator: chained assumptions in, traceable point estimate out."]

//! Five fixed decomposition methods plus a custom one. All are pure; a bad
//! input fails the call before any value is computed.

/// Decomposition methods.
pub mod estimator;
/// Tagged method inputs and YAML loading.
pub mod inputs;
/// Parameter structs for each method.
pub mod params;
/// Result record and its flat-map round trip.
pub mod result;

pub use estimator::{
    custom, institution_based, population_based, substitution_based, value_based,
    value_chain_based,
};
pub use inputs::{estimate, inputs_from_yaml_str, load_inputs, FermiInputs};
pub use params::{
    CustomParams, InstitutionParams, PopulationFilter, PopulationParams, SubstitutionParams,
    ValueChainParams, ValueParams,
};
pub use result::{AssumptionRecord, FermiResult, Method, Step};
