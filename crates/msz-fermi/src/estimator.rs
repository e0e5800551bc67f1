//! The decomposition methods. Each validates every input before computing and
//! returns a fully built [`FermiResult`]; nothing is retried.

use std::collections::BTreeMap;

use msz_core::{require_positive, require_unit_rate, Bindings, MszError};

use crate::params::{
    CustomParams, InstitutionParams, PopulationParams, SubstitutionParams, ValueChainParams,
    ValueParams,
};
use crate::result::{AssumptionRecord, FermiResult, Method, Step};

fn source_for(sources: &BTreeMap<String, String>, name: &str, fallback: &str) -> String {
    sources
        .get(name)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// `base_population × Π filters × penetration_rate × average_spend × frequency`.
pub fn population_based(params: &PopulationParams) -> Result<FermiResult, MszError> {
    require_positive("base_population", params.base_population)?;
    require_unit_rate("penetration_rate", params.penetration_rate)?;
    require_positive("average_spend", params.average_spend)?;
    require_positive("frequency", params.frequency)?;
    for filter in &params.filters {
        require_unit_rate(&format!("filter '{}'", filter.name), filter.rate)?;
    }

    let sources = &params.sources;
    let mut steps = Vec::with_capacity(params.filters.len() + 3);
    let mut assumptions = Vec::with_capacity(params.filters.len() + 4);

    let mut current = params.base_population;
    steps.push(Step::new("base population", current, "base"));
    assumptions.push(AssumptionRecord::new(
        "base_population",
        params.base_population,
        source_for(sources, "base_population", "census / estimate"),
    ));

    for filter in &params.filters {
        current *= filter.rate;
        steps.push(Step::new(
            format!("filter: {} ({})", filter.name, percent(filter.rate)),
            current,
            "remaining population",
        ));
        assumptions.push(AssumptionRecord::new(
            filter.name.clone(),
            filter.rate,
            source_for(sources, &filter.name, "estimate"),
        ));
    }

    let target_users = current * params.penetration_rate;
    steps.push(Step::new(
        format!("penetration ({})", percent(params.penetration_rate)),
        target_users,
        "target users",
    ));
    assumptions.push(AssumptionRecord::new(
        "penetration_rate",
        params.penetration_rate,
        source_for(sources, "penetration_rate", "estimate"),
    ));

    let total = target_users * params.average_spend * params.frequency;
    steps.push(Step::new(
        format!(
            "annual spend ({} {} x {} per year)",
            params.average_spend, params.unit, params.frequency
        ),
        total,
        "annual market size",
    ));
    assumptions.push(AssumptionRecord::new(
        "average_spend",
        params.average_spend,
        source_for(sources, "average_spend", "market research"),
    ));
    assumptions.push(AssumptionRecord::new(
        "frequency",
        params.frequency,
        source_for(sources, "frequency", "estimate"),
    ));

    let mut factors = vec!["base_population".to_string()];
    factors.extend(
        params
            .filters
            .iter()
            .map(|filter| format!("{}({})", filter.name, filter.rate)),
    );
    factors.extend(["penetration_rate", "average_spend", "frequency"].map(String::from));

    Ok(FermiResult::new(
        &params.unit,
        steps,
        factors.join(" × "),
        Method::PopulationBased,
        assumptions,
    ))
}

/// `institution_count × adoption_rate × units_per_institution × price_per_unit`.
pub fn institution_based(params: &InstitutionParams) -> Result<FermiResult, MszError> {
    require_positive("institution_count", params.institution_count)?;
    require_unit_rate("adoption_rate", params.adoption_rate)?;
    require_positive("units_per_institution", params.units_per_institution)?;
    require_positive("price_per_unit", params.price_per_unit)?;

    let sources = &params.sources;
    let adopters = params.institution_count * params.adoption_rate;
    let units = adopters * params.units_per_institution;
    let total = units * params.price_per_unit;

    let steps = vec![
        Step::new("target institutions", params.institution_count, "base"),
        Step::new(
            format!("adoption ({})", percent(params.adoption_rate)),
            adopters,
            "adopting institutions",
        ),
        Step::new(
            format!("units per institution ({})", params.units_per_institution),
            units,
            "total units",
        ),
        Step::new(
            format!("price per unit ({} {})", params.price_per_unit, params.unit),
            total,
            "market size",
        ),
    ];
    let assumptions = vec![
        AssumptionRecord::new(
            "institution_count",
            params.institution_count,
            source_for(sources, "institution_count", "business registry"),
        ),
        AssumptionRecord::new(
            "adoption_rate",
            params.adoption_rate,
            source_for(sources, "adoption_rate", "industry report"),
        ),
        AssumptionRecord::new(
            "units_per_institution",
            params.units_per_institution,
            source_for(sources, "units_per_institution", "estimate"),
        ),
        AssumptionRecord::new(
            "price_per_unit",
            params.price_per_unit,
            source_for(sources, "price_per_unit", "market research"),
        ),
    ];

    Ok(FermiResult::new(
        &params.unit,
        steps,
        "institution_count × adoption_rate × units_per_institution × price_per_unit".into(),
        Method::InstitutionBased,
        assumptions,
    ))
}

/// `existing_market_size × substitution_rate [× price_premium]`.
///
/// The premium step is only recorded when the premium differs from 1.
pub fn substitution_based(params: &SubstitutionParams) -> Result<FermiResult, MszError> {
    require_positive("existing_market_size", params.existing_market_size)?;
    require_unit_rate("substitution_rate", params.substitution_rate)?;
    require_positive("price_premium", params.price_premium)?;

    let sources = &params.sources;
    let substituted = params.existing_market_size * params.substitution_rate;
    let mut steps = vec![
        Step::new("existing market size", params.existing_market_size, "base"),
        Step::new(
            format!("substitution ({})", percent(params.substitution_rate)),
            substituted,
            "substitutable market",
        ),
    ];
    let mut assumptions = vec![
        AssumptionRecord::new(
            "existing_market_size",
            params.existing_market_size,
            source_for(sources, "existing_market_size", "industry report"),
        ),
        AssumptionRecord::new(
            "substitution_rate",
            params.substitution_rate,
            source_for(sources, "substitution_rate", "technical analysis"),
        ),
    ];
    let mut formula = String::from("existing_market_size × substitution_rate");

    if params.price_premium != 1.0 {
        steps.push(Step::new(
            format!("price premium ({}x)", params.price_premium),
            substituted * params.price_premium,
            "market size",
        ));
        assumptions.push(AssumptionRecord::new(
            "price_premium",
            params.price_premium,
            source_for(sources, "price_premium", "pricing strategy"),
        ));
        formula.push_str(&format!(" × price_premium({})", params.price_premium));
    }

    Ok(FermiResult::new(
        &params.unit,
        steps,
        formula,
        Method::SubstitutionBased,
        assumptions,
    ))
}

/// `end_market_size × value_share`.
pub fn value_chain_based(params: &ValueChainParams) -> Result<FermiResult, MszError> {
    require_positive("end_market_size", params.end_market_size)?;
    require_unit_rate("value_share", params.value_share)?;

    let sources = &params.sources;
    let steps = vec![
        Step::new("end market size", params.end_market_size, "downstream market"),
        Step::new(
            format!("value share ({})", percent(params.value_share)),
            params.end_market_size * params.value_share,
            "value-chain link market",
        ),
    ];
    let assumptions = vec![
        AssumptionRecord::new(
            "end_market_size",
            params.end_market_size,
            source_for(sources, "end_market_size", "industry report"),
        ),
        AssumptionRecord::new(
            "value_share",
            params.value_share,
            source_for(sources, "value_share", "industry analysis"),
        ),
    ];

    Ok(FermiResult::new(
        &params.unit,
        steps,
        "end_market_size × value_share".into(),
        Method::ValueChainBased,
        assumptions,
    ))
}

/// `target_count × problem_frequency × problem_cost × willingness_to_pay_ratio`.
pub fn value_based(params: &ValueParams) -> Result<FermiResult, MszError> {
    require_positive("target_count", params.target_count)?;
    require_positive("problem_frequency", params.problem_frequency)?;
    require_positive("problem_cost", params.problem_cost)?;
    require_unit_rate("willingness_to_pay_ratio", params.willingness_to_pay_ratio)?;

    let sources = &params.sources;
    let problem_value = params.target_count * params.problem_frequency * params.problem_cost;
    let total = problem_value * params.willingness_to_pay_ratio;
    let steps = vec![
        Step::new("target customers", params.target_count, "base"),
        Step::new(
            format!(
                "problem cost (frequency {} x cost {})",
                params.problem_frequency, params.problem_cost
            ),
            problem_value,
            "addressable problem value",
        ),
        Step::new(
            format!(
                "willingness to pay ({})",
                percent(params.willingness_to_pay_ratio)
            ),
            total,
            "market size",
        ),
    ];
    let assumptions = vec![
        AssumptionRecord::new(
            "target_count",
            params.target_count,
            source_for(sources, "target_count", "market research"),
        ),
        AssumptionRecord::new(
            "problem_frequency",
            params.problem_frequency,
            source_for(sources, "problem_frequency", "customer research"),
        ),
        AssumptionRecord::new(
            "problem_cost",
            params.problem_cost,
            source_for(sources, "problem_cost", "financial data"),
        ),
        AssumptionRecord::new(
            "willingness_to_pay_ratio",
            params.willingness_to_pay_ratio,
            source_for(sources, "willingness_to_pay_ratio", "pricing research"),
        ),
    ];

    Ok(FermiResult::new(
        &params.unit,
        steps,
        "target_count × problem_frequency × problem_cost × willingness_to_pay_ratio".into(),
        Method::ValueBased,
        assumptions,
    ))
}

/// Records each input as a step, then appends the formula output.
///
/// Only input presence is checked: a formula asking for an unbound name fails
/// with [`MszError::Formula`]. Output correctness is the caller's concern.
pub fn custom<F>(params: &CustomParams, formula: F) -> Result<FermiResult, MszError>
where
    F: Fn(&Bindings<'_>) -> Result<f64, MszError>,
{
    let names: Vec<String> = params.inputs.keys().cloned().collect();
    let values: Vec<f64> = params.inputs.values().copied().collect();
    let output = formula(&Bindings::new(&names, &values)?)?;

    let mut steps = Vec::with_capacity(names.len() + 1);
    let mut assumptions = Vec::with_capacity(names.len());
    for (name, value) in names.iter().zip(values.iter().copied()) {
        steps.push(Step::new(name.clone(), value, "input"));
        assumptions.push(AssumptionRecord::new(
            name.clone(),
            value,
            source_for(&params.sources, name, "user input"),
        ));
    }
    steps.push(Step::new("result", output, "output"));

    Ok(FermiResult::new(
        &params.unit,
        steps,
        params.method_name.clone(),
        Method::Custom(params.method_name.clone()),
        assumptions,
    ))
}
