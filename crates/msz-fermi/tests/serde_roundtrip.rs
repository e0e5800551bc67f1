use std::collections::BTreeMap;

use msz_core::MszError;
use msz_fermi::{
    estimate, inputs_from_yaml_str, load_inputs, population_based, FermiInputs, FermiResult,
    Method, PopulationFilter, PopulationParams,
};
use proptest::prelude::*;
use serde_json::Value;

fn sample_result(base: f64, rate: f64, spend: f64) -> FermiResult {
    population_based(&PopulationParams {
        base_population: base,
        filters: vec![PopulationFilter::new("urban", rate)],
        penetration_rate: 0.3,
        average_spend: spend,
        frequency: 12.0,
        unit: "CNY".into(),
        sources: BTreeMap::new(),
    })
    .unwrap()
}

#[test]
fn flat_map_round_trip_preserves_steps() {
    let result = sample_result(1.4e9, 0.65, 33.3);
    let map = result.to_map().unwrap();
    assert!(map.contains_key("steps"));
    assert_eq!(map["method"], Value::from("population-based"));
    let rebuilt = FermiResult::from_map(map).unwrap();
    assert_eq!(rebuilt.value().to_bits(), result.value().to_bits());
    assert_eq!(rebuilt.steps(), result.steps());
    assert_eq!(rebuilt, result);
}

#[test]
fn inconsistent_maps_are_rejected() {
    let mut map = sample_result(1.0e6, 0.5, 10.0).to_map().unwrap();
    map.insert("value".into(), Value::from(1.0));
    let err = FermiResult::from_map(map).unwrap_err();
    assert!(matches!(err, MszError::Validation(info) if info.code == "inconsistent-result"));
}

#[test]
fn deserializing_an_inconsistent_result_fails() {
    let mut json = serde_json::to_value(sample_result(1.0e6, 0.5, 10.0)).unwrap();
    json["value"] = Value::from(1.0);
    let err = serde_json::from_value::<FermiResult>(json).unwrap_err();
    assert!(err.to_string().contains("inconsistent-result"), "{err}");

    let raw = r#"{"value":1.0,"unit":"CNY","formula":"x","method":"value-based",
        "steps":[{"description":"x","value":5.0,"basis":"b"}],"assumptions":[]}"#;
    assert!(serde_json::from_str::<FermiResult>(raw).is_err());

    let good = serde_json::to_string(&sample_result(1.0e6, 0.5, 10.0)).unwrap();
    let back: FermiResult = serde_json::from_str(&good).unwrap();
    assert!(back.is_consistent());
}

#[test]
fn yaml_inputs_dispatch_to_method() {
    let raw = r#"
method: institution-based
institution_count: 5000
adoption_rate: 0.85
units_per_institution: 1
price_per_unit: 1500000
"#;
    let inputs = inputs_from_yaml_str(raw).unwrap();
    assert_eq!(inputs.method(), Method::InstitutionBased);
    let result = estimate(&inputs).unwrap();
    assert_eq!(result.value(), 6_375_000_000.0);
    assert_eq!(result.unit(), "CNY");
}

#[test]
fn inputs_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.yaml");
    std::fs::write(
        &path,
        "method: value-chain-based\nend_market_size: 800\nvalue_share: 0.125\nunit: USD\n",
    )
    .unwrap();
    let inputs = load_inputs(&path).unwrap();
    assert!(matches!(inputs, FermiInputs::ValueChainBased(_)));
    let result = estimate(&inputs).unwrap();
    assert_eq!(result.value(), 100.0);
    assert_eq!(result.unit(), "USD");
}

#[test]
fn unknown_method_tag_is_a_serde_error() {
    let err = inputs_from_yaml_str("method: astrology\n").unwrap_err();
    assert!(matches!(err, MszError::Serde(_)));
}

proptest! {
    #[test]
    fn round_trip_holds_for_arbitrary_inputs(
        base in 1.0f64..1e10,
        rate in 0.001f64..1.0,
        spend in 0.01f64..1e4,
    ) {
        let result = sample_result(base, rate, spend);
        let rebuilt = FermiResult::from_map(result.to_map().unwrap()).unwrap();
        prop_assert_eq!(rebuilt.value().to_bits(), result.value().to_bits());
        prop_assert_eq!(rebuilt.steps(), result.steps());
    }
}
