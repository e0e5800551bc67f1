use indexmap::IndexMap;
use msz_core::{Bindings, MszError};
use msz_mc::{
    quick_run, Distribution, RangedAssumption, SimulationConfig, UncertaintyEngine,
};
use proptest::prelude::*;

fn product(b: &Bindings<'_>) -> Result<f64, MszError> {
    Ok(b.get("a")? * b.get("b")?)
}

fn config(n: usize) -> SimulationConfig {
    SimulationConfig {
        n_simulations: n,
        ..SimulationConfig::default()
    }
}

fn product_inputs() -> IndexMap<String, RangedAssumption> {
    let mut inputs = IndexMap::new();
    inputs.insert("a".to_string(), RangedAssumption::triangular(8.0, 10.0, 12.0).unwrap());
    inputs.insert("b".to_string(), RangedAssumption::triangular(40.0, 50.0, 60.0).unwrap());
    inputs
}

#[test]
fn triangular_samples_stay_in_range_and_hit_the_mean() {
    let assumption = RangedAssumption::triangular(100.0, 200.0, 400.0).unwrap();
    let samples = UncertaintyEngine::new(7).sample(&assumption, 20_000).unwrap();
    assert_eq!(samples.len(), 20_000);
    assert!(samples.iter().all(|x| (100.0..=400.0).contains(x)));
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let expected = (100.0 + 200.0 + 400.0) / 3.0;
    assert!((mean - expected).abs() / expected < 0.05, "mean {mean}");
}

#[test]
fn clipped_laws_respect_bounds() {
    let mut engine = UncertaintyEngine::new(11);
    for assumption in [
        RangedAssumption::normal(1.0, 2.0, 3.0).unwrap(),
        RangedAssumption::lognormal(0.5, 1.0, 4.0).unwrap(),
        RangedAssumption::uniform(-2.0, 2.0).unwrap(),
    ] {
        let samples = engine.sample(&assumption, 5_000).unwrap();
        assert!(samples
            .iter()
            .all(|x| *x >= assumption.min && *x <= assumption.max));
    }
}

fn spread(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[test]
fn clipped_normal_uses_a_quarter_range_sigma() {
    let assumption = RangedAssumption::normal(0.0, 50.0, 100.0).unwrap();
    let samples = UncertaintyEngine::new(31).sample(&assumption, 20_000).unwrap();
    let (mean, std) = spread(&samples);
    // σ = 25 clipped at ±2σ leaves a standard deviation near 24.
    assert!((mean - 50.0).abs() < 1.0, "mean {mean}");
    assert!((23.0..25.0).contains(&std), "std {std}");
    let at_min = samples.iter().filter(|x| **x == 0.0).count();
    let at_max = samples.iter().filter(|x| **x == 100.0).count();
    // About 2.3% of the mass sits beyond each bound.
    assert!((300..650).contains(&at_min), "at min {at_min}");
    assert!((300..650).contains(&at_max), "at max {at_max}");
}

#[test]
fn clipped_lognormal_uses_a_quarter_log_range_sigma() {
    let assumption = RangedAssumption::lognormal(1.0, 10.0, 100.0).unwrap();
    let samples = UncertaintyEngine::new(37).sample(&assumption, 20_000).unwrap();
    let logs: Vec<f64> = samples.iter().map(|x| x.ln()).collect();
    let (log_mean, log_std) = spread(&logs);
    let centre = 10f64.ln();
    let expected = 0.9594 * 100f64.ln() / 4.0;
    assert!((log_mean - centre).abs() < 0.05, "log mean {log_mean}");
    assert!((log_std - expected).abs() < 0.05, "log std {log_std}");
    let at_min = samples.iter().filter(|x| **x == 1.0).count();
    let at_max = samples.iter().filter(|x| **x == 100.0).count();
    assert!((300..650).contains(&at_min), "at min {at_min}");
    assert!((300..650).contains(&at_max), "at max {at_max}");
}

#[test]
fn product_sensitivity_prefers_the_high_side_on_ties() {
    let result = UncertaintyEngine::new(42)
        .run(&product_inputs(), product, &config(2_000))
        .unwrap();
    let a = result.sensitivity["a"];
    let b = result.sensitivity["b"];
    assert!((a - 20.0).abs() < 1e-9, "a impact {a}");
    assert!((b - 20.0).abs() < 1e-9, "b impact {b}");
    assert!(result.warnings.is_empty());
    assert_eq!(result.n_simulations, 2_000);
    assert_eq!(result.raw_samples.len(), 2_000);
    assert!(result.min >= 320.0 && result.max <= 720.0);
}

#[test]
fn zero_baseline_yields_empty_sensitivity_and_a_warning() {
    let mut inputs = IndexMap::new();
    inputs.insert("a".to_string(), RangedAssumption::triangular(5.0, 10.0, 15.0).unwrap());
    let result = UncertaintyEngine::new(3)
        .run(&inputs, |b: &Bindings<'_>| Ok(b.get("a")? - 10.0), &config(500))
        .unwrap();
    assert!(result.sensitivity.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, "undefined-sensitivity");
}

#[test]
fn blown_up_bound_drops_the_entry_with_a_warning() {
    let mut inputs = IndexMap::new();
    inputs.insert("market".to_string(), RangedAssumption::triangular(50.0, 100.0, 150.0).unwrap());
    inputs.insert("divisor".to_string(), RangedAssumption::triangular(0.0, 5.0, 10.0).unwrap());
    let result = UncertaintyEngine::new(13)
        .run(
            &inputs,
            |b: &Bindings<'_>| Ok(b.get("market")? / b.get("divisor")?),
            &config(1_000),
        )
        .unwrap();

    assert_eq!(result.sensitivity.keys().collect::<Vec<_>>(), ["market"]);
    assert!((result.sensitivity["market"] - 50.0).abs() < 1e-9);
    assert!(result.sensitivity.values().all(|impact| impact.is_finite()));
    assert_eq!(result.warnings.len(), 1);
    let warning = &result.warnings[0];
    assert_eq!(warning.code, "non-finite-sensitivity");
    assert_eq!(warning.context["assumption"], "divisor");
    assert_eq!(warning.context["bound"], "min");

    let map = result.to_map().unwrap();
    assert!(map["sensitivity"]["market"].is_number());
    assert!(map["sensitivity"].get("divisor").is_none());
}

#[test]
fn sensitivity_can_be_disabled() {
    let cfg = SimulationConfig {
        run_sensitivity: false,
        ..config(200)
    };
    let result = UncertaintyEngine::new(5).run(&product_inputs(), product, &cfg).unwrap();
    assert!(result.sensitivity.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn same_seed_reproduces_samples() {
    let first = UncertaintyEngine::new(99)
        .run(&product_inputs(), product, &config(1_000))
        .unwrap();
    let second = UncertaintyEngine::new(99)
        .run(&product_inputs(), product, &config(1_000))
        .unwrap();
    assert_eq!(first.raw_samples, second.raw_samples);
    assert_eq!(first, second);

    let other = UncertaintyEngine::new(100)
        .run(&product_inputs(), product, &config(1_000))
        .unwrap();
    assert_ne!(first.raw_samples, other.raw_samples);
}

#[test]
fn parallel_and_sequential_evaluation_agree() {
    let sequential = SimulationConfig {
        parallel: false,
        ..config(3_000)
    };
    let par = UncertaintyEngine::new(8)
        .run(&product_inputs(), product, &config(3_000))
        .unwrap();
    let seq = UncertaintyEngine::new(8)
        .run(&product_inputs(), product, &sequential)
        .unwrap();
    assert_eq!(par.raw_samples, seq.raw_samples);
}

#[test]
fn forked_engines_are_stable_and_distinct() {
    let parent = UncertaintyEngine::new(1234);
    let assumption = RangedAssumption::uniform(0.0, 1.0).unwrap();
    let a = parent.fork(1).sample(&assumption, 16).unwrap();
    let b = parent.fork(1).sample(&assumption, 16).unwrap();
    let c = parent.fork(2).sample(&assumption, 16).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(parent.fork(1).seed(), parent.seed());
}

#[test]
fn zero_simulations_is_a_validation_error() {
    let err = UncertaintyEngine::new(1)
        .run(&product_inputs(), product, &config(0))
        .unwrap_err();
    match err {
        MszError::Validation(info) => {
            assert_eq!(info.context["parameter"], "n_simulations");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invalid_assumption_fails_before_any_draw() {
    let mut inputs = product_inputs();
    inputs.insert(
        "c".to_string(),
        RangedAssumption {
            min: 5.0,
            max: 1.0,
            most_likely: 3.0,
            distribution: Distribution::Triangular,
            unit: String::new(),
            source: String::new(),
        },
    );
    let mut engine = UncertaintyEngine::new(21);
    let err = engine.run(&inputs, product, &config(100)).unwrap_err();
    match err {
        MszError::Validation(info) => assert_eq!(info.context["assumption"], "c"),
        other => panic!("unexpected error: {other:?}"),
    }

    let after_failure = engine.run(&product_inputs(), product, &config(100)).unwrap();
    let fresh = UncertaintyEngine::new(21)
        .run(&product_inputs(), product, &config(100))
        .unwrap();
    assert_eq!(after_failure.raw_samples, fresh.raw_samples);
}

#[test]
fn lognormal_requires_positive_range() {
    let err = RangedAssumption::lognormal(0.0, 1.0, 2.0).unwrap_err();
    assert!(matches!(err, MszError::Validation(_)));
}

#[test]
fn non_finite_output_names_the_sample() {
    let cfg = SimulationConfig {
        parallel: false,
        ..config(10)
    };
    let err = UncertaintyEngine::new(2)
        .run(&product_inputs(), |_: &Bindings<'_>| Ok(f64::INFINITY), &cfg)
        .unwrap_err();
    match err {
        MszError::Formula(info) => {
            assert_eq!(info.code, "non-finite-output");
            assert_eq!(info.context["sample"], "0");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn failing_sample_is_the_same_in_parallel_and_sequential_mode() {
    let blows_up = |b: &Bindings<'_>| -> Result<f64, MszError> {
        let a = b.get("a")?;
        Ok(if a > 11.0 { f64::NAN } else { a * b.get("b")? })
    };
    let sequential = SimulationConfig {
        parallel: false,
        ..config(4_000)
    };
    let seq = UncertaintyEngine::new(4)
        .run(&product_inputs(), blows_up, &sequential)
        .unwrap_err();
    for _ in 0..4 {
        let par = UncertaintyEngine::new(4)
            .run(&product_inputs(), blows_up, &config(4_000))
            .unwrap_err();
        assert_eq!(par, seq);
    }
    assert_eq!(seq.info().code, "non-finite-output");
}

#[test]
fn unbound_formula_input_is_a_formula_error() {
    let err = UncertaintyEngine::new(2)
        .run(
            &product_inputs(),
            |b: &Bindings<'_>| b.get("missing"),
            &config(10),
        )
        .unwrap_err();
    assert!(matches!(err, MszError::Formula(info) if info.code == "missing-input"));
}

#[test]
fn quick_run_builds_triangular_inputs() {
    let result = quick_run(
        42,
        &[("a", (8.0, 10.0, 12.0)), ("b", (40.0, 50.0, 60.0))],
        product,
        1_000,
        "USD",
    )
    .unwrap();
    assert_eq!(result.unit, "USD");
    assert_eq!(result.n_simulations, 1_000);
    let replay = quick_run(
        42,
        &[("a", (8.0, 10.0, 12.0)), ("b", (40.0, 50.0, 60.0))],
        product,
        1_000,
        "USD",
    )
    .unwrap();
    assert_eq!(result.raw_samples, replay.raw_samples);

    let err = quick_run(42, &[("a", (3.0, 1.0, 2.0))], product, 10, "USD").unwrap_err();
    assert_eq!(err.info().context["assumption"], "a");
}

#[test]
fn derived_views_are_consistent() {
    let result = UncertaintyEngine::new(17)
        .run(&product_inputs(), product, &config(4_000))
        .unwrap();
    let (low, high) = result.confidence_interval(0.9);
    assert!((low - result.p5).abs() < 1e-6);
    assert!((high - result.p95).abs() < 1e-6);
    assert_eq!(result.percentile(50.0), result.median);
    assert_eq!(result.percentile(0.0), result.min);
    assert_eq!(result.percentile(100.0), result.max);

    let tornado = result.tornado();
    assert_eq!(tornado.len(), 2);
    assert!(tornado[0].1.abs() >= tornado[1].1.abs());

    let map = result.to_map().unwrap();
    assert!(!map.contains_key("raw_samples"));
    assert_eq!(map["n_simulations"], serde_json::Value::from(4_000u64));
    assert!(map["sensitivity"].get("a").is_some());
    assert_eq!(map["unit"], serde_json::Value::from("CNY"));
}

#[test]
fn flattened_map_keeps_input_order_of_sensitivity() {
    let mut inputs = IndexMap::new();
    inputs.insert("zeta".to_string(), RangedAssumption::triangular(1.0, 2.0, 3.0).unwrap());
    inputs.insert("alpha".to_string(), RangedAssumption::triangular(4.0, 5.0, 6.0).unwrap());
    let result = UncertaintyEngine::new(6)
        .run(
            &inputs,
            |b: &Bindings<'_>| Ok(b.get("zeta")? + b.get("alpha")?),
            &config(200),
        )
        .unwrap();
    let map = result.to_map().unwrap();
    assert_eq!(map.keys().next().map(String::as_str), Some("mean"));
    let order: Vec<&str> = map["sensitivity"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(order, ["zeta", "alpha"]);
}

#[test]
fn summary_text_shows_bands_and_tornado() {
    let result = UncertaintyEngine::new(17)
        .run(&product_inputs(), product, &config(1_000))
        .unwrap();
    let text = result.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "== Monte Carlo simulation ==");
    assert_eq!(lines[1], "simulations: 1000");
    assert!(text.contains("  90% CI: ["));
    assert!(text.contains("  50% CI: ["));
    assert!(text.contains("] CNY"));
    assert!(text.contains("sensitivity (tornado):"));
    let (top, impact) = &result.tornado()[0];
    let expected = format!("  {top}: {} ({impact:+.1}%)", "█".repeat(20));
    assert!(lines.contains(&expected.as_str()), "{text}");
    assert!(expected.ends_with("(+20.0%)"));

    let quiet = SimulationConfig {
        run_sensitivity: false,
        ..config(100)
    };
    let plain = UncertaintyEngine::new(17)
        .run(&product_inputs(), product, &quiet)
        .unwrap()
        .to_string();
    assert!(!plain.contains("tornado"));
    assert!(plain.lines().last().unwrap().starts_with("  range:  ["));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn percentiles_are_ordered(
        seed in any::<u64>(),
        n in 100usize..400,
        low in 0.1f64..50.0,
        spread in 0.0f64..100.0,
        peak in 0.0f64..1.0,
    ) {
        let high = low + spread;
        let mode = low + spread * peak;
        let mut inputs = IndexMap::new();
        inputs.insert("a".to_string(), RangedAssumption::triangular(low, mode, high).unwrap());
        inputs.insert("b".to_string(), RangedAssumption::lognormal(low, mode, high).unwrap());
        let result = UncertaintyEngine::new(seed)
            .run(&inputs, product, &config(n))
            .unwrap();
        prop_assert!(result.percentiles_ordered());
        prop_assert!(result.min <= result.p5);
        prop_assert!(result.p95 <= result.max);
    }
}
